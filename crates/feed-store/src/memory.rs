use async_trait::async_trait;
use tokio::sync::RwLock;

use feed_types::models::Post;

use crate::{PostStore, Result};

/// In-process store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: RwLock::new(posts),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn read_all(&self) -> Result<Vec<Post>> {
        Ok(self.posts.read().await.clone())
    }

    async fn append(&self, post: Post) -> Result<Vec<Post>> {
        let mut posts = self.posts.write().await;
        posts.push(post);
        Ok(posts.clone())
    }
}
