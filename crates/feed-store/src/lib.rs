//! Durable, ordered, append-only collection of posts.
//!
//! The whole collection is the unit of read and write: callers either get
//! every post or an error, never a partial list.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use feed_types::models::Post;

/// Every variant means the collection could not be read or persisted.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage unavailable: corrupt collection: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Full current collection in append order.
    async fn read_all(&self) -> Result<Vec<Post>>;

    /// Add `post` at the tail and return the updated collection.
    ///
    /// Concurrent appends are serialized; on failure the previously persisted
    /// collection is still what `read_all` observes.
    async fn append(&self, post: Post) -> Result<Vec<Post>>;
}
