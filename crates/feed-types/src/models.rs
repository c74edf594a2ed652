use serde::{Deserialize, Serialize};

/// The person a post is attributed to.
///
/// Only ever built from a [`VerifiedIdentityClaim`]; nothing the client sends
/// ends up in here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub avatar: String,
    pub name: String,
    /// Unique identity key, taken from the verified email claim.
    pub username: String,
}

impl From<VerifiedIdentityClaim> for Author {
    fn from(claim: VerifiedIdentityClaim) -> Self {
        Self {
            avatar: claim.picture,
            name: claim.name,
            username: claim.email,
        }
    }
}

/// A single feed entry. Immutable once appended to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub author: Author,
    pub content: String,
    pub followers: u64,
    pub followings: u64,
}

impl Post {
    /// New post with zeroed social counters.
    pub fn new(author: Author, content: impl Into<String>) -> Self {
        Self {
            author,
            content: content.into(),
            followers: 0,
            followings: 0,
        }
    }
}

/// Identity attributes asserted by the identity provider, trusted only after
/// the token carrying them has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentityClaim {
    pub name: String,
    pub email: String,
    pub picture: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_comes_from_claim() {
        let claim = VerifiedIdentityClaim {
            name: "A".into(),
            email: "a@x.com".into(),
            picture: "http://img".into(),
        };

        let author = Author::from(claim);
        assert_eq!(author.username, "a@x.com");
        assert_eq!(author.name, "A");
        assert_eq!(author.avatar, "http://img");
    }

    #[test]
    fn post_serializes_with_stable_field_names() {
        let author = Author {
            avatar: "http://img".into(),
            name: "A".into(),
            username: "a@x.com".into(),
        };
        let value = serde_json::to_value(Post::new(author, "hi")).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "author": { "avatar": "http://img", "name": "A", "username": "a@x.com" },
                "content": "hi",
                "followers": 0,
                "followings": 0,
            })
        );
    }
}
