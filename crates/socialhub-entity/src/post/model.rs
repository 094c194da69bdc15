//! Post entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::privacy::PrivacyType;

/// A user post.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    /// Unique post identifier.
    pub id: Uuid,
    /// Author.
    pub user_id: Uuid,
    /// Text body.
    pub content: Option<String>,
    /// Attached media URLs.
    pub medias: Option<Vec<String>>,
    /// Visibility.
    pub privacy: PrivacyType,
    /// When the post was created.
    pub created_at: DateTime<Utc>,
    /// When the post was last edited.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Whether `viewer` may see this post. `is_friend` tells whether the
    /// viewer is a friend of the author.
    pub fn is_visible_to(&self, viewer: Uuid, is_friend: bool) -> bool {
        if viewer == self.user_id {
            return true;
        }
        match self.privacy {
            PrivacyType::Public => true,
            PrivacyType::Friends => is_friend,
            PrivacyType::Private => false,
        }
    }
}
