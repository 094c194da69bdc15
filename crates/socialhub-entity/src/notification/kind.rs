//! Notification type enumeration.

use serde::{Deserialize, Serialize};

use socialhub_core::AppError;

/// What happened to produce a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Someone reacted to the recipient's post.
    PostReaction,
    /// Someone commented on the recipient's post.
    PostComment,
    /// Someone shared the recipient's post.
    PostShare,
    /// The recipient was mentioned.
    Mention,
    /// Incoming friend request.
    FriendRequest,
    /// A friend request sent by the recipient was accepted.
    FriendAccepted,
    /// Operator or system message.
    System,
}

impl NotificationType {
    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostReaction => "post_reaction",
            Self::PostComment => "post_comment",
            Self::PostShare => "post_share",
            Self::Mention => "mention",
            Self::FriendRequest => "friend_request",
            Self::FriendAccepted => "friend_accepted",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post_reaction" => Ok(Self::PostReaction),
            "post_comment" => Ok(Self::PostComment),
            "post_share" => Ok(Self::PostShare),
            "mention" => Ok(Self::Mention),
            "friend_request" => Ok(Self::FriendRequest),
            "friend_accepted" => Ok(Self::FriendAccepted),
            "system" => Ok(Self::System),
            _ => Err(AppError::validation(format!(
                "Invalid notification type: '{s}'"
            ))),
        }
    }
}
