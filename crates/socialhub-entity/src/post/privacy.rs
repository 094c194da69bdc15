//! Post privacy levels.

use serde::{Deserialize, Serialize};

use socialhub_core::AppError;

/// Who may see a post.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "privacy_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    /// Everyone.
    #[default]
    Public,
    /// The author's friends.
    Friends,
    /// Only the author.
    Private,
}

impl PrivacyType {
    /// Return the privacy level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Friends => "friends",
            Self::Private => "private",
        }
    }
}

impl std::fmt::Display for PrivacyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PrivacyType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "friends" => Ok(Self::Friends),
            "private" => Ok(Self::Private),
            _ => Err(AppError::validation(format!("Invalid privacy type: '{s}'"))),
        }
    }
}
