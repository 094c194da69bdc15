//! Post domain entities.

pub mod model;
pub mod privacy;

pub use model::Post;
pub use privacy::PrivacyType;
