//! # socialhub-core
//!
//! Core crate for SocialHub. Contains configuration schemas, the unified
//! error system, the clock abstraction used by every time-dependent
//! component, and pagination types.
//!
//! This crate has **no** internal dependencies on other SocialHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
