//! # socialhub-entity
//!
//! Domain entity models for SocialHub. Every struct in this crate is a
//! plain data structure representing a table row or a value object.
//! Row decoding derives `sqlx::FromRow`; table and column names live with
//! the SQL in `socialhub-database`.

pub mod notification;
pub mod post;
pub mod session;
