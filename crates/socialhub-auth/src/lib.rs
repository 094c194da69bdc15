//! # socialhub-auth
//!
//! Authentication for SocialHub.
//!
//! ## Modules
//!
//! - `jwt` - access token signing and verification
//! - `secret` - random refresh tokens and session secret keys
//! - `session` - device session lifecycle (login, reauth, logout) and cleanup

pub mod jwt;
pub mod secret;
pub mod session;

pub use jwt::{Claims, JwtDecoder, JwtEncoder, TokenPayload, TokenSigner};
pub use session::{AuthTokens, LoginMetadata, SessionCleanup, SessionManager, SessionStore};
