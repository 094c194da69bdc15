//! Access token handling: claims, signing and verification.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod signer;

pub use claims::{Claims, TokenPayload};
pub use decoder::JwtDecoder;
pub use encoder::JwtEncoder;
pub use signer::TokenSigner;
