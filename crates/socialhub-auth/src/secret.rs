//! Random secrets issued with every device session.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Alphabet of session secret keys.
const SECRET_KEY_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a session secret key of `len` characters from `A-Z0-9`.
pub fn generate_secret_key(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SECRET_KEY_CHARSET[rng.gen_range(0..SECRET_KEY_CHARSET.len())] as char)
        .collect()
}

/// Generates an opaque refresh token of `len` characters from `a-zA-Z0-9`.
pub fn generate_refresh_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_key_alphabet() {
        let key = generate_secret_key(16);
        assert_eq!(key.len(), 16);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_refresh_tokens_differ() {
        let a = generate_refresh_token(64);
        let b = generate_refresh_token(64);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
