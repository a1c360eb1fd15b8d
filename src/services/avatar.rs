//! Default avatar URLs.

use sha2::{Digest, Sha256};

/// Gravatar URL for `email` (SHA-256 of the trimmed, lower-cased address).
pub fn gravatar_url(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    format!("https://www.gravatar.com/avatar/{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravatar_normalizes_email() {
        assert_eq!(gravatar_url(" A@B.com "), gravatar_url("a@b.com"));
        assert!(gravatar_url("a@b.com").starts_with("https://www.gravatar.com/avatar/"));
        // 32-byte digest, hex encoded
        assert_eq!(
            gravatar_url("a@b.com").rsplit('/').next().unwrap().len(),
            64
        );
    }
}
