//! ============================================================================
//! Credential Generator - Random VIP username/password pairs
//! ============================================================================
//! username = "VIP" + 6 hex chars (3 random bytes)
//! password = 12 hex chars (6 random bytes)
//!
//! No uniqueness check against stored credentials; with 24 bits of username
//! entropy a collision is possible but rare.
//! ============================================================================

use rand::rngs::OsRng;
use rand::RngCore;

use crate::types::VipCredentials;

pub const USERNAME_PREFIX: &str = "VIP";
const USERNAME_RANDOM_BYTES: usize = 3;
const PASSWORD_RANDOM_BYTES: usize = 6;

/// Lowercase hex string of `N` bytes from the OS CSPRNG
fn random_hex<const N: usize>() -> String {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a fresh credential pair
pub fn generate_credentials() -> VipCredentials {
    VipCredentials {
        username: format!(
            "{}{}",
            USERNAME_PREFIX,
            random_hex::<USERNAME_RANDOM_BYTES>()
        ),
        password: random_hex::<PASSWORD_RANDOM_BYTES>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_lower_hex(s: &str) -> bool {
        s.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }

    #[test]
    fn test_username_shape() {
        for _ in 0..50 {
            let creds = generate_credentials();
            let suffix = creds.username.strip_prefix("VIP").expect("VIP prefix");
            assert_eq!(suffix.len(), 6);
            assert!(is_lower_hex(suffix), "bad username {}", creds.username);
        }
    }

    #[test]
    fn test_password_shape() {
        for _ in 0..50 {
            let creds = generate_credentials();
            assert_eq!(creds.password.len(), 12);
            assert!(is_lower_hex(&creds.password), "bad password {}", creds.password);
        }
    }

    #[test]
    fn test_consecutive_pairs_differ() {
        let a = generate_credentials();
        let b = generate_credentials();
        assert_ne!(a, b);
    }
}
