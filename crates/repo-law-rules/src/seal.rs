// crates/repo-law-rules/src/seal.rs
// ============================================================================
// Module: Secret Sealing
// Description: Anonymous sealed-box encryption for platform secrets.
// Purpose: Encrypt secret values to the public key published by the platform.
// Dependencies: crypto_box, base64, repo-law-core
// ============================================================================

//! ## Overview
//! Values are sealed with an X25519 + XSalsa20-Poly1305 sealed box, the
//! format the platform decrypts on its side. Keys arrive and ciphertext
//! leaves as standard base64.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use crypto_box::KEY_SIZE;
use crypto_box::PublicKey as BoxPublicKey;
use crypto_box::aead::OsRng;
use repo_law_core::PublicKey;
use repo_law_core::RuleError;
use repo_law_core::SealedSecret;

// ============================================================================
// SECTION: Sealing
// ============================================================================

/// Seals `value` for the holder of `key`.
///
/// # Errors
///
/// Returns [`RuleError::Seal`] when the key is not a base64 X25519 key or
/// encryption fails.
pub fn seal_secret(key: &PublicKey, value: &str) -> Result<SealedSecret, RuleError> {
    let raw = STANDARD
        .decode(key.key.trim())
        .map_err(|err| RuleError::Seal(format!("public key {} is not base64: {err}", key.key_id)))?;
    let bytes: [u8; KEY_SIZE] = raw.try_into().map_err(|raw: Vec<u8>| {
        RuleError::Seal(format!(
            "public key {} has {} bytes, expected {KEY_SIZE}",
            key.key_id,
            raw.len()
        ))
    })?;
    let sealed = BoxPublicKey::from(bytes)
        .seal(&mut OsRng, value.as_bytes())
        .map_err(|_| RuleError::Seal(format!("sealing with key {} failed", key.key_id)))?;
    Ok(SealedSecret {
        key_id: key.key_id.clone(),
        encrypted_value: STANDARD.encode(sealed),
    })
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use crypto_box::SecretKey;
    use crypto_box::aead::OsRng;
    use repo_law_core::PublicKey;
    use repo_law_core::RuleError;

    use super::seal_secret;

    #[test]
    fn sealed_value_opens_with_the_matching_secret_key() {
        let secret = SecretKey::generate(&mut OsRng);
        let key = PublicKey {
            key_id: "k-1".to_string(),
            key: STANDARD.encode(secret.public_key().as_bytes()),
        };

        let sealed = seal_secret(&key, "npm_abc123").unwrap();

        assert_eq!(sealed.key_id, "k-1");
        let ciphertext = STANDARD.decode(&sealed.encrypted_value).unwrap();
        let opened = secret.unseal(&ciphertext).unwrap();
        assert_eq!(opened, b"npm_abc123");
    }

    #[test]
    fn short_keys_are_rejected() {
        let key = PublicKey {
            key_id: "k-2".to_string(),
            key: STANDARD.encode([7u8; 16]),
        };
        let err = seal_secret(&key, "value").unwrap_err();
        assert!(matches!(err, RuleError::Seal(message) if message.contains("16 bytes")));
    }

    #[test]
    fn non_base64_keys_are_rejected() {
        let key = PublicKey {
            key_id: "k-3".to_string(),
            key: "not base64!".to_string(),
        };
        assert!(matches!(seal_secret(&key, "value"), Err(RuleError::Seal(_))));
    }
}
