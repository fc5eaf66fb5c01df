//! Access key codec.
//!
//! Three independent derivations compose the key lifecycle: `generate` mints
//! an unguessable secret bound to an organization, `hash_key` derives the
//! one-way lookup digest that is persisted, and `thumbnail` derives the
//! non-secret display fragment. The secret itself is observable exactly once,
//! in the issuance response, and is wrapped in a zeroizing type.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix identifying billing keys in logs-safe form (the prefix alone
/// carries no secret material).
pub const KEY_PREFIX: &str = "bk.";

const THUMBNAIL_EDGE: usize = 7;

/// Key codec error types
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid organization id: {0}")]
    InvalidOrganizationId(i64),
    #[error("failed to sign access key: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// One-time secret value of an issued key. Zeroized on drop; never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySecret(String);

impl KeySecret {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for KeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeySecret([REDACTED])")
    }
}

#[derive(Serialize, Deserialize)]
struct KeyClaims {
    org_id: i64,
    jti: u64,
}

/// Mints access key secrets signed with a service-held HS256 secret.
///
/// The token is opaque to holders; the signature guarantees unguessability
/// and lets [`KeyCodec::verify`] recover the issuing organization from a
/// presented value without a store lookup.
pub struct KeyCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl KeyCodec {
    pub fn new(signing_secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(signing_secret),
            decoding_key: DecodingKey::from_secret(signing_secret),
        }
    }

    /// Generates a fresh secret for the given organization.
    ///
    /// The token id combines the current unix time with 32 random bits, so
    /// two calls never collide within the same second and the value is not
    /// predictable from the timestamp alone.
    pub fn generate(&self, organization_id: i64) -> Result<KeySecret, KeyError> {
        if organization_id <= 0 {
            return Err(KeyError::InvalidOrganizationId(organization_id));
        }

        let random_bits: u32 = rand::thread_rng().r#gen();
        let timestamp = chrono::Utc::now().timestamp() as u64;
        let jti = (timestamp << 32) | u64::from(random_bits);

        let claims = KeyClaims {
            org_id: organization_id,
            jti,
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?;

        Ok(KeySecret(format!("{KEY_PREFIX}{token}")))
    }

    /// Checks a presented value against the service signature and returns the
    /// organization it was minted for. Wrong-prefix, malformed, or
    /// foreign-signed values all yield `None`; callers treat every such value
    /// as an unknown key.
    pub fn verify(&self, presented: &str) -> Option<i64> {
        let token = presented.strip_prefix(KEY_PREFIX)?;

        // Keys carry no expiry claim; only the signature is checked.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<KeyClaims>(token, &self.decoding_key, &validation)
            .ok()
            .map(|data| data.claims.org_id)
    }
}

/// One-way digest of a secret, the only form stored or logged.
pub fn hash_key(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Display fragment of a secret: first and last few characters with the
/// middle elided. Short enough to be useless for brute-force narrowing.
pub fn thumbnail(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= THUMBNAIL_EDGE * 2 {
        return "...".to_string();
    }

    let head: String = chars[..THUMBNAIL_EDGE].iter().collect();
    let tail: String = chars[chars.len() - THUMBNAIL_EDGE..].iter().collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec() -> KeyCodec {
        KeyCodec::new(b"unit-test-signing-secret")
    }

    #[test]
    fn generated_secrets_are_unique_and_prefixed() {
        let codec = test_codec();
        let a = codec.generate(42).expect("generation succeeds");
        let b = codec.generate(42).expect("generation succeeds");

        assert!(a.as_str().starts_with(KEY_PREFIX));
        assert!(b.as_str().starts_with(KEY_PREFIX));
        assert_ne!(a.as_str(), b.as_str());
        assert!(a.as_str().len() > 64);
        assert!(a.as_str().is_ascii());
    }

    #[test]
    fn generate_rejects_invalid_organization() {
        let codec = test_codec();
        assert!(matches!(
            codec.generate(0),
            Err(KeyError::InvalidOrganizationId(0))
        ));
        assert!(matches!(
            codec.generate(-7),
            Err(KeyError::InvalidOrganizationId(-7))
        ));
    }

    #[test]
    fn verify_recovers_the_issuing_organization() {
        let codec = test_codec();
        let secret = codec.generate(42).expect("generation succeeds");

        assert_eq!(codec.verify(secret.as_str()), Some(42));
    }

    #[test]
    fn verify_rejects_foreign_and_malformed_values() {
        let codec = test_codec();
        let foreign = KeyCodec::new(b"some-other-signing-secret");
        let secret = codec.generate(42).expect("generation succeeds");

        assert_eq!(foreign.verify(secret.as_str()), None);
        assert_eq!(codec.verify("no-prefix-at-all"), None);
        assert_eq!(codec.verify(""), None);

        let mut tampered = secret.as_str().to_string();
        tampered.pop();
        assert_eq!(codec.verify(&tampered), None);
    }

    #[test]
    fn hash_is_deterministic_and_not_the_secret() {
        let codec = test_codec();
        let secret = codec.generate(42).expect("generation succeeds");

        let h1 = hash_key(secret.as_str());
        let h2 = hash_key(secret.as_str());

        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(!secret.as_str().contains(&h1));
        assert!(!h1.contains(secret.as_str()));
    }

    #[test]
    fn thumbnail_elides_the_middle() {
        let codec = test_codec();
        let secret = codec.generate(42).expect("generation succeeds");

        let thumb = thumbnail(secret.as_str());

        assert_ne!(thumb, secret.as_str());
        assert_eq!(thumb.len(), THUMBNAIL_EDGE * 2 + 3);
        assert!(secret.as_str().starts_with(&thumb[..THUMBNAIL_EDGE]));
        assert!(secret.as_str().ends_with(&thumb[THUMBNAIL_EDGE + 3..]));
    }

    #[test]
    fn thumbnail_of_short_input_reveals_nothing() {
        assert_eq!(thumbnail("short"), "...");
        assert_eq!(thumbnail(""), "...");
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let codec = test_codec();
        let secret = codec.generate(42).expect("generation succeeds");
        assert_eq!(format!("{secret:?}"), "KeySecret([REDACTED])");
    }
}
