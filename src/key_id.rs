//! Non-reversible key identifiers.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::KeySetError;
use crate::keys::PublicKey;

/// A key identifier derived from a public key.
///
/// The identifier is the unpadded base64url SHA-256 digest of the key's
/// canonical DER `SubjectPublicKeyInfo` encoding, so it is always 43
/// characters long and carries no key material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Wraps an identifier read from a key set document without re-deriving it.
    pub(crate) fn from_document(kid: String) -> Self {
        Self(kid)
    }

    /// Returns the key ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for KeyId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for KeyId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Derives the key ID for a public key.
///
/// The key is re-serialized before hashing, so two textually different
/// encodings of the same key (line wrapping, line endings, surrounding
/// text) always produce the same ID.
///
/// # Errors
///
/// Returns `KeySetError::KeyIdDerivationFailed` if the key cannot be
/// re-encoded to DER.
///
/// # Example
///
/// ```no_run
/// use sa_token::{PublicKey, derive_key_id};
///
/// # fn example(pem_bytes: &[u8]) -> Result<(), sa_token::KeySetError> {
/// let key = PublicKey::from_pem(pem_bytes)?;
/// let kid = derive_key_id(&key)?;
/// assert_eq!(kid.as_str().len(), 43);
/// # Ok(())
/// # }
/// ```
pub fn derive_key_id(key: &PublicKey) -> Result<KeyId, KeySetError> {
    let der = key.to_der()?;
    Ok(key_id_from_der(&der))
}

/// Hashes already-canonical DER bytes into a key ID.
pub(crate) fn key_id_from_der(der: &[u8]) -> KeyId {
    let digest = Sha256::digest(der);
    KeyId(URL_SAFE_NO_PAD.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_public_key, test_public_pem};

    #[test]
    fn key_id_is_43_url_safe_chars() {
        let kid = derive_key_id(&test_public_key(0)).unwrap();
        assert_eq!(kid.as_str().len(), 43);
        assert!(
            kid.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn key_id_is_stable() {
        let key = test_public_key(0);
        assert_eq!(derive_key_id(&key).unwrap(), derive_key_id(&key).unwrap());
    }

    #[test]
    fn key_id_ignores_pem_formatting() {
        let original = test_public_pem(1);
        let crlf = original.replace('\n', "\r\n");
        let with_preamble = format!("public key follows\n\n{original}");

        let expected = derive_key_id(&PublicKey::from_pem(&original).unwrap()).unwrap();
        for variant in [crlf, with_preamble] {
            let kid = derive_key_id(&PublicKey::from_pem(&variant).unwrap()).unwrap();
            assert_eq!(kid, expected);
        }
    }

    #[test]
    fn key_id_matches_hash_of_der() {
        let key = test_public_key(2);
        let der = key.to_der().unwrap();
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(&der));
        assert_eq!(derive_key_id(&key).unwrap(), expected.as_str());
    }

    #[test]
    fn distinct_keys_have_distinct_ids() {
        let ids: Vec<KeyId> = (0..4)
            .map(|i| derive_key_id(&test_public_key(i)).unwrap())
            .collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let kid = key_id_from_der(b"abc");
        let json = serde_json::to_string(&kid).unwrap();
        assert_eq!(json, format!("\"{kid}\""));
    }
}
