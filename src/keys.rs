//! RSA public key type used by both the key set builder and the validator.

use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, ObjectIdentifier};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};

use crate::error::KeySetError;
use crate::key_id::{KeyId, derive_key_id};

/// `rsaEncryption` algorithm identifier from PKCS #1.
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// An RSA public key used to verify RS256 signatures.
///
/// Wraps a parsed key so that every instance is known to be RSA. Keys are
/// loaded from PEM-armored or DER-encoded `SubjectPublicKeyInfo` structures.
///
/// # Example
///
/// ```no_run
/// use sa_token::PublicKey;
///
/// # fn example(pem_bytes: &[u8]) -> Result<(), sa_token::KeySetError> {
/// let key = PublicKey::from_pem(pem_bytes)?;
/// println!("kid = {}", key.key_id()?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parses the first PEM block found in `input` as a public key.
    ///
    /// Text before the block is ignored; the block label is not checked.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyInput` if no PEM block can be decoded
    /// - `UnparseableKey` if the block is not a `SubjectPublicKeyInfo`
    /// - `UnsupportedKeyType` if the key is not RSA
    pub fn from_pem(input: impl AsRef<[u8]>) -> Result<Self, KeySetError> {
        let block = pem::parse(input).map_err(|e| KeySetError::MalformedKeyInput {
            index: 0,
            reason: e.to_string(),
        })?;
        Self::from_der(block.contents())
    }

    /// Parses a DER-encoded `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// - `UnparseableKey` if the bytes are not a `SubjectPublicKeyInfo`
    /// - `UnsupportedKeyType` if the key is not RSA
    pub fn from_der(der: &[u8]) -> Result<Self, KeySetError> {
        let spki =
            SubjectPublicKeyInfoRef::try_from(der).map_err(|e| KeySetError::UnparseableKey {
                index: 0,
                reason: e.to_string(),
            })?;

        if spki.algorithm.oid != RSA_ENCRYPTION {
            return Err(KeySetError::UnsupportedKeyType {
                index: 0,
                algorithm: spki.algorithm.oid.to_string(),
            });
        }

        RsaPublicKey::from_public_key_der(der)
            .map(|inner| Self { inner })
            .map_err(|e| KeySetError::UnparseableKey {
                index: 0,
                reason: e.to_string(),
            })
    }

    /// Builds a key from its big-endian modulus and public exponent.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::InvalidDocument` if the components do not form
    /// a usable RSA key.
    pub fn from_components(modulus: &[u8], exponent: &[u8]) -> Result<Self, KeySetError> {
        RsaPublicKey::new(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(exponent),
        )
        .map(|inner| Self { inner })
        .map_err(|e| KeySetError::InvalidDocument {
            reason: format!("invalid RSA key components: {e}"),
        })
    }

    /// Re-serializes the key to its canonical `SubjectPublicKeyInfo` DER form.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::KeyIdDerivationFailed` if encoding fails.
    pub fn to_der(&self) -> Result<Vec<u8>, KeySetError> {
        self.inner
            .to_public_key_der()
            .map(|doc| doc.as_bytes().to_vec())
            .map_err(|e| KeySetError::KeyIdDerivationFailed {
                reason: format!("failed to serialize public key to DER format: {e}"),
            })
    }

    /// Returns the key ID derived from this key.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::KeyIdDerivationFailed` if the key cannot be
    /// re-encoded.
    pub fn key_id(&self) -> Result<KeyId, KeySetError> {
        derive_key_id(self)
    }

    /// Returns the big-endian modulus bytes without leading zeros.
    #[must_use]
    pub fn modulus(&self) -> Vec<u8> {
        self.inner.n().to_bytes_be()
    }

    /// Returns the big-endian public exponent bytes without leading zeros.
    #[must_use]
    pub fn exponent(&self) -> Vec<u8> {
        self.inner.e().to_bytes_be()
    }

    /// Returns the modulus size in bits.
    #[must_use]
    pub fn bits(&self) -> usize {
        self.inner.n().bits()
    }

    pub(crate) fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(inner: RsaPublicKey) -> Self {
        Self { inner }
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First modulus bytes are enough to tell keys apart in logs
        let n = self.modulus();
        write!(f, "PublicKey(RSA-{}, n=", self.bits())?;
        for byte in n.iter().take(4) {
            write!(f, "{byte:02x}")?;
        }
        write!(f, "...)")
    }
}
