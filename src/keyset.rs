//! JSON Web Key Set construction and serialization.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{ALGORITHM_RS256, KEY_TYPE_RSA, KEY_USE_SIGNATURE, KEYSET_INDENT};
use crate::error::KeySetError;
use crate::key_id::{KeyId, derive_key_id};
use crate::keys::PublicKey;

/// A single signature key in a key set document.
///
/// The key ID is always derived from the key itself when built through
/// [`KeySetBuilder`]; callers cannot supply one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonWebKey {
    key: PublicKey,
    key_id: KeyId,
}

impl JsonWebKey {
    /// Creates a record for `key`, deriving its key ID.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::KeyIdDerivationFailed` if the key ID cannot be
    /// derived.
    pub fn new(key: PublicKey) -> Result<Self, KeySetError> {
        let key_id = derive_key_id(&key)?;
        Ok(Self { key, key_id })
    }

    /// Returns the public key.
    #[must_use]
    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// Returns the key ID.
    #[must_use]
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    /// Returns the signature algorithm, always `RS256`.
    #[must_use]
    pub const fn algorithm(&self) -> &'static str {
        ALGORITHM_RS256
    }

    /// Returns the key use, always `sig`.
    #[must_use]
    pub const fn key_use(&self) -> &'static str {
        KEY_USE_SIGNATURE
    }

    fn to_wire(&self) -> WireKey {
        WireKey {
            key_use: KEY_USE_SIGNATURE.to_string(),
            kty: KEY_TYPE_RSA.to_string(),
            kid: self.key_id.to_string(),
            alg: ALGORITHM_RS256.to_string(),
            n: URL_SAFE_NO_PAD.encode(self.key.modulus()),
            e: URL_SAFE_NO_PAD.encode(self.key.exponent()),
        }
    }

    fn from_wire(position: usize, wire: WireKey) -> Result<Self, KeySetError> {
        let invalid = |reason: String| KeySetError::InvalidDocument {
            reason: format!("key #{position}: {reason}"),
        };

        if wire.kty != KEY_TYPE_RSA {
            return Err(invalid(format!("unsupported key type '{}'", wire.kty)));
        }
        if wire.alg != ALGORITHM_RS256 {
            return Err(invalid(format!("unsupported algorithm '{}'", wire.alg)));
        }
        if wire.key_use != KEY_USE_SIGNATURE {
            return Err(invalid(format!("unsupported key use '{}'", wire.key_use)));
        }

        let n = URL_SAFE_NO_PAD
            .decode(&wire.n)
            .map_err(|e| invalid(format!("modulus is not base64url: {e}")))?;
        let e = URL_SAFE_NO_PAD
            .decode(&wire.e)
            .map_err(|e| invalid(format!("exponent is not base64url: {e}")))?;
        let key = PublicKey::from_components(&n, &e).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            key,
            key_id: KeyId::from_document(wire.kid),
        })
    }
}

impl Serialize for JsonWebKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}

/// Field layout of an RSA JSON Web Key on the wire.
#[derive(Serialize, Deserialize)]
struct WireKey {
    #[serde(rename = "use")]
    key_use: String,
    kty: String,
    kid: String,
    alg: String,
    n: String,
    e: String,
}

#[derive(Deserialize)]
struct WireKeySet {
    keys: Vec<WireKey>,
}

/// A key discovery document: an ordered list of signature keys.
///
/// Key order is input order. Duplicate keys are kept; consumers that need
/// unique key IDs must filter.
///
/// # Example
///
/// ```no_run
/// use sa_token::KeySetBuilder;
///
/// # fn example(pem_a: &[u8], pem_b: &[u8]) -> Result<(), sa_token::KeySetError> {
/// let key_set = KeySetBuilder::new().source(pem_a).source(pem_b).build()?;
/// let json = key_set.to_json_pretty()?;
/// std::fs::write("keys.json", json).unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JsonWebKeySet {
    keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Returns the keys in document order.
    #[must_use]
    pub fn keys(&self) -> &[JsonWebKey] {
        &self.keys
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the document has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the first key with the given key ID.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.key_id == *kid)
    }

    /// Encodes the document as JSON indented with four spaces.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::Serialization` if encoding fails.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, KeySetError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(KEYSET_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| KeySetError::Serialization {
                reason: e.to_string(),
            })?;
        Ok(out)
    }

    /// Reads a key set document back.
    ///
    /// Key IDs are taken from the document as-is.
    ///
    /// # Errors
    ///
    /// Returns `KeySetError::InvalidDocument` if the document is not valid
    /// JSON or contains a key other than an RS256 signature key.
    pub fn from_json(json: &[u8]) -> Result<Self, KeySetError> {
        let wire: WireKeySet =
            serde_json::from_slice(json).map_err(|e| KeySetError::InvalidDocument {
                reason: e.to_string(),
            })?;

        let keys = wire
            .keys
            .into_iter()
            .enumerate()
            .map(|(position, key)| JsonWebKey::from_wire(position, key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { keys })
    }
}

impl<'a> IntoIterator for &'a JsonWebKeySet {
    type Item = &'a JsonWebKey;
    type IntoIter = std::slice::Iter<'a, JsonWebKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Collects PEM-encoded public keys and builds a [`JsonWebKeySet`].
///
/// The build is all-or-nothing: the first failing input aborts it and no
/// document is returned.
#[derive(Debug, Clone, Default)]
pub struct KeySetBuilder {
    sources: Vec<Vec<u8>>,
}

impl KeySetBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one PEM-encoded public key.
    #[must_use]
    pub fn source(mut self, pem: impl AsRef<[u8]>) -> Self {
        self.sources.push(pem.as_ref().to_vec());
        self
    }

    /// Appends several PEM-encoded public keys in order.
    #[must_use]
    pub fn sources<I, B>(mut self, pems: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        self.sources
            .extend(pems.into_iter().map(|pem| pem.as_ref().to_vec()));
        self
    }

    /// Returns the number of inputs collected so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no inputs have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parses every input and builds the key set.
    ///
    /// # Errors
    ///
    /// Returns the first `KeySetError` encountered; its `index` names the
    /// offending input.
    pub fn build(&self) -> Result<JsonWebKeySet, KeySetError> {
        build_key_set(&self.sources)
    }
}

/// Builds a key set from PEM-encoded public keys, preserving input order.
///
/// # Errors
///
/// - `MalformedKeyInput` if an input has no PEM block
/// - `UnparseableKey` if a block is not a `SubjectPublicKeyInfo`
/// - `UnsupportedKeyType` if a key is not RSA
/// - `KeyIdDerivationFailed` if a key cannot be re-encoded
pub fn build_key_set<I, B>(sources: I) -> Result<JsonWebKeySet, KeySetError>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut keys = Vec::new();
    for (position, source) in sources.into_iter().enumerate() {
        let key = PublicKey::from_pem(source).map_err(|e| e.at_index(position))?;
        let record = JsonWebKey::new(key)?;
        debug!(index = position, kid = %record.key_id, "added public key to key set");
        keys.push(record);
    }
    Ok(JsonWebKeySet { keys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_public_key, test_public_pem};

    #[test]
    fn preserves_input_order() {
        let key_set = KeySetBuilder::new()
            .sources([test_public_pem(2), test_public_pem(0), test_public_pem(1)])
            .build()
            .unwrap();

        let kids: Vec<&KeyId> = key_set.keys().iter().map(JsonWebKey::key_id).collect();
        let expected: Vec<KeyId> = [2, 0, 1]
            .iter()
            .map(|&i| derive_key_id(&test_public_key(i)).unwrap())
            .collect();
        assert_eq!(kids, expected.iter().collect::<Vec<_>>());
    }

    #[test]
    fn keeps_duplicates() {
        let pem = test_public_pem(0);
        let key_set = build_key_set([&pem, &pem]).unwrap();
        assert_eq!(key_set.len(), 2);
        assert_eq!(key_set.keys()[0].key_id(), key_set.keys()[1].key_id());
    }

    #[test]
    fn failing_input_aborts_build() {
        let result = build_key_set([test_public_pem(0), "garbage".to_string()]);
        assert!(matches!(
            result,
            Err(KeySetError::MalformedKeyInput { index: 1, .. })
        ));
    }

    #[test]
    fn json_uses_four_space_indent_and_fixed_fields() {
        let key_set = build_key_set([test_public_pem(0)]).unwrap();
        let json = String::from_utf8(key_set.to_json_pretty().unwrap()).unwrap();

        assert!(json.starts_with("{\n    \"keys\": [\n        {\n"));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let key = &value["keys"][0];
        assert_eq!(key["kty"], "RSA");
        assert_eq!(key["use"], "sig");
        assert_eq!(key["alg"], "RS256");
        assert_eq!(key["e"], "AQAB");
        assert_eq!(key["kid"], key_set.keys()[0].key_id().as_str());
    }

    #[test]
    fn empty_key_set_serializes_empty_list() {
        let key_set = KeySetBuilder::new().build().unwrap();
        let json = String::from_utf8(key_set.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json, "{\n    \"keys\": []\n}");
    }

    #[test]
    fn document_reparses() {
        let key_set = build_key_set([test_public_pem(0), test_public_pem(1)]).unwrap();
        let json = key_set.to_json_pretty().unwrap();
        let reparsed = JsonWebKeySet::from_json(&json).unwrap();
        assert_eq!(reparsed, key_set);
    }

    #[test]
    fn reparse_rejects_other_key_types() {
        let json = br#"{"keys":[{"use":"sig","kty":"EC","kid":"x","alg":"ES256","n":"","e":""}]}"#;
        let result = JsonWebKeySet::from_json(json);
        assert!(matches!(result, Err(KeySetError::InvalidDocument { .. })));
    }

    #[test]
    fn find_by_kid() {
        let key_set = build_key_set([test_public_pem(0), test_public_pem(1)]).unwrap();
        let kid = derive_key_id(&test_public_key(1)).unwrap();
        let found = key_set.find(kid.as_str()).unwrap();
        assert_eq!(found.key(), &test_public_key(1));
        assert!(key_set.find("missing").is_none());
    }
}
