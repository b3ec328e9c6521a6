//! Shared RSA fixtures for unit tests.
//!
//! Key generation is slow in debug builds, so keys are generated once per
//! test binary and reused.

use std::sync::OnceLock;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use sha2::Sha256;

use crate::keys::PublicKey;

const KEY_COUNT: usize = 4;
const KEY_BITS: usize = 1024;

static KEYS: OnceLock<Vec<RsaPrivateKey>> = OnceLock::new();

pub(crate) fn test_key(index: usize) -> &'static RsaPrivateKey {
    let keys = KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        (0..KEY_COUNT)
            .map(|_| RsaPrivateKey::new(&mut rng, KEY_BITS).unwrap())
            .collect()
    });
    &keys[index]
}

pub(crate) fn test_public_key(index: usize) -> PublicKey {
    PublicKey::from(test_key(index).to_public_key())
}

pub(crate) fn test_public_pem(index: usize) -> String {
    test_key(index)
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

pub(crate) fn b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

/// Signs `header.payload` with the given test key and returns the token.
pub(crate) fn sign_token(
    index: usize,
    header: &serde_json::Value,
    payload: &serde_json::Value,
) -> String {
    let signing_input = format!("{}.{}", b64(header.to_string()), b64(payload.to_string()));
    let signer = SigningKey::<Sha256>::new(test_key(index).clone());
    let signature = signer.sign(signing_input.as_bytes()).to_bytes();
    format!("{signing_input}.{}", b64(signature))
}

/// Builds a well-formed service account payload with the given times.
pub(crate) fn service_account_payload(
    iat: Option<i64>,
    nbf: Option<i64>,
    exp: Option<i64>,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "iss": "https://kubernetes.default.svc.cluster.local",
        "sub": "system:serviceaccount:default:builder",
        "kubernetes.io": {
            "namespace": "default",
            "serviceaccount": {"name": "builder", "uid": "3c7a9e51-0b1d-4a37-9d6c-f2a1e4b2c801"},
            "pod": {"name": "builder-7d9f", "uid": "a1b2c3d4-0000-4000-8000-000000000001"}
        }
    });
    for (claim, value) in [("iat", iat), ("nbf", nbf), ("exp", exp)] {
        if let Some(value) = value {
            payload[claim] = value.into();
        }
    }
    payload
}
