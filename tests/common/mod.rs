//! RSA fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use sa_token::PublicKey;
use serde_json::json;
use sha2::Sha256;

pub const KEY_COUNT: usize = 5;

pub fn private_key(index: usize) -> &'static RsaPrivateKey {
    static KEYS: OnceLock<Vec<RsaPrivateKey>> = OnceLock::new();
    &KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        (0..KEY_COUNT)
            .map(|_| RsaPrivateKey::new(&mut rng, 1024).unwrap())
            .collect()
    })[index]
}

pub fn public_key(index: usize) -> PublicKey {
    PublicKey::from(private_key(index).to_public_key())
}

pub fn public_pem(index: usize) -> String {
    private_key(index)
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .unwrap()
}

pub fn b64(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn sign(index: usize, payload: &serde_json::Value) -> String {
    let header = json!({"alg": "RS256", "typ": "JWT"});
    let input = format!("{}.{}", b64(header.to_string()), b64(payload.to_string()));
    let signature = SigningKey::<Sha256>::new(private_key(index).clone())
        .sign(input.as_bytes())
        .to_bytes();
    format!("{input}.{}", b64(signature))
}

pub fn service_account_claims() -> serde_json::Value {
    json!({
        "iss": "https://kubernetes.default.svc",
        "sub": "system:serviceaccount:payments:api",
        "kubernetes.io": {
            "namespace": "payments",
            "serviceaccount": {"name": "api", "uid": "0d5e6a1c-8f3b-4c9e-a2d7-5b1e9c3f7a40"},
            "pod": {"name": "api-5c9f8", "uid": "e2c4b6a8-1111-4222-8333-944455556666"}
        }
    })
}
