//! Compact serialized tokens: `header.payload.signature`.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use serde::Deserialize;
use sha2::Sha256;
use tracing::error;

use crate::error::TokenError;
use crate::keys::PublicKey;

/// Decoded JOSE header of a compact token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Signature algorithm
    pub alg: String,
    /// Key ID of the signing key, if the issuer set one
    #[serde(default)]
    pub kid: Option<String>,
    /// Media type, usually `JWT`
    #[serde(default)]
    pub typ: Option<String>,
}

/// A structurally valid compact token whose signature has not been checked.
///
/// Parsing only checks the shape: three non-empty base64url segments, a
/// JSON header and raw signature bytes. The payload stays encoded until
/// after [`CompactToken::verify_signature`] succeeds.
#[derive(Debug, Clone)]
pub struct CompactToken<'a> {
    signing_input: &'a str,
    payload_segment: &'a str,
    header: TokenHeader,
    signature: Vec<u8>,
}

impl<'a> CompactToken<'a> {
    /// Splits and decodes the structural parts of a token.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MalformedToken` if the token does not have
    /// exactly three non-empty segments, or if the header or signature
    /// segment cannot be decoded.
    pub fn parse(token: &'a str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header_segment, payload_segment, signature_segment] = segments[..] else {
            return Err(TokenError::malformed_token(format!(
                "expected 3 dot-separated segments, found {}",
                segments.len()
            )));
        };

        if [header_segment, payload_segment, signature_segment]
            .iter()
            .any(|s| s.is_empty())
        {
            return Err(TokenError::malformed_token("token segments must not be empty"));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_segment)
            .map_err(|e| TokenError::malformed_token(format!("header is not base64url: {e}")))?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| TokenError::malformed_token(format!("header is not valid JSON: {e}")))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature_segment)
            .map_err(|e| TokenError::malformed_token(format!("signature is not base64url: {e}")))?;

        let signing_input = &token[..header_segment.len() + 1 + payload_segment.len()];

        Ok(Self {
            signing_input,
            payload_segment,
            header,
            signature,
        })
    }

    /// Returns the decoded header.
    #[must_use]
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// Returns the bytes the signature covers: the encoded header and
    /// payload joined by a dot.
    #[must_use]
    pub fn signing_input(&self) -> &'a str {
        self.signing_input
    }

    /// Verifies the RS256 signature over the signing input.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::InvalidSignature` if the signature does not
    /// verify against `key`.
    pub fn verify_signature(&self, key: &PublicKey) -> Result<(), TokenError> {
        let verifier = VerifyingKey::<Sha256>::new(key.as_rsa().clone());
        let signature = Signature::try_from(self.signature.as_slice())
            .map_err(|_| TokenError::InvalidSignature)?;
        verifier
            .verify(self.signing_input.as_bytes(), &signature)
            .map_err(|_| TokenError::InvalidSignature)
    }

    /// Decodes the payload segment.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MalformedClaims` if the segment is not base64url.
    pub fn payload(&self) -> Result<Vec<u8>, TokenError> {
        URL_SAFE_NO_PAD
            .decode(self.payload_segment)
            .map_err(|e| {
                error!(error = %e, "service account token payload is not base64url");
                TokenError::MalformedClaims
            })
    }

    /// Reads the `iss` claim without verifying the token.
    ///
    /// For diagnostics only: the value is attacker-controlled until the
    /// signature has been verified and must not drive any decision.
    #[must_use]
    pub fn unverified_issuer(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct IssuerOnly {
            iss: Option<String>,
        }

        let payload = self.payload().ok()?;
        serde_json::from_slice::<IssuerOnly>(&payload).ok()?.iss
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{b64, service_account_payload, sign_token, test_public_key};

    fn header() -> serde_json::Value {
        json!({"alg": "RS256", "typ": "JWT", "kid": "abc"})
    }

    #[test]
    fn parses_three_segments() {
        let token = sign_token(0, &header(), &json!({"iss": "me"}));
        let parsed = CompactToken::parse(&token).unwrap();

        assert_eq!(parsed.header().alg, "RS256");
        assert_eq!(parsed.header().kid.as_deref(), Some("abc"));
        assert_eq!(parsed.header().typ.as_deref(), Some("JWT"));
        assert_eq!(
            parsed.signing_input(),
            &token[..token.rfind('.').unwrap()]
        );
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        let token = sign_token(0, &header(), &json!({}));
        let two = token.rsplitn(2, '.').last().unwrap().to_string();
        let four = format!("{token}.extra");

        for bad in [two.as_str(), four.as_str(), "", "abc"] {
            assert!(
                matches!(CompactToken::parse(bad), Err(TokenError::MalformedToken { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_empty_segment() {
        let h = b64(header().to_string());
        let token = format!("{h}..c2ln");
        assert!(matches!(
            CompactToken::parse(&token),
            Err(TokenError::MalformedToken { .. })
        ));
    }

    #[test]
    fn rejects_undecodable_header() {
        let token = format!("!!!.{}.c2ln", b64("{}"));
        assert!(matches!(
            CompactToken::parse(&token),
            Err(TokenError::MalformedToken { .. })
        ));

        let token = format!("{}.{}.c2ln", b64("not json"), b64("{}"));
        assert!(matches!(
            CompactToken::parse(&token),
            Err(TokenError::MalformedToken { .. })
        ));
    }

    #[test]
    fn signature_verifies_with_signing_key_only() {
        let token = sign_token(0, &header(), &json!({"iss": "me"}));
        let parsed = CompactToken::parse(&token).unwrap();

        assert!(parsed.verify_signature(&test_public_key(0)).is_ok());
        assert_eq!(
            parsed.verify_signature(&test_public_key(1)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let token = sign_token(0, &header(), &service_account_payload(None, None, None));
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], b64(json!({"iss": "evil"}).to_string()), parts[2]);

        let parsed = CompactToken::parse(&forged).unwrap();
        assert_eq!(
            parsed.verify_signature(&test_public_key(0)),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn unverified_issuer_peeks_payload() {
        let token = sign_token(0, &header(), &json!({"iss": "https://issuer.example"}));
        let parsed = CompactToken::parse(&token).unwrap();
        assert_eq!(
            parsed.unverified_issuer().as_deref(),
            Some("https://issuer.example")
        );

        let token = sign_token(0, &header(), &json!({"sub": "x"}));
        assert_eq!(CompactToken::parse(&token).unwrap().unverified_issuer(), None);
    }
}
