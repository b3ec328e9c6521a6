//! Service account token validation.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, warn};

use crate::claims::{Claims, ServiceAccountClaims};
use crate::config::ValidatorConfig;
use crate::constants::ALGORITHM_RS256;
use crate::error::TokenError;
use crate::identity::IdentityRecord;
use crate::keys::PublicKey;
use crate::token::CompactToken;
use crate::verification::{Outcome, classify_with_leeway};

/// Validates RS256 service account tokens against one public key.
///
/// Validation runs in a fixed order and stops at the first failure:
///
/// 1. structural parse of the compact token
/// 2. RS256 signature check over `header.payload`
/// 3. payload decode into [`Claims`]
/// 4. temporal classification against the supplied reference time
/// 5. extraction of the service account identity
///
/// No claim is decoded before the signature has verified. The validator
/// holds no mutable state and may be shared across threads.
///
/// # Example
///
/// ```no_run
/// use chrono::Utc;
/// use sa_token::{PublicKey, TokenValidator};
///
/// # fn example(pem: &[u8], token: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let validator = TokenValidator::new(PublicKey::from_pem(pem)?);
/// let identity = validator.validate(token, Utc::now())?;
/// println!("authenticated {}", identity.username());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenValidator {
    key: PublicKey,
    config: ValidatorConfig,
}

impl TokenValidator {
    /// Creates a validator with the default configuration.
    #[must_use]
    pub fn new(key: PublicKey) -> Self {
        Self::with_config(key, ValidatorConfig::default())
    }

    /// Creates a validator with an explicit configuration.
    #[must_use]
    pub fn with_config(key: PublicKey, config: ValidatorConfig) -> Self {
        Self { key, config }
    }

    /// Returns the verification key.
    #[must_use]
    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates `token` at the reference time `now` and returns the
    /// authenticated identity.
    ///
    /// # Errors
    ///
    /// - `MalformedToken` if the token is too long or not three base64url segments
    /// - `UnsupportedAlgorithm` if the header names an algorithm other than RS256
    /// - `InvalidSignature` if the signature does not verify
    /// - `MalformedClaims` if the payload is not a claims object
    /// - `Expired`, `NotYetValid` or `IssuedInFuture` for temporal failures
    /// - `ClaimsNotValidated` if a time claim cannot be interpreted
    /// - `UnexpectedClaimsShape` if the service account claims are missing
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityRecord, TokenError> {
        if token.len() > self.config.max_token_length {
            return Err(TokenError::malformed_token(format!(
                "token length {} exceeds maximum {}",
                token.len(),
                self.config.max_token_length
            )));
        }

        let token = CompactToken::parse(token)?;
        self.check_header(&token)?;
        token.verify_signature(&self.key)?;
        debug!("token signature verified");

        let claims = Claims::from_json(&token.payload()?)?;
        self.check_times(&claims, now)?;

        let private = claims.service_account()?;
        check_staleness(&private, now);

        let identity = IdentityRecord::from(&private);
        debug!(user = %identity.username(), "service account token validated");
        Ok(identity)
    }

    fn check_header(&self, token: &CompactToken<'_>) -> Result<(), TokenError> {
        let header = token.header();
        if header.alg != ALGORITHM_RS256 {
            return Err(TokenError::UnsupportedAlgorithm {
                alg: header.alg.clone(),
            });
        }

        if !self.config.require_kid_match {
            return Ok(());
        }
        let Some(kid) = header.kid.as_deref() else {
            return Ok(());
        };
        match self.key.key_id() {
            Ok(expected) if expected == kid => Ok(()),
            Ok(expected) => {
                debug!(token_kid = kid, %expected, "token key ID does not match verification key");
                Err(TokenError::InvalidSignature)
            }
            Err(e) => {
                error!(error = %e, "could not derive key ID of verification key");
                Err(TokenError::InvalidSignature)
            }
        }
    }

    fn check_times(&self, claims: &Claims, now: DateTime<Utc>) -> Result<(), TokenError> {
        let leeway = TimeDelta::from_std(self.config.leeway).unwrap_or(TimeDelta::MAX);
        let outcome = classify_with_leeway(
            claims.not_before.as_ref(),
            claims.issued_at.as_ref(),
            claims.expiry.as_ref(),
            now,
            leeway,
        );

        match outcome {
            Outcome::Valid => {}
            Outcome::Malformed => {
                let bad: Vec<&str> = [
                    ("nbf", &claims.not_before),
                    ("iat", &claims.issued_at),
                    ("exp", &claims.expiry),
                ]
                .into_iter()
                .filter(|(_, date)| date.as_ref().is_some_and(|d| d.to_datetime().is_none()))
                .map(|(name, _)| name)
                .collect();
                error!(claims = ?bad, "service account token claim validation got uninterpretable time claims");
            }
            rejected => debug!(outcome = %rejected, "service account token rejected"),
        }
        outcome.into_result()
    }
}

/// Warns about a token used past its `warnafter` time. Never rejects.
fn check_staleness(private: &ServiceAccountClaims, now: DateTime<Utc>) {
    let Some(raw) = private.warn_after.as_ref() else {
        return;
    };
    match raw.to_datetime() {
        Some(warn_after) if now > warn_after => warn!(
            namespace = %private.namespace,
            service_account = %private.service_account.name,
            %warn_after,
            "stale service account token is still in use"
        ),
        Some(_) => {}
        None => warn!(
            namespace = %private.namespace,
            service_account = %private.service_account.name,
            warnafter = ?raw,
            "service account token has an uninterpretable warnafter claim"
        ),
    }
}

/// Validates `token` against `key` at `now` with the default configuration.
///
/// # Errors
///
/// See [`TokenValidator::validate`].
pub fn validate(
    token: &str,
    key: &PublicKey,
    now: DateTime<Utc>,
) -> Result<IdentityRecord, TokenError> {
    TokenValidator::new(key.clone()).validate(token, now)
}
