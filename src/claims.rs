//! Token claims and the service account private claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::constants::PRIVATE_CLAIMS_KEY;
use crate::error::TokenError;

/// A `NumericDate` claim value exactly as it appeared in the payload.
///
/// Interpretation is deferred to the temporal checks, so a payload with an
/// odd timestamp still decodes and is classified as malformed there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericDate(serde_json::Value);

impl NumericDate {
    /// Creates a numeric date from whole seconds since the Unix epoch.
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        Self(seconds.into())
    }

    /// Interprets the value as seconds since the Unix epoch.
    ///
    /// Integers and finite floats are accepted; fractional seconds are
    /// floored to the earlier second. Times beyond the representable range
    /// saturate to `DateTime::<Utc>::MIN_UTC` or `DateTime::<Utc>::MAX_UTC`.
    /// Returns `None` for any other JSON value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let serde_json::Value::Number(number) = &self.0 else {
            return None;
        };
        if let Some(seconds) = number.as_i64() {
            return Some(saturating_timestamp(seconds));
        }
        if number.as_u64().is_some() {
            return Some(DateTime::<Utc>::MAX_UTC);
        }

        let seconds = number.as_f64()?.floor();
        if !seconds.is_finite() {
            return None;
        }
        // Both bounds are well inside the exactly representable f64 integers
        let time = if seconds <= DateTime::<Utc>::MIN_UTC.timestamp() as f64 {
            DateTime::<Utc>::MIN_UTC
        } else if seconds >= DateTime::<Utc>::MAX_UTC.timestamp() as f64 {
            DateTime::<Utc>::MAX_UTC
        } else {
            saturating_timestamp(seconds as i64)
        };
        Some(time)
    }
}

fn saturating_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(if seconds < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

impl From<DateTime<Utc>> for NumericDate {
    fn from(time: DateTime<Utc>) -> Self {
        Self::from_seconds(time.timestamp())
    }
}

/// Registered claims of a token payload plus any remaining claims.
///
/// Only constructed from a payload whose signature has already been
/// verified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Issuer
    #[serde(rename = "iss", default)]
    pub issuer: Option<String>,
    /// Subject
    #[serde(rename = "sub", default)]
    pub subject: Option<String>,
    /// Not before
    #[serde(rename = "nbf", default)]
    pub not_before: Option<NumericDate>,
    /// Expiration time
    #[serde(rename = "exp", default)]
    pub expiry: Option<NumericDate>,
    /// Issued at
    #[serde(rename = "iat", default)]
    pub issued_at: Option<NumericDate>,
    /// Every other claim, including the private claims
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Claims {
    /// Decodes claims from a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MalformedClaims` if the payload is not a JSON
    /// object or a registered claim has the wrong type. The decoder's
    /// message is logged, not returned.
    pub fn from_json(payload: &[u8]) -> Result<Self, TokenError> {
        serde_json::from_slice(payload).map_err(|e| {
            error!(error = %e, "service account token claims could not be decoded");
            TokenError::MalformedClaims
        })
    }

    /// Decodes the `kubernetes.io` private claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::UnexpectedClaimsShape` if the claim is absent,
    /// does not decode into [`ServiceAccountClaims`], or lacks a non-empty
    /// namespace, service account name or UID. Pod and secret references
    /// may omit either field.
    pub fn service_account(&self) -> Result<ServiceAccountClaims, TokenError> {
        let Some(raw) = self.extra.get(PRIVATE_CLAIMS_KEY) else {
            error!("service account token has no {PRIVATE_CLAIMS_KEY} private claim");
            return Err(TokenError::UnexpectedClaimsShape);
        };
        let private = ServiceAccountClaims::deserialize(raw).map_err(|e| {
            error!(error = %e, "service account token private claim has unexpected shape");
            TokenError::UnexpectedClaimsShape
        })?;

        if private.namespace.is_empty()
            || private.service_account.name.is_empty()
            || private.service_account.uid.is_empty()
        {
            error!("service account token private claim has an empty identity field");
            return Err(TokenError::UnexpectedClaimsShape);
        }
        Ok(private)
    }
}

/// Reference to a Kubernetes object bound to the token.
///
/// Either field may be absent, in which case it is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Object UID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

/// The `kubernetes.io` private claims of a service account token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAccountClaims {
    /// Namespace of the service account
    pub namespace: String,
    /// The service account itself
    #[serde(rename = "serviceaccount")]
    pub service_account: ObjectRef,
    /// Pod the token is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<ObjectRef>,
    /// Secret the token is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<ObjectRef>,
    /// Time after which the token should be considered stale
    #[serde(rename = "warnafter", default, skip_serializing_if = "Option::is_none")]
    pub warn_after: Option<NumericDate>,
}
