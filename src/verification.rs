//! Temporal claim classification.
//!
//! Every function here is pure: the reference time is an argument and no
//! clock is read, so the same inputs always yield the same [`Outcome`].
//!
//! # Rules
//!
//! Checked in order, first match wins:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | any present time claim cannot be interpreted | [`Outcome::Malformed`] |
//! | `exp` present and `now > exp` | [`Outcome::Expired`] |
//! | `nbf` present and `now < nbf` | [`Outcome::NotYetValid`] |
//! | `iat` present and `iat > now` | [`Outcome::IssuedInFuture`] |
//! | otherwise | [`Outcome::Valid`] |
//!
//! Absent claims impose no constraint. Audience, subject and issuer are
//! not examined.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

use crate::claims::NumericDate;
use crate::error::TokenError;

/// Result of classifying a token's temporal claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// All present temporal claims hold at the reference time.
    Valid,
    /// The reference time is after `exp`.
    Expired,
    /// The reference time is before `nbf`.
    NotYetValid,
    /// `iat` is after the reference time.
    IssuedInFuture,
    /// A temporal claim is not a usable numeric date.
    Malformed,
}

impl Outcome {
    /// Returns true for [`Outcome::Valid`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Converts the outcome into the error surfaced to callers.
    ///
    /// # Errors
    ///
    /// Every outcome except `Valid` maps to its `TokenError`; `Malformed`
    /// maps to the opaque `ClaimsNotValidated`.
    pub fn into_result(self) -> Result<(), TokenError> {
        match self {
            Self::Valid => Ok(()),
            Self::Expired => Err(TokenError::Expired),
            Self::NotYetValid => Err(TokenError::NotYetValid),
            Self::IssuedInFuture => Err(TokenError::IssuedInFuture),
            Self::Malformed => Err(TokenError::ClaimsNotValidated),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::NotYetValid => "not yet valid",
            Self::IssuedInFuture => "issued in the future",
            Self::Malformed => "malformed",
        };
        f.write_str(s)
    }
}

/// Classifies raw temporal claims against `now` with no clock-skew leeway.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use sa_token::{NumericDate, Outcome, classify};
///
/// let now = Utc.timestamp_opt(1_000, 0).unwrap();
/// let exp = NumericDate::from_seconds(999);
///
/// assert_eq!(classify(None, None, Some(&exp), now), Outcome::Expired);
/// assert_eq!(classify(None, None, None, now), Outcome::Valid);
/// ```
#[must_use]
pub fn classify(
    not_before: Option<&NumericDate>,
    issued_at: Option<&NumericDate>,
    expiry: Option<&NumericDate>,
    now: DateTime<Utc>,
) -> Outcome {
    classify_with_leeway(not_before, issued_at, expiry, now, TimeDelta::zero())
}

/// Classifies raw temporal claims against `now`, tolerating `leeway` of
/// clock skew in each check.
#[must_use]
pub fn classify_with_leeway(
    not_before: Option<&NumericDate>,
    issued_at: Option<&NumericDate>,
    expiry: Option<&NumericDate>,
    now: DateTime<Utc>,
    leeway: TimeDelta,
) -> Outcome {
    let (Some(not_before), Some(issued_at), Some(expiry)) =
        (interpret(not_before), interpret(issued_at), interpret(expiry))
    else {
        return Outcome::Malformed;
    };
    classify_times(not_before, issued_at, expiry, now, leeway)
}

/// Classifies already-interpreted temporal claims.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use sa_token::{Outcome, classify_times};
///
/// let now = Utc.timestamp_opt(1_000, 0).unwrap();
/// let iat = Utc.timestamp_opt(1_030, 0).unwrap();
///
/// assert_eq!(
///     classify_times(None, Some(iat), None, now, TimeDelta::zero()),
///     Outcome::IssuedInFuture
/// );
/// assert_eq!(
///     classify_times(None, Some(iat), None, now, TimeDelta::seconds(60)),
///     Outcome::Valid
/// );
/// ```
#[must_use]
pub fn classify_times(
    not_before: Option<DateTime<Utc>>,
    issued_at: Option<DateTime<Utc>>,
    expiry: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    leeway: TimeDelta,
) -> Outcome {
    let earliest = now
        .checked_sub_signed(leeway)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let latest = now
        .checked_add_signed(leeway)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    if expiry.is_some_and(|exp| earliest > exp) {
        return Outcome::Expired;
    }
    if not_before.is_some_and(|nbf| latest < nbf) {
        return Outcome::NotYetValid;
    }
    if issued_at.is_some_and(|iat| iat > latest) {
        return Outcome::IssuedInFuture;
    }
    Outcome::Valid
}

/// `Some(None)` for an absent claim, `None` for an uninterpretable one.
fn interpret(date: Option<&NumericDate>) -> Option<Option<DateTime<Utc>>> {
    match date {
        None => Some(None),
        Some(date) => date.to_datetime().map(Some),
    }
}
