//! JSON Web Key Set builder and RS256 service account token validator.
//!
//! This crate covers both ends of service account token verification:
//!
//! - building a key discovery document (a JSON Web Key Set) from RSA public
//!   keys, each identified by a key ID derived from the key itself
//! - validating a signed compact token against a public key and
//!   extracting the service account identity from its claims
//!
//! # Building a key set
//!
//! ```no_run
//! use sa_token::KeySetBuilder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key_set = KeySetBuilder::new()
//!     .source(std::fs::read("sa-signer.pub")?)
//!     .source(std::fs::read("sa-signer-next.pub")?)
//!     .build()?;
//! std::fs::write("keys.json", key_set.to_json_pretty()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Validating a token
//!
//! ```no_run
//! use chrono::Utc;
//! use sa_token::{PublicKey, TokenValidator};
//!
//! # fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let key = PublicKey::from_pem(std::fs::read("sa-signer.pub")?)?;
//! let identity = TokenValidator::new(key).validate(token, Utc::now())?;
//! assert_eq!(identity.groups()[0], "system:serviceaccounts");
//! # Ok(())
//! # }
//! ```
//!
//! # Validation order
//!
//! | Step | Failure |
//! |------|---------|
//! | Split into `header.payload.signature` | [`TokenError::MalformedToken`] |
//! | Check `alg` is RS256 | [`TokenError::UnsupportedAlgorithm`] |
//! | Verify the signature over `header.payload` | [`TokenError::InvalidSignature`] |
//! | Decode the payload | [`TokenError::MalformedClaims`] |
//! | Classify `exp`, `nbf`, `iat` | [`TokenError::Expired`], [`TokenError::NotYetValid`], [`TokenError::IssuedInFuture`], [`TokenError::ClaimsNotValidated`] |
//! | Extract the `kubernetes.io` claims | [`TokenError::UnexpectedClaimsShape`] |
//!
//! The reference time is always an argument; nothing in this crate reads
//! the system clock.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod claims;
mod config;
mod constants;
mod error;
mod identity;
mod key_id;
mod keys;
mod keyset;
pub mod prelude;
#[cfg(test)]
mod test_support;
mod token;
mod validator;
mod verification;

pub use claims::{Claims, NumericDate, ObjectRef, ServiceAccountClaims};
pub use config::ValidatorConfig;
pub use constants::{
    ALGORITHM_RS256, ALL_SERVICE_ACCOUNTS_GROUP, DEFAULT_KEYSET_PATH, DEFAULT_MAX_TOKEN_LENGTH,
    KEY_TYPE_RSA, KEY_USE_SIGNATURE, PRIVATE_CLAIMS_KEY, SERVICE_ACCOUNT_USERNAME_PREFIX,
};
pub use error::{KeySetError, TokenError};
pub use identity::IdentityRecord;
pub use key_id::{KeyId, derive_key_id};
pub use keys::PublicKey;
pub use keyset::{JsonWebKey, JsonWebKeySet, KeySetBuilder, build_key_set};
pub use token::{CompactToken, TokenHeader};
pub use validator::{TokenValidator, validate};
pub use verification::{Outcome, classify, classify_times, classify_with_leeway};
