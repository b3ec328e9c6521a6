//! Convenient re-exports for glob imports.
//!
//! ```rust
//! use sa_token::prelude::*;
//!
//! let builder = KeySetBuilder::new();
//! assert!(builder.is_empty());
//! ```

pub use crate::{
    // Key sets
    JsonWebKey, JsonWebKeySet, KeyId, KeySetBuilder, PublicKey, build_key_set, derive_key_id,
    // Validation
    Claims, CompactToken, IdentityRecord, NumericDate, Outcome, ServiceAccountClaims,
    TokenValidator, ValidatorConfig, classify, validate,
    // Errors
    KeySetError, TokenError,
};
