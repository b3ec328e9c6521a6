//! Configuration for token validation.

use std::time::Duration;

use crate::constants::DEFAULT_MAX_TOKEN_LENGTH;

/// Configuration for the [`TokenValidator`](crate::TokenValidator).
///
/// The defaults reproduce strict validation against a single reference
/// time: no clock-skew leeway and no key ID pinning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Clock-skew leeway applied to the expiry, not-before and issued-at
    /// checks.
    ///
    /// Default: zero
    pub leeway: Duration,

    /// Maximum accepted token length in bytes.
    ///
    /// Longer tokens are rejected before any decoding takes place.
    /// Default: 16 KiB
    pub max_token_length: usize,

    /// Whether a `kid` in the token header must match the key ID derived
    /// from the supplied public key.
    ///
    /// Tokens without a `kid` header are accepted either way.
    /// Default: false
    pub require_kid_match: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            leeway: Duration::ZERO,
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
            require_kid_match: false,
        }
    }
}

impl ValidatorConfig {
    /// Creates a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clock-skew leeway.
    #[must_use]
    pub const fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Sets the maximum accepted token length.
    #[must_use]
    pub const fn with_max_token_length(mut self, max: usize) -> Self {
        self.max_token_length = max;
        self
    }

    /// Enables or disables key ID pinning.
    #[must_use]
    pub const fn with_require_kid_match(mut self, require: bool) -> Self {
        self.require_kid_match = require;
        self
    }
}
