//! Error types for key set construction and token validation.

use std::fmt;

/// Errors that can occur while building a JSON Web Key Set.
///
/// Every variant aborts the whole build; no partial key set is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySetError {
    /// The input contained no PEM block.
    MalformedKeyInput {
        /// Position of the offending input in the build sequence
        index: usize,
        /// Description of the PEM error
        reason: String,
    },
    /// The PEM block is not a valid `SubjectPublicKeyInfo` structure.
    UnparseableKey {
        /// Position of the offending input in the build sequence
        index: usize,
        /// Description of the parsing error
        reason: String,
    },
    /// The key is valid but not an RSA public key.
    UnsupportedKeyType {
        /// Position of the offending input in the build sequence
        index: usize,
        /// The algorithm OID found in the key
        algorithm: String,
    },
    /// The key could not be re-encoded to derive its key ID.
    KeyIdDerivationFailed {
        /// Description of the encoding error
        reason: String,
    },
    /// The key set document could not be serialized.
    Serialization {
        /// Description of the encoding error
        reason: String,
    },
    /// A key set document could not be read back.
    InvalidDocument {
        /// Description of the document error
        reason: String,
    },
}

impl KeySetError {
    /// Returns the error attributed to the input at `position`.
    pub(crate) fn at_index(self, position: usize) -> Self {
        match self {
            Self::MalformedKeyInput { reason, .. } => Self::MalformedKeyInput {
                index: position,
                reason,
            },
            Self::UnparseableKey { reason, .. } => Self::UnparseableKey {
                index: position,
                reason,
            },
            Self::UnsupportedKeyType { algorithm, .. } => Self::UnsupportedKeyType {
                index: position,
                algorithm,
            },
            other => other,
        }
    }
}

impl fmt::Display for KeySetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedKeyInput { index, reason } => {
                write!(f, "public key #{index}: error decoding PEM input: {reason}")
            }
            Self::UnparseableKey { index, reason } => {
                write!(f, "public key #{index}: error parsing key content: {reason}")
            }
            Self::UnsupportedKeyType { index, algorithm } => {
                write!(
                    f,
                    "public key #{index}: key algorithm {algorithm} is not RSA; only RS256 keys are supported"
                )
            }
            Self::KeyIdDerivationFailed { reason } => {
                write!(f, "failed to derive key ID from public key: {reason}")
            }
            Self::Serialization { reason } => {
                write!(f, "JSON encoding of web key set failed: {reason}")
            }
            Self::InvalidDocument { reason } => {
                write!(f, "invalid web key set document: {reason}")
            }
        }
    }
}

impl std::error::Error for KeySetError {}

/// Errors that can occur while validating a service account token.
///
/// Only the temporal variants carry details a caller may act on; the
/// remaining variants describe the failure without echoing token contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not three non-empty base64url segments.
    MalformedToken {
        /// Description of the structural error
        reason: String,
    },
    /// The header names an algorithm other than RS256.
    UnsupportedAlgorithm {
        /// The algorithm named in the token header
        alg: String,
    },
    /// The signature does not verify against the supplied key.
    InvalidSignature,
    /// The payload is not a JSON claims object. The decoding detail is
    /// logged, not carried.
    MalformedClaims,
    /// The token expired before the reference time.
    Expired,
    /// The token's not-before time is after the reference time.
    NotYetValid,
    /// The token's issued-at time is after the reference time.
    IssuedInFuture,
    /// The private claims are missing or not the service account shape.
    UnexpectedClaimsShape,
    /// Temporal claims could not be interpreted.
    ClaimsNotValidated,
}

impl TokenError {
    /// Returns true if the error is a temporal verdict that is safe to
    /// report verbatim to the token holder.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::Expired | Self::NotYetValid | Self::IssuedInFuture)
    }

    pub(crate) fn malformed_token(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken { reason } => write!(f, "malformed token: {reason}"),
            Self::UnsupportedAlgorithm { alg } => {
                write!(f, "unsupported token algorithm '{alg}'; only RS256 is accepted")
            }
            Self::InvalidSignature => write!(f, "token signature verification failed"),
            Self::MalformedClaims => write!(
                f,
                "service account token claims could not be validated due to undecodable claims"
            ),
            Self::Expired => write!(f, "service account token has expired"),
            Self::NotYetValid => write!(f, "service account token is not valid yet"),
            Self::IssuedInFuture => write!(f, "service account token is issued in the future"),
            Self::UnexpectedClaimsShape => write!(
                f,
                "service account token claims could not be validated due to unexpected private claim"
            ),
            Self::ClaimsNotValidated => write!(
                f,
                "service account token claims could not be validated due to unexpected validation error"
            ),
        }
    }
}

impl std::error::Error for TokenError {}
