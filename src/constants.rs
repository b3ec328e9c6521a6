//! Constants shared by the key set builder and the token validator.

/// JSON Web Key `use` value for signature keys.
pub const KEY_USE_SIGNATURE: &str = "sig";

/// JSON Web Key `kty` value for RSA keys.
pub const KEY_TYPE_RSA: &str = "RSA";

/// The only supported JWS algorithm.
pub const ALGORITHM_RS256: &str = "RS256";

/// Default location the key set document is written to.
pub const DEFAULT_KEYSET_PATH: &str = "./keys.json";

/// Indentation used when pretty-printing the key set document.
pub const KEYSET_INDENT: &[u8] = b"    ";

/// Claim key holding the service account private claims.
pub const PRIVATE_CLAIMS_KEY: &str = "kubernetes.io";

/// Default maximum accepted token length in bytes.
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 16 * 1024;

/// Prefix of the authenticated user name for service accounts.
pub const SERVICE_ACCOUNT_USERNAME_PREFIX: &str = "system:serviceaccount:";

/// Group every service account belongs to.
pub const ALL_SERVICE_ACCOUNTS_GROUP: &str = "system:serviceaccounts";
