//! Command-line front ends for `sa-token`.
//!
//! Two binaries share this library:
//!
//! - `build-keyset <pubkey-path>...` writes a JSON Web Key Set built from
//!   PEM public keys
//! - `validate-token <token-path> <pubkey-path>` prints whether a token is
//!   valid for a public key
//!
//! Logs go to stderr, filtered by `RUST_LOG` (default `info`).

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use sa_token::{
    CompactToken, DEFAULT_KEYSET_PATH, IdentityRecord, KeySetBuilder, PublicKey, TokenError,
    TokenValidator, ValidatorConfig,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the stderr tracing subscriber.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Build a JSON Web Key Set from RSA public keys.
#[derive(Debug, Parser)]
#[command(name = "build-keyset", version)]
pub struct BuildKeysetArgs {
    /// Where to write the key set document
    #[arg(short, long, default_value = DEFAULT_KEYSET_PATH)]
    pub output: PathBuf,

    /// PEM-encoded public keys, in the order they should appear
    pub public_keys: Vec<PathBuf>,
}

impl BuildKeysetArgs {
    /// Reads every key, builds the key set and writes it to `output`.
    ///
    /// Nothing is written unless every key parses.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be read or parsed, or if the
    /// document cannot be written.
    pub fn run(&self) -> Result<()> {
        if self.public_keys.is_empty() {
            warn!("no public keys given; writing an empty key set");
        }

        let mut builder = KeySetBuilder::new();
        for path in &self.public_keys {
            info!(path = %path.display(), "reading public key");
            let pem = fs::read(path)
                .with_context(|| format!("failed to read public key {}", path.display()))?;
            builder = builder.source(pem);
        }

        let key_set = builder.build().context("failed to build key set")?;
        let json = key_set.to_json_pretty()?;
        fs::write(&self.output, json)
            .with_context(|| format!("failed to write key set to {}", self.output.display()))?;

        info!(keys = key_set.len(), output = %self.output.display(), "wrote key set");
        Ok(())
    }
}

/// Validate a service account token against an RSA public key.
#[derive(Debug, Parser)]
#[command(name = "validate-token", version)]
pub struct ValidateTokenArgs {
    /// File containing the compact token
    pub token: PathBuf,

    /// PEM-encoded RSA public key
    pub public_key: PathBuf,

    /// Clock-skew leeway in seconds
    #[arg(long, default_value_t = 0)]
    pub leeway_secs: u64,

    /// Reference time as Unix seconds instead of the current time
    #[arg(long)]
    pub now: Option<i64>,

    /// Reject tokens whose `kid` header does not match the key
    #[arg(long)]
    pub require_kid_match: bool,
}

impl ValidateTokenArgs {
    /// Reads the token and key and validates the token.
    ///
    /// An invalid token is a verdict, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read, the key cannot be parsed
    /// or `--now` is out of range.
    pub fn run(&self) -> Result<Verdict> {
        let token = fs::read_to_string(&self.token)
            .with_context(|| format!("failed to read token {}", self.token.display()))?;
        let pem = fs::read(&self.public_key)
            .with_context(|| format!("failed to read public key {}", self.public_key.display()))?;
        let key = PublicKey::from_pem(pem)
            .with_context(|| format!("failed to parse public key {}", self.public_key.display()))?;

        let now = self.reference_time()?;
        let config = ValidatorConfig::new()
            .with_leeway(Duration::from_secs(self.leeway_secs))
            .with_require_kid_match(self.require_kid_match);

        let token = token.trim();
        if let Some(issuer) = CompactToken::parse(token)
            .ok()
            .and_then(|t| t.unverified_issuer())
        {
            debug!(%issuer, "token claims issuer (unverified)");
        }

        let verdict = match TokenValidator::with_config(key, config).validate(token, now) {
            Ok(identity) => Verdict::Valid(identity),
            Err(reason) => Verdict::Invalid(reason),
        };
        Ok(verdict)
    }

    fn reference_time(&self) -> Result<DateTime<Utc>> {
        match self.now {
            None => Ok(Utc::now()),
            Some(seconds) => DateTime::from_timestamp(seconds, 0)
                .with_context(|| format!("--now {seconds} is not a representable time")),
        }
    }
}

/// Outcome of `validate-token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The token is valid for the identity.
    Valid(IdentityRecord),
    /// The token was rejected.
    Invalid(TokenError),
}

impl Verdict {
    /// Returns true for a valid token.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(identity) => {
                writeln!(f, "The token is valid")?;
                writeln!(f, "\tUser: {}", identity.username())?;
                writeln!(f, "\tUID: {}", identity.uid)?;
                write!(f, "\tGroups: {}", identity.groups().join(", "))
            }
            Self::Invalid(reason) => write!(f, "The token is invalid: {reason}"),
        }
    }
}
