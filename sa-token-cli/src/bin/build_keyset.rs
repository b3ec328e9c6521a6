//! Writes a JSON Web Key Set built from PEM public keys.

use anyhow::Result;
use clap::Parser;
use sa_token_cli::{BuildKeysetArgs, init_tracing};

fn main() -> Result<()> {
    init_tracing();
    BuildKeysetArgs::parse().run()
}
