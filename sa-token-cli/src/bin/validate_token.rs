//! Prints whether a service account token is valid for a public key.

use anyhow::Result;
use clap::Parser;
use sa_token_cli::{ValidateTokenArgs, init_tracing};

fn main() -> Result<()> {
    init_tracing();
    let verdict = ValidateTokenArgs::parse().run()?;
    println!("{verdict}");
    Ok(())
}
