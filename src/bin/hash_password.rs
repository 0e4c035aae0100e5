//! Password Hash Tool
//!
//! Generates a bcrypt hash suitable for the ADMIN_PASSWORD_HASH environment
//! variable, so deployments never have to keep the plaintext around.
//!
//! Usage:
//!   cargo run --bin hash-password -- --password "my-secret"
//!   cargo run --bin hash-password -- --password "my-secret" --cost 12

use anyhow::{Context, Result};
use clap::Parser;

/// Bcrypt hash generator for the admin credential
#[derive(Parser, Debug)]
#[command(name = "hash-password")]
#[command(about = "Generate a bcrypt hash for ADMIN_PASSWORD_HASH")]
struct Cli {
    /// Password to hash
    #[arg(short, long, env = "ADMIN_PASSWORD")]
    password: String,

    /// Bcrypt cost factor
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
    cost: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let hash = bcrypt::hash(&cli.password, cli.cost).context("Failed to hash password")?;
    println!("{hash}");

    Ok(())
}
