//! Multipass relay CLI - Operator tools for Multipass tokens.
//!
//! # Usage
//!
//! ```bash
//! # Issue a login URL for a customer
//! mp-cli multipass generate -e user@example.com
//!
//! # Issue a login URL that lands on a specific page
//! mp-cli multipass generate -e user@example.com -r https://shop.example.com/cart
//!
//! # Check that a token (or full login URL) was signed with our secret
//! mp-cli multipass verify -t 'https://shop.example.com/account/login/multipass/...'
//! ```
//!
//! # Commands
//!
//! - `multipass generate` - Generate a Multipass token and login URL
//! - `multipass verify` - Check a token's signature

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "Multipass relay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and inspect Multipass tokens
    Multipass {
        #[command(subcommand)]
        action: MultipassAction,
    },
}

#[derive(Subcommand)]
enum MultipassAction {
    /// Generate a Multipass token and login URL
    Generate {
        /// Customer email address
        #[arg(short, long)]
        email: String,

        /// Page to land on after login (default: the account page)
        #[arg(short, long)]
        return_to: Option<String>,
    },
    /// Verify a token's signature
    Verify {
        /// Token, or a full `/account/login/multipass/` URL
        #[arg(short, long)]
        token: String,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), commands::multipass::MultipassCommandError> {
    match cli.command {
        Commands::Multipass { action } => match action {
            MultipassAction::Generate { email, return_to } => {
                commands::multipass::generate(&email, return_to.as_deref())?;
            }
            MultipassAction::Verify { token } => commands::multipass::verify(&token)?,
        },
    }
    Ok(())
}
