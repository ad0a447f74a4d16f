// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `validate`: Validate configuration file
//! - `version`: Show version information
//! - `gen-secret`: Generate a signing secret
//! - `token issue` / `token inspect`: Mint and verify credentials

mod gen_secret;
mod token;
mod validate;
mod version;

pub use gen_secret::{gen_secret, generate_secret};
pub use token::{inspect, issue};
pub use validate::validate;
pub use version::version;

use crate::cli::{Cli, Commands, TokenCommands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub fn execute(cli: Cli) -> BinResult<()> {
    match &cli.command {
        Commands::Validate(args) => validate::validate(&cli, args),
        Commands::Version => version::version(&cli),
        Commands::GenSecret(args) => gen_secret::gen_secret(&cli, args),
        Commands::Token(args) => match &args.command {
            TokenCommands::Issue(args) => token::issue(&cli, args),
            TokenCommands::Inspect(args) => token::inspect(&cli, args),
        },
    }
}
