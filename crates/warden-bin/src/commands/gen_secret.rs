// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `gen-secret` command.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::cli::{Cli, GenSecretArgs};
use crate::error::{BinError, BinResult};

/// Smallest secret the command will produce.
const MIN_SECRET_BYTES: usize = 32;

/// Executes the `gen-secret` command.
pub fn gen_secret(_cli: &Cli, args: &GenSecretArgs) -> BinResult<()> {
    if args.bytes < MIN_SECRET_BYTES {
        return Err(BinError::config(format!(
            "--bytes must be at least {}",
            MIN_SECRET_BYTES
        )));
    }

    if args.env {
        println!("WARDEN_ACCESS_SECRET={}", generate_secret(args.bytes));
        println!("WARDEN_REFRESH_SECRET={}", generate_secret(args.bytes));
    } else {
        println!("{}", generate_secret(args.bytes));
    }

    eprintln!();
    eprintln!("Store secrets securely. Access and refresh secrets must differ.");

    Ok(())
}

/// Returns `bytes` random bytes from the OS generator, base64url-encoded.
pub fn generate_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
