// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `token` commands.
//!
//! Both commands work offline: `issue` mints a pair without persisting the
//! session anywhere, and `inspect` checks signature, issuer and expiry but
//! cannot see the revocation state held by a running service.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use warden_config::WardenConfig;
use warden_core::{TokenKind, UserId};
use warden_token::{
    CodecConfig, MemoryRegistry, SessionTable, TokenCodec, TokenLifecycle, TokenPair,
};

use crate::cli::{Cli, InspectArgs, IssueArgs, OutputFormat};
use crate::error::{BinError, BinResult};

/// Executes `token issue`.
pub fn issue(cli: &Cli, args: &IssueArgs) -> BinResult<()> {
    let config = load(cli)?;
    let pair = mint(&config, UserId::new(args.user), &args.name)?;

    match args.format {
        OutputFormat::Text => {
            println!("Access token:");
            println!("  {}", pair.access_token);
            println!("  expires {}", pair.access_expires_at.to_rfc3339());
            println!();
            println!("Refresh token:");
            println!("  {}", pair.refresh_token);
            println!("  expires {}", pair.refresh_expires_at.to_rfc3339());
        }
        OutputFormat::Json => println!("{}", to_json(&pair)?),
    }

    Ok(())
}

/// Mints a pair against a throwaway session table.
pub(crate) fn mint(config: &WardenConfig, user_id: UserId, name: &str) -> BinResult<TokenPair> {
    debug!(user_id = %user_id, "Minting offline credential pair");
    let lifecycle = TokenLifecycle::from_config(
        config,
        Arc::new(MemoryRegistry::new(config.revocation.max_entries)),
        Arc::new(SessionTable::new()),
    )?;
    Ok(lifecycle.issue(user_id, name)?)
}

/// Executes `token inspect`.
pub fn inspect(cli: &Cli, args: &InspectArgs) -> BinResult<()> {
    let config = load(cli)?;
    let (kind, settings) = if args.refresh {
        (TokenKind::Refresh, &config.refresh)
    } else {
        (TokenKind::Access, &config.access)
    };

    let codec = TokenCodec::new(CodecConfig::from_settings(kind, settings, &config.issuer))?;
    let claims = codec
        .verify(args.token.trim())
        .map_err(warden_core::WardenError::from)?;
    let remaining = claims.exp - Utc::now().timestamp();

    match args.format {
        OutputFormat::Text => {
            println!("✓ Valid {} credential", kind);
            println!();
            println!("  Subject:    {}", claims.sub);
            println!("  Name:       {}", claims.name);
            println!("  Token ID:   {}", claims.jti);
            println!("  Issuer:     {}", claims.iss);
            if let Some(issued) = claims.issued_at() {
                println!("  Issued at:  {}", issued.to_rfc3339());
            }
            if let Some(expires) = claims.expires_at() {
                println!("  Expires at: {} ({}s left)", expires.to_rfc3339(), remaining);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "kind": kind.as_str(),
                "claims": claims,
                "remaining_secs": remaining,
            });
            println!("{}", to_json(&output)?);
        }
    }

    Ok(())
}

fn load(cli: &Cli) -> BinResult<WardenConfig> {
    warden_config::load_config(&cli.config).map_err(|e| {
        BinError::from(e).with_context(format!("loading {}", cli.config.display()))
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::runtime(format!("Failed to render JSON: {}", e)))
}
