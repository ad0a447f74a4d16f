// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! warden - identity and access control core
//!
//! Main binary entry point.

use warden_bin::error::report_error_and_exit;
use warden_bin::{commands, init_logging, Cli};

fn main() {
    let cli = Cli::parse_args();

    // Logging defaults come from the config file when it loads cleanly.
    let file_logging = warden_config::load_config(&cli.config)
        .ok()
        .map(|config| config.logging);
    let level = cli.effective_log_level(file_logging.as_ref());
    let format = cli.effective_log_format(file_logging.as_ref());

    if let Err(e) = init_logging(&level, format) {
        report_error_and_exit(e);
    }

    if let Err(e) = commands::execute(cli) {
        report_error_and_exit(e);
    }
}
