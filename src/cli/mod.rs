// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;

/// Kidney Stone Detection Web Service
#[derive(Parser, Debug)]
#[command(name = "stonescan-node")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Web service for kidney stone detection on CT imagery", long_about = None)]
pub struct Cli {
    /// Host to bind on (default: 0.0.0.0)
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind on (default: 5000)
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Enable debug mode (verbose logging, error details in responses)
    #[arg(long)]
    pub debug: bool,
}
