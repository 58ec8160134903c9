// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// tests/cli_tests.rs - Launcher argument handling

use clap::Parser;
use stonescan_node::cli::Cli;
use stonescan_node::config::ServerConfig;

#[test]
fn test_default_invocation_yields_spec_defaults() {
    let cli = Cli::try_parse_from(["stonescan-node"]).unwrap();
    assert_eq!(cli.host, "0.0.0.0");
    assert_eq!(cli.port, 5000);
    assert!(!cli.debug);
}

#[test]
fn test_debug_flag_only_flips_debug() {
    let cli = Cli::try_parse_from(["stonescan-node", "--debug"]).unwrap();
    assert!(cli.debug);
    assert_eq!(cli.host, "0.0.0.0");
    assert_eq!(cli.port, 5000);
}

#[test]
fn test_host_and_port_flow_into_bind_address() {
    let cli = Cli::try_parse_from([
        "stonescan-node",
        "--host",
        "192.168.1.50",
        "--port",
        "8080",
    ])
    .unwrap();
    let config = ServerConfig::from_cli(&cli);
    assert_eq!(config.bind_addr(), "192.168.1.50:8080");
}

#[test]
fn test_non_integer_port_fails_before_startup() {
    let result = Cli::try_parse_from(["stonescan-node", "--port", "not-a-port"]);
    assert!(result.is_err());

    let err = result.unwrap_err();
    // clap reports a value parse failure, which main() surfaces as a
    // non-zero exit before any initialization happens
    assert!(err.to_string().contains("--port"));
}

#[test]
fn test_port_above_u16_range_rejected() {
    assert!(Cli::try_parse_from(["stonescan-node", "--port", "70000"]).is_err());
}

#[test]
fn test_negative_port_rejected() {
    assert!(Cli::try_parse_from(["stonescan-node", "--port", "-1"]).is_err());
}
