//! Integration tests for CLI argument handling
//!
//! Tests startup flags without binding a socket.

use std::process::Command;

/// Helper to run the binary with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_suggest-proxy"))
        .args(args)
        .output()
        .expect("Failed to execute suggest-proxy")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("suggest-proxy"), "Help should mention suggest-proxy");
    assert!(stdout.contains("--bind"), "Help should mention --bind flag");
    assert!(stdout.contains("--max-cache-mb"), "Help should mention --max-cache-mb flag");
}

#[test]
fn test_invalid_bind_address_prints_error_and_exits() {
    let output = run_cli(&["--bind", "not-an-address"]);
    assert!(!output.status.success(), "Expected invalid address to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid") || stderr.contains("Invalid"),
        "Should print error message about invalid address: {}",
        stderr
    );
}

#[test]
fn test_zero_maintenance_interval_exits_with_error() {
    let output = run_cli(&["--maintenance-interval-hours", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("maintenance interval"),
        "Should explain the rejected interval: {}",
        stderr
    );
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use suggest_proxy::cli::{Cli, StartupConfig};
    use suggest_proxy::config::CredentialSource;

    #[test]
    fn test_cli_upstream_override() {
        let cli = Cli::parse_from(["suggest-proxy", "--upstream-url", "http://localhost:9999"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.upstream_url, "http://localhost:9999");
    }

    #[test]
    fn test_cli_cache_limits() {
        let cli = Cli::parse_from([
            "suggest-proxy",
            "--max-cache-mb",
            "64",
            "--maintenance-interval-hours",
            "6",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!((config.maintenance.max_megabytes - 64.0).abs() < f64::EPSILON);
        assert_eq!(config.maintenance.interval.as_secs(), 6 * 60 * 60);
    }

    #[test]
    fn test_credential_is_read_from_named_variable() {
        let cli = Cli::parse_from(["suggest-proxy", "--credential-env", "OTHER_KEY"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.service.credential,
            CredentialSource::Env("OTHER_KEY".to_string())
        );
    }

    #[test]
    fn test_negative_cache_limit_is_rejected() {
        let cli = Cli::parse_from(["suggest-proxy", "--max-cache-mb=-1"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }
}
