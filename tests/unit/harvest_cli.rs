//! Unit tests for harvest command-line parsing

use clap::Parser;
use reaction_harvester::cli::Cli;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["reaction-harvester"]);

    assert!(!cli.get_public_channels);
    assert!(!cli.totalize);
    assert!(!cli.try_errors);
    assert!(!cli.emoji);
    assert_eq!(cli.limit, 200);
    assert_eq!(cli.state_dir, PathBuf::from("channels"));
    assert_eq!(cli.chats_dir, PathBuf::from("chats"));
    assert_eq!(cli.report, PathBuf::from("result.csv"));
    assert_eq!(cli.emoji_output, PathBuf::from("emoji-custom.csv"));
    assert_eq!(cli.page_delay_secs, 5);
    assert!(cli.metrics_addr.is_none());
}

#[test]
fn test_cli_short_flags() {
    let cli = Cli::parse_from(["reaction-harvester", "-t", "-e", "-l", "500"]);

    assert!(cli.totalize);
    assert!(cli.emoji);
    assert_eq!(cli.limit, 500);
}

#[test]
fn test_cli_long_flags() {
    let cli = Cli::parse_from([
        "reaction-harvester",
        "--get-public-channels",
        "--try-errors",
        "--state-dir",
        "/tmp/state",
        "--chats-dir",
        "/tmp/chats",
        "--page-delay-secs",
        "1",
        "--metrics-addr",
        "127.0.0.1:9000",
        "--token",
        "xoxb-from-flag",
    ]);

    assert!(cli.get_public_channels);
    assert!(cli.try_errors);
    assert_eq!(cli.storage_paths().state_dir(), PathBuf::from("/tmp/state"));
    assert_eq!(cli.storage_paths().chats_dir(), PathBuf::from("/tmp/chats"));
    assert_eq!(cli.page_delay_secs, 1);
    assert_eq!(cli.metrics_addr.unwrap().port(), 9000);
    assert_eq!(cli.token.as_deref(), Some("xoxb-from-flag"));
}

#[test]
fn test_negative_limit_falls_back_to_default() {
    let cli = Cli::parse_from(["reaction-harvester", "-l", "-5"]);

    assert_eq!(cli.limit, -5);
    assert_eq!(cli.collector_config().page_limit.get(), 200);
}

#[test]
fn test_oversized_limit_is_capped() {
    let cli = Cli::parse_from(["reaction-harvester", "--limit", "5000"]);
    assert_eq!(cli.collector_config().page_limit.get(), 1000);
}

#[test]
fn test_page_delay_applies_to_cooldown() {
    let cli = Cli::parse_from(["reaction-harvester", "--page-delay-secs", "2"]);
    let config = cli.collector_config();

    assert_eq!(config.page_delay, Duration::from_secs(2));
    assert_eq!(config.cooldown_delay, Duration::from_secs(2));
    assert_eq!(config.cooldown_every, 11);
}

#[test]
fn test_invalid_limit_rejected() {
    let result = Cli::try_parse_from(["reaction-harvester", "--limit", "lots"]);
    assert!(result.is_err());
}
