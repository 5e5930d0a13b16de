//! Tests for CLI module

use super::*;
use clap::Parser;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_parse_run_with_overrides() {
    let cli = Cli::parse_from([
        "sparkify-lake",
        "--input",
        "s3://udacity-dend",
        "-o",
        "/tmp/lake",
        "-v",
        "run",
    ]);
    assert_eq!(cli.command, Commands::Run);
    assert_eq!(cli.input.as_deref(), Some("s3://udacity-dend"));
    assert_eq!(cli.output.as_deref(), Some("/tmp/lake"));
    assert!(cli.verbose);
    assert_eq!(cli.format, OutputFormat::Json);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::parse_from(["sparkify-lake", "activity", "--format", "pretty"]);
    assert_eq!(cli.command, Commands::Activity);
    assert_eq!(cli.format, OutputFormat::Pretty);
}

#[test]
fn test_unknown_subcommand_rejected() {
    assert!(Cli::try_parse_from(["sparkify-lake", "serve"]).is_err());
}

#[test]
fn test_flags_override_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "input: ./data\noutput: ./out\nplay_page: Play\nmatching: artist_consistent"
    )
    .unwrap();
    let path = file.path().to_string_lossy().to_string();

    let cli = Cli::parse_from(["sparkify-lake", "-c", &path, "-o", "s3://lake/v2", "config"]);
    let config = Runner::new(cli).effective_config().unwrap();

    assert_eq!(config.input, "./data");
    assert_eq!(config.output, "s3://lake/v2");
    assert_eq!(config.play_page, "Play");
    assert_eq!(config.matching, crate::config::MatchStrategy::ArtistConsistent);
}

#[test]
fn test_invalid_config_file_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "read_concurrency: 0").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let cli = Cli::parse_from(["sparkify-lake", "--config", &path, "config"]);
    assert!(Runner::new(cli).effective_config().is_err());
}

#[test]
fn test_render_summary_formats() {
    let mut stats = crate::types::RunStats::new();
    stats.play_events = 3;
    let summary = serde_json::json!({ "type": "SUMMARY", "stats": stats });

    let line = OutputFormat::Json.render(&summary).unwrap();
    assert!(!line.contains('\n'));
    assert!(line.contains("\"play_events\":3"));

    let pretty = OutputFormat::Pretty.render(&summary).unwrap();
    assert!(pretty.contains("\n  \"stats\": {"));
    let parsed: serde_json::Value = serde_json::from_str(&pretty).unwrap();
    assert_eq!(parsed, summary);
}
