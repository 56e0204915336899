//! Tests for automerge argument parsing.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_automerge() {
    match parse(&[
        "pipekit",
        "automerge",
        "17",
        "--repo",
        "acme/widgets",
        "--actor",
        "dependabot[bot]",
        "--token",
        "t0k",
    ]) {
        CliCommand::Automerge {
            number,
            repo,
            actor,
            token,
            api_url,
        } => {
            assert_eq!(number, 17);
            assert_eq!(repo, "acme/widgets");
            assert_eq!(actor, "dependabot[bot]");
            assert_eq!(token.as_deref(), Some("t0k"));
            assert!(api_url.starts_with("https://"));
        }
        _ => panic!("expected Automerge"),
    }
}

#[test]
fn cli_parse_automerge_custom_api_url() {
    match parse(&[
        "pipekit",
        "automerge",
        "3",
        "--repo",
        "a/b",
        "--actor",
        "x",
        "--api-url",
        "https://ghe.example/api/v3",
    ]) {
        CliCommand::Automerge { api_url, .. } => {
            assert_eq!(api_url, "https://ghe.example/api/v3");
        }
        _ => panic!("expected Automerge"),
    }
}

#[test]
fn cli_parse_automerge_rejects_non_numeric_change() {
    let res = Cli::try_parse_from([
        "pipekit", "automerge", "abc", "--repo", "a/b", "--actor", "x",
    ]);
    assert!(res.is_err());
}

#[test]
fn cli_parse_global_config_flag() {
    let cli = Cli::try_parse_from([
        "pipekit",
        "automerge",
        "1",
        "--repo",
        "a/b",
        "--actor",
        "x",
        "--config",
        "/tmp/pipekit.toml",
    ])
    .unwrap();
    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("/tmp/pipekit.toml"))
    );
}
