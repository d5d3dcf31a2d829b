//! Tests for process bootstrap.

use clap::Parser;
use filterwatch::{Cli, Launcher, describe_plan, irc_settings};
use filterwatch_config::{BotsConfig, ConfigStore};
use filterwatch_error::FilterwatchErrorKind;
use filterwatch_mediawiki::MediaWikiConnector;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn bots(port: u16) -> String {
    format!(
        r##"
[bots.AbuseBot]
host = "127.0.0.1"
port = {port}
real_name = "Abuse filter relay"
password = "hunter2"
wikis_channels = "en.wikipedia.org: #abuse"
formats = "default: {{user}} tripped {{filter_id}}"

[bots.AbuseBot2]
host = "127.0.0.1"
port = {port}
slave = true
master = "AbuseBot"

[bots.Dormant]
start = false
host = "127.0.0.1"
"##
    )
}

fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_cli_flags() {
    let cli = Cli::try_parse_from([
        "filterwatch",
        "-c",
        "/etc/filterwatch/bots.toml",
        "-l",
        "debug",
        "--json-logs",
        "--check",
    ])
    .unwrap();
    assert_eq!(cli.config.to_str(), Some("/etc/filterwatch/bots.toml"));
    assert_eq!(cli.log_level, "debug");
    assert!(cli.json_logs);
    assert!(cli.check);
}

#[test]
fn test_cli_rejects_unknown_log_level() {
    assert!(Cli::try_parse_from(["filterwatch", "--log-level", "verbose"]).is_err());
}

#[test]
fn test_irc_settings_follow_instance() {
    let config = BotsConfig::from_toml_str(&bots(6697)).unwrap();
    let settings = irc_settings(&config.instance("AbuseBot").unwrap());
    assert_eq!(settings.host(), "127.0.0.1");
    assert_eq!(*settings.port(), 6697);
    assert_eq!(settings.nick().as_str(), "AbuseBot");
    assert_eq!(settings.real_name(), "Abuse filter relay");
    assert_eq!(settings.password().as_deref(), Some("hunter2"));
    assert_eq!(*settings.line_rate(), Duration::from_secs(2));
    assert!(!*settings.ssl());
}

#[test]
fn test_ssl_option_reaches_transport_and_plan() {
    let config = BotsConfig::from_toml_str(&bots(6697).replacen(
        "real_name =",
        "ssl = true\nreal_name =",
        1,
    ))
    .unwrap();
    assert!(*irc_settings(&config.instance("AbuseBot").unwrap()).ssl());
    assert!(!*irc_settings(&config.instance("AbuseBot2").unwrap()).ssl());
    assert_eq!(
        describe_plan(&config.startup_plan().unwrap())[0],
        "start AbuseBot (127.0.0.1:6697 tls, master, 1 sources)"
    );
}

#[test]
fn test_describe_plan() {
    let config = BotsConfig::from_toml_str(&bots(6667)).unwrap();
    let lines = describe_plan(&config.startup_plan().unwrap());
    assert_eq!(
        lines,
        [
            "start AbuseBot (127.0.0.1:6667, master, 1 sources)",
            "start AbuseBot2 (127.0.0.1:6667, slave of AbuseBot, 1 sources)",
            "skip Dormant: start = false",
        ]
    );
}

#[tokio::test]
async fn test_launch_and_shutdown_without_server() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bots(closed_port()).as_bytes()).unwrap();
    let store = Arc::new(ConfigStore::open(file.path()).unwrap());

    let mut launcher = Launcher::new(store, Arc::new(MediaWikiConnector::new()));
    assert_eq!(launcher.launch().unwrap(), 2);
    assert_eq!(launcher.len(), 2);
    assert_eq!(launcher.registry().nicks(), ["AbuseBot", "AbuseBot2"]);

    let registry = launcher.registry().clone();
    tokio::time::timeout(Duration::from_secs(15), launcher.shutdown())
        .await
        .expect("Shutdown finishes");
    assert!(registry.is_empty());
}

#[test]
fn test_launch_refuses_invalid_instance() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let contents = bots(closed_port()).replace("{user} tripped", "{nobody} tripped");
    file.write_all(contents.as_bytes()).unwrap();
    let store = Arc::new(ConfigStore::open(file.path()).unwrap());

    let mut launcher = Launcher::new(store, Arc::new(MediaWikiConnector::new()));
    let err = launcher.launch().unwrap_err();
    assert!(matches!(err.kind(), FilterwatchErrorKind::Config(_)), "{}", err);
    assert!(launcher.is_empty());
    assert!(launcher.registry().is_empty());
}
