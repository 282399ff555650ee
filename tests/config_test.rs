//! Loading client configuration from disk.

use std::io::Write;
use std::time::Duration;
use strictly_letters::ClientConfig;
use strictly_wordgrid::{Language, PlayerId};

#[test]
fn test_from_file_reads_every_section() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
player_id = "p7"
display_name = "Vera"
authority_url = "http://game.local:8080"
events_url = "ws://game.local:8080/events"
language = "russian"
administrator = true
board_size = 15

[retry]
max_attempts = 5
initial_backoff_ms = 50
max_backoff_ms = 400
request_timeout_ms = 1500

[reconnect]
max_attempts = 2
backoff_ms = 100
"#
    )
    .unwrap();

    let config = ClientConfig::from_file(file.path()).unwrap();
    assert_eq!(config.player_id(), &PlayerId::new("p7"));
    assert_eq!(config.display_name(), "Vera");
    assert_eq!(*config.language(), Language::Russian);
    assert_eq!(*config.board_size(), 15);

    let retry = config.retry_policy();
    assert_eq!(retry.max_attempts, 5);
    assert_eq!(retry.initial_backoff, Duration::from_millis(50));
    assert_eq!(retry.max_backoff, Duration::from_millis(400));
    assert!(!retry.retry_non_idempotent);
    assert_eq!(config.request_timeout(), Duration::from_millis(1500));

    let reconnect = config.reconnect_policy();
    assert_eq!(reconnect.max_attempts, 2);
    assert_eq!(reconnect.backoff, Duration::from_millis(100));

    let state = config.initial_state();
    assert_eq!(state.board().size(), 15);
    assert!(state.is_administrator());
}

#[test]
fn test_missing_file_names_the_failure() {
    let dir = tempfile::tempdir().unwrap();
    let err = ClientConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
    assert!(err.to_string().starts_with("Config error:"));
}

#[test]
fn test_zero_board_size_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "player_id = \"p1\"\ndisplay_name = \"Ann\"\nboard_size = 0").unwrap();
    let err = ClientConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("board_size"));
}
