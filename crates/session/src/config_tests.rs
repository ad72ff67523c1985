use super::*;

#[test]
fn test_defaults() {
    let config = SessionConfig::default();
    assert_eq!(config.engine.path, None);
    assert!(config.engine.command().is_none());
    assert_eq!(config.clock.initial_seconds, 600);
    assert_eq!(config.clock.increment_seconds, 0);

    let tc = config.time_control();
    assert_eq!(tc.initial_ms, 600_000);
    assert_eq!(tc.increment_ms, 0);
    assert_eq!(tc.max_step_ms, 1_000);
}

#[test]
fn test_empty_document_is_default() {
    assert_eq!(
        SessionConfig::from_toml_str("").unwrap(),
        SessionConfig::default()
    );
}

#[test]
fn test_partial_document_keeps_other_defaults() {
    let config = SessionConfig::from_toml_str(
        r#"
        [clock]
        initial_seconds = 180
        increment_seconds = 2

        [engine]
        path = "/usr/bin/stockfish"
        args = ["--threads", "1"]
        "#,
    )
    .unwrap();

    let tc = config.time_control();
    assert_eq!(tc.initial_ms, 180_000);
    assert_eq!(tc.increment_ms, 2_000);
    assert_eq!(tc.max_step_ms, 1_000);
    assert_eq!(config.tick_interval_ms, 50);

    let cmd = config.engine.command().unwrap();
    assert_eq!(cmd.program, PathBuf::from("/usr/bin/stockfish"));
    assert_eq!(cmd.args, vec!["--threads", "1"]);
    assert_eq!(cmd.handshake_timeout, Duration::from_secs(10));
}

#[test]
fn test_empty_engine_path_means_no_engine() {
    let config = SessionConfig::from_toml_str("[engine]\npath = \"\"\n").unwrap();
    assert!(config.engine.command().is_none());
}

#[test]
fn test_invalid_document() {
    let err = SessionConfig::from_toml_str("[clock]\ninitial_seconds = \"ten\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_load_missing_file() {
    let err = SessionConfig::load(Path::new("/nonexistent/session.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_toml_round_trip() {
    let mut config = SessionConfig::default();
    config.engine.path = Some(PathBuf::from("engine"));
    config.tick_interval_ms = 20;
    let text = toml::to_string(&config).unwrap();
    assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
}
