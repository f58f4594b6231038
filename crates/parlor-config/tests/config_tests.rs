// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parlor configuration system.

use parlor_config::diagnostic::ConfigError;
use parlor_config::model::{DefaultEncoding, ParlorConfig};
use parlor_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_parlor_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[[auth.tokens]]
token = "tok-alice"
user_id = "alice"

[anthropic]
api_key = "sk-ant-123"
default_model = "claude-sonnet-4-20250514"

[chat]
temperature = 0.2
request_timeout_secs = 30
max_tool_rounds = 3

[tools]
enabled = false

[tools.weather]
api_key = "owm-key"

[tools.stock]
api_key = "av-key"
base_url = "http://localhost:9000"

[storage]
database_path = "/tmp/test.db"
wal_mode = false

[gateway]
default_encoding = "plain"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.log_level, "debug");
    assert_eq!(config.auth.tokens.len(), 1);
    assert_eq!(config.auth.tokens[0].user_id, "alice");
    assert_eq!(config.anthropic.api_key.as_deref(), Some("sk-ant-123"));
    assert!((config.chat.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(config.chat.request_timeout_secs, 30);
    assert_eq!(config.chat.max_tool_rounds, 3);
    assert!(!config.tools.enabled);
    assert_eq!(config.tools.weather.api_key.as_deref(), Some("owm-key"));
    assert_eq!(config.tools.stock.base_url, "http://localhost:9000");
    assert_eq!(config.storage.database_path, "/tmp/test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.gateway.default_encoding, DefaultEncoding::Plain);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_optional_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.log_level, "info");
    assert!(config.auth.tokens.is_empty());
    assert!(config.anthropic.api_key.is_none());
    assert_eq!(config.anthropic.default_model, "claude-sonnet-4-20250514");
    assert_eq!(config.chat.request_timeout_secs, 60);
    assert_eq!(config.chat.max_tool_rounds, 5);
    assert!(config.tools.enabled);
    assert!(config.tools.weather.api_key.is_none());
    assert!(config.storage.wal_mode);
    assert_eq!(config.gateway.default_encoding, DefaultEncoding::Framed);
}

/// Unknown field in [chat] produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_in_chat_suggests_correction() {
    let toml = r#"
[chat]
temprature = 0.5
"#;

    let errors = load_and_validate_str(toml).expect_err("should produce errors");
    let has_unknown_key = errors.iter().any(|e| {
        matches!(e, ConfigError::UnknownKey { key, suggestion, valid_keys, .. } if {
            key == "temprature"
                && suggestion.as_deref() == Some("temperature")
                && valid_keys.contains("max_tool_rounds")
        })
    });
    assert!(
        has_unknown_key,
        "should have UnknownKey error for 'temprature', got: {errors:?}"
    );
}

/// Unknown field in a nested tool section is rejected.
#[test]
fn unknown_field_in_nested_tool_section_is_rejected() {
    let toml = r#"
[tools.weather]
api_kee = "abc"
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("api_kee"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Unexpected top-level section is rejected by deny_unknown_fields.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[telegram]
bot_token = "x"
"#;

    let err = load_config_from_str(toml).expect_err("unknown top-level section should be rejected");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("telegram"),
        "error should mention unknown field, got: {err_str}"
    );
}

/// Invalid type (string where number expected) produces clear message.
#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject invalid type");
    assert!(
        errors.iter().any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port"))
            || matches!(e, ConfigError::Other(msg) if msg.contains("port"))),
        "error should mention the port key, got: {errors:?}"
    );
}

/// Dotted overrides (as produced by the env provider) reach nested sections.
#[test]
fn dotted_override_reaches_nested_section() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: ParlorConfig = Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::string("[tools.stock]\napi_key = \"from-toml\"\n"))
        .merge(("tools.stock.api_key", "from-env"))
        .merge(("chat.max_tool_rounds", 2))
        .extract()
        .expect("should merge env override");

    assert_eq!(config.tools.stock.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.chat.max_tool_rounds, 2);
}

/// Missing config files are silently skipped (Figment's Toml::file() behavior).
#[test]
fn missing_config_files_silently_skipped() {
    use figment::{
        providers::{Format, Serialized, Toml},
        Figment,
    };

    let config: ParlorConfig = Figment::new()
        .merge(Serialized::defaults(ParlorConfig::default()))
        .merge(Toml::file("/nonexistent/path/parlor.toml"))
        .extract()
        .expect("missing file should be silently skipped");

    assert_eq!(config.server.port, 3000);
}

/// Validation errors surface through load_and_validate_str.
#[test]
fn validation_catches_out_of_range_temperature() {
    let toml = r#"
[chat]
temperature = 2.0
"#;

    let errors = load_and_validate_str(toml).expect_err("temperature 2.0 should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("chat.temperature"))
    }));
}

/// Validation catches an auth token without a user id.
#[test]
fn validation_catches_blank_user_id() {
    let toml = r#"
[[auth.tokens]]
token = "tok"
user_id = " "
"#;

    let errors = load_and_validate_str(toml).expect_err("blank user id should fail");
    assert!(errors.iter().any(|e| {
        matches!(e, ConfigError::Validation { message } if message.contains("user_id"))
    }));
}

/// ConfigError can be rendered using miette's graphical handler.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "temprature".to_string(),
        section: "chat".to_string(),
        suggestion: Some("temperature".to_string()),
        valid_keys: "system_prompt, temperature".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some(), "should have diagnostic code");
    let help = error.help().expect("should have help text").to_string();
    assert!(help.contains("did you mean `temperature`"), "got: {help}");

    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    handler
        .render_report(&mut buf, &error)
        .expect("should render without error");
    assert!(buf.contains("temprature"));
}

/// A well-formed file loads and validates.
#[test]
fn load_and_validate_valid_toml() {
    let toml = r#"
[server]
port = 4000
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should validate");
    assert_eq!(config.server.port, 4000);
}

/// Files on disk load through load_and_validate_path.
#[test]
fn load_and_validate_path_reads_file() {
    let dir = std::env::temp_dir().join(format!("parlor-config-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("parlor.toml");
    std::fs::write(&path, "[storage]\ndatabase_path = \"/tmp/from-file.db\"\n").unwrap();

    let config = parlor_config::load_and_validate_path(&path).expect("file should load");
    assert_eq!(config.storage.database_path, "/tmp/from-file.db");

    std::fs::remove_dir_all(&dir).unwrap();
}
