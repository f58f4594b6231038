// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid IP addresses, non-empty paths, and value ranges.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ParlorConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParlorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let temperature = config.chat.temperature;
    if !(0.0..=1.0).contains(&temperature) {
        fail(format!(
            "chat.temperature must be between 0 and 1, got {temperature}"
        ));
    }

    if config.chat.request_timeout_secs == 0 {
        fail("chat.request_timeout_secs must be at least 1".to_string());
    }

    if config.chat.max_tool_rounds == 0 {
        fail("chat.max_tool_rounds must be at least 1".to_string());
    }

    if config.chat.system_prompt.trim().is_empty() {
        fail("chat.system_prompt must not be empty".to_string());
    }

    if config.tools.timeout_secs == 0 {
        fail("tools.timeout_secs must be at least 1".to_string());
    }

    if config.anthropic.max_tokens == 0 {
        fail("anthropic.max_tokens must be at least 1".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let mut seen_tokens = HashSet::new();
    for (i, entry) in config.auth.tokens.iter().enumerate() {
        if entry.token.trim().is_empty() {
            fail(format!("auth.tokens[{i}].token must not be empty"));
        } else if !seen_tokens.insert(entry.token.as_str()) {
            fail(format!("auth.tokens[{i}] duplicates an earlier token"));
        }
        if entry.user_id.trim().is_empty() {
            fail(format!("auth.tokens[{i}].user_id must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ApiTokenConfig;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = ParlorConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ParlorConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn temperature_out_of_range_fails_validation() {
        let mut config = ParlorConfig::default();
        config.chat.temperature = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "chat.temperature"));
    }

    #[test]
    fn zero_limits_fail_validation() {
        let mut config = ParlorConfig::default();
        config.chat.request_timeout_secs = 0;
        config.chat.max_tool_rounds = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "request_timeout_secs"));
        assert!(has_error(&errors, "max_tool_rounds"));
    }

    #[test]
    fn duplicate_tokens_fail_validation() {
        let mut config = ParlorConfig::default();
        config.auth.tokens = vec![
            ApiTokenConfig {
                token: "same".into(),
                user_id: "alice".into(),
            },
            ApiTokenConfig {
                token: "same".into(),
                user_id: "bob".into(),
            },
        ];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "duplicates"));
    }

    #[test]
    fn bad_host_fails_validation() {
        let mut config = ParlorConfig::default();
        config.server.host = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "server.host"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ParlorConfig::default();
        config.storage.database_path = " ".to_string();
        config.chat.temperature = -0.1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
