// SPDX-FileCopyrightText: 2026 Wren Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every violation instead of stopping at the first one.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::WrenConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &WrenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.max_iterations == 0 {
        errors.push(ConfigError::validation(
            "agent.max_iterations must be at least 1",
        ));
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.to_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "agent.log_level `{}` is not one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if config.anthropic.max_tokens == 0 {
        errors.push(ConfigError::validation(
            "anthropic.max_tokens must be at least 1",
        ));
    }

    if config.channels.join_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "channels.join_timeout_secs must be at least 1",
        ));
    }

    if config.channels.monitor_interval_secs == 0 {
        errors.push(ConfigError::validation(
            "channels.monitor_interval_secs must be at least 1",
        ));
    }

    let mut seen = HashSet::new();
    for name in &config.channels.exclude {
        if !seen.insert(name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "channel `{name}` is listed twice in channels.exclude"
            )));
        }
    }

    if config.tools.shell_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "tools.shell_timeout_secs must be at least 1",
        ));
    }

    if let Some(endpoint) = &config.tools.search_endpoint
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "tools.search_endpoint `{endpoint}` must be an http(s) URL"
        )));
    }

    if config.compaction.min_messages < 2 {
        errors.push(ConfigError::validation(
            "compaction.min_messages must be at least 2",
        ));
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

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&WrenConfig::default()).is_ok());
    }

    #[test]
    fn zero_iterations_fails_validation() {
        let mut config = WrenConfig::default();
        config.agent.max_iterations = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("max_iterations"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WrenConfig::default();
        config.agent.max_iterations = 0;
        config.storage.database_path = "  ".into();
        config.channels.exclude = vec!["cli".into(), "cli".into()];
        config.tools.search_endpoint = Some("ftp://nope".into());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn unknown_log_level_rejected() {
        let mut config = WrenConfig::default();
        config.agent.log_level = "loud".into();
        assert!(validate_config(&config).is_err());
    }
}
