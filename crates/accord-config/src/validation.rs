// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express. All failures are
//! collected rather than stopping at the first one.

use crate::diagnostic::ConfigError;
use crate::model::AccordConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &AccordConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let path = config.storage.database_path.trim();
    if path.is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    } else if path == ":memory:" || path.starts_with("file::memory:") {
        // Readers open their own connections and would see a different database.
        errors.push(ConfigError::Validation {
            message: "storage.database_path must be a file, in-memory databases are not supported"
                .to_string(),
        });
    }

    if config.storage.read_connections == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.read_connections must be at least 1".to_string(),
        });
    }

    let level = config.log.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
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

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&AccordConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = AccordConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path must not be empty"));
    }

    #[test]
    fn memory_database_fails_validation() {
        let mut config = AccordConfig::default();
        config.storage.database_path = ":memory:".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "in-memory"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = AccordConfig::default();
        config.storage.database_path = String::new();
        config.storage.read_connections = 0;
        config.log.level = "loud".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(has_message(&errors, "read_connections"));
        assert!(has_message(&errors, "log.level `loud`"));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = AccordConfig::default();
        config.log.level = "DEBUG".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_readers_from_toml_fails_validation() {
        let toml_str = r#"
[storage]
database_path = "accord.db"
read_connections = 0
"#;
        let config: AccordConfig = toml::from_str(toml_str).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(has_message(&errors, "read_connections"));
    }
}
