// SPDX-FileCopyrightText: 2026 Warden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::WardenConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &WardenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.courier.batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "courier.batch_size must be at least 1".to_string(),
        });
    }

    if let Some(id) = &config.tenant.default_id
        && uuid::Uuid::parse_str(id).is_err()
    {
        errors.push(ConfigError::Validation {
            message: format!("tenant.default_id `{id}` is not a valid UUID"),
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
        assert!(validate_config(&WardenConfig::default()).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = WardenConfig::default();
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "database_path"));
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let mut config = WardenConfig::default();
        config.courier.batch_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "batch_size"));
    }

    #[test]
    fn malformed_default_tenant_fails_validation() {
        let mut config = WardenConfig::default();
        config.tenant.default_id = Some("tenant-one".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "tenant.default_id"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = WardenConfig::default();
        config.log.level = "loud".to_string();
        config.courier.batch_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn uuid_default_tenant_passes() {
        let mut config = WardenConfig::default();
        config.tenant.default_id = Some("6f1d2c1e-0c55-4a0f-9a53-6b7d3b0f4c11".to_string());
        assert!(validate_config(&config).is_ok());
    }
}
