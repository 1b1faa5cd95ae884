//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.encoding.quality < 1 || self.encoding.quality > 100 {
            return Err(ConfigError::ValidationError(
                "encoding.quality must be between 1 and 100".into(),
            ));
        }
        if self.encoding.effort > 6 {
            return Err(ConfigError::ValidationError(
                "encoding.effort must be between 0 and 6".into(),
            ));
        }
        if self.encoding.codec_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "encoding.codec_concurrency must be > 0".into(),
            ));
        }
        if self.server.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "server.max_upload_mb must be > 0".into(),
            ));
        }
        if self.server.fetch_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "server.fetch_timeout_ms must be > 0".into(),
            ));
        }
        if self.server.rate_limit.max_requests == 0 {
            return Err(ConfigError::ValidationError(
                "server.rate_limit.max_requests must be > 0".into(),
            ));
        }
        if self.server.rate_limit.window_ms == 0 {
            return Err(ConfigError::ValidationError(
                "server.rate_limit.window_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_quality() {
        let mut config = Config::default();
        config.encoding.quality = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quality"));

        config.encoding.quality = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_effort() {
        let mut config = Config::default();
        config.encoding.effort = 7;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("effort"));
    }

    #[test]
    fn test_validate_rejects_zero_codec_concurrency() {
        let mut config = Config::default();
        config.encoding.codec_concurrency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("codec_concurrency"));
    }

    #[test]
    fn test_validate_rejects_zero_rate_limit_window() {
        let mut config = Config::default();
        config.server.rate_limit.window_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_ms"));
    }
}
