use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Timeouts are not 0
/// - Every configured tracker has credentials and an http(s) base URL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.http.search_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.search_timeout_secs cannot be 0".to_string(),
        ));
    }
    if config.http.validate_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.validate_timeout_secs cannot be 0".to_string(),
        ));
    }

    if let Some(hdb) = &config.trackers.hdb {
        require_non_empty("trackers.hdb.username", &hdb.username)?;
        require_non_empty("trackers.hdb.passkey", &hdb.passkey)?;
        require_http_url("trackers.hdb.url", &hdb.url)?;
        require_http_url("trackers.hdb.image_url", &hdb.image_url)?;
    }

    if let Some(fl) = &config.trackers.filelist {
        require_non_empty("trackers.filelist.username", &fl.username)?;
        require_non_empty("trackers.filelist.password", &fl.password)?;
        require_http_url("trackers.filelist.url", &fl.url)?;
        if let Some(service) = &fl.description_service {
            require_http_url("trackers.filelist.description_service.url", &service.url)?;
        }
    }

    Ok(())
}

fn require_non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!("{key} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "{key} must be an http(s) URL, got '{value}'"
        )));
    }
    Ok(())
}
