use crate::config::types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_seed_url(&config.seed_url)?;

    if config.max_pages < 1 || config.max_pages > 1_000_000 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and 1000000, got {}",
            config.max_pages
        )));
    }

    if config.concurrent_requests < 1 || config.concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "concurrent_requests must be between 1 and 64, got {}",
            config.concurrent_requests
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.pause_poll_interval_ms < 10 || config.pause_poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "pause_poll_interval_ms must be between 10 and 60000, got {}ms",
            config.pause_poll_interval_ms
        )));
    }

    if config.request_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "request_delay_ms must be <= 60000, got {}ms",
            config.request_delay_ms
        )));
    }

    if let Some(proxy) = &config.proxy_url {
        validate_proxy_url(proxy)?;
    }

    Ok(())
}

/// Validates the proxy URL: must parse and use http or https
fn validate_proxy_url(proxy: &str) -> Result<(), ConfigError> {
    let url = Url::parse(proxy)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy URL '{}': {}", proxy, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Proxy URL '{}' must use http or https",
            proxy
        )));
    }

    Ok(())
}

/// Validates the seed URL: must parse, use http(s) and carry a host
fn validate_seed_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    // Must be usable as an HTTP header value
    if config.name.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "user agent name must not contain control characters, got {:?}",
            config.name
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
