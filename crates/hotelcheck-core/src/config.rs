use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files; useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Nothing is strictly required here: the embeddings API key is optional at
/// startup so the server can answer health checks without credentials. Its
/// absence is reported by the embedding client when a call is attempted.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let non_empty = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let value = or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let parse_positive_usize = |var: &str, raw: &str| -> Result<usize, ConfigError> {
        let value = raw
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be greater than zero".to_string()));
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("HOTELCHECK_ENV", "development"))?;
    let bind_addr = parse_addr("HOTELCHECK_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("HOTELCHECK_LOG_LEVEL", "info");
    let catalog_path = non_empty("HOTELCHECK_CATALOG_PATH").map(PathBuf::from);

    let embedding_api_url = or_default("OPENAI_API_URL", "https://api.openai.com/v1")
        .trim_end_matches('/')
        .to_string();
    let embedding_api_key = non_empty("OPENAI_API_KEY");
    let embedding_model = or_default("EMBEDDING_MODEL", "text-embedding-ada-002");
    let embedding_dimensions = non_empty("EMBEDDING_DIMENSIONS")
        .map(|raw| parse_positive_usize("EMBEDDING_DIMENSIONS", &raw))
        .transpose()?;
    let embedding_timeout_secs = parse_positive_u64("HOTELCHECK_EMBEDDING_TIMEOUT_SECS", "30")?;
    let embedding_max_input_chars = parse_positive_usize(
        "HOTELCHECK_EMBEDDING_MAX_INPUT_CHARS",
        &or_default("HOTELCHECK_EMBEDDING_MAX_INPUT_CHARS", "8000"),
    )?;
    let embedding_max_retries = parse_u32("HOTELCHECK_EMBEDDING_MAX_RETRIES", "2")?;
    let embedding_retry_backoff_ms = or_default("HOTELCHECK_EMBEDDING_RETRY_BACKOFF_MS", "500")
        .parse::<u64>()
        .map_err(|e| invalid("HOTELCHECK_EMBEDDING_RETRY_BACKOFF_MS", e.to_string()))?;

    let similarity_threshold = parse_threshold(&or_default("SIMILARITY_THRESHOLD", "0.75"))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        embedding_api_url,
        embedding_api_key,
        embedding_model,
        embedding_dimensions,
        embedding_timeout_secs,
        embedding_max_input_chars,
        embedding_max_retries,
        embedding_retry_backoff_ms,
        similarity_threshold,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values so that typos
/// like `producton` fail loudly instead of silently running as development.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "HOTELCHECK_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

/// Cosine similarity lives in `[-1, 1]`; a threshold outside that range would
/// flag everything or nothing.
fn parse_threshold(raw: &str) -> Result<f32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "SIMILARITY_THRESHOLD".to_string(),
        reason,
    };
    let value = raw.trim().parse::<f32>().map_err(|e| invalid(e.to_string()))?;
    if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
        return Err(invalid(format!("must be within [-1, 1]; got {value}")));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
