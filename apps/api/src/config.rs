use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Base URL used to build public document links. Defaults to the
    /// virtual-hosted AWS URL for `s3_bucket` in `aws_region`.
    pub s3_public_base_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Maximum silence between two progress events before a stream is
    /// considered stalled.
    pub stream_read_timeout: Duration,
    /// How many progress events a pipeline worker may run ahead of its reader.
    pub event_channel_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_bucket = require_env("S3_BUCKET")?;
        let aws_region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_public_base_url = std::env::var("S3_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{s3_bucket}.s3.{aws_region}.amazonaws.com"));

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_region,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            s3_public_base_url,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            stream_read_timeout: read_timeout(
                parse_env("STREAM_READ_TIMEOUT_SECS", 60u64)
                    .context("STREAM_READ_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            event_channel_capacity: parse_env("EVENT_CHANNEL_CAPACITY", 10usize)
                .context("EVENT_CHANNEL_CAPACITY must be a positive integer")?
                .max(1),
        })
    }
}

/// Never below one second.
fn read_timeout(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_falls_back_to_default_when_unset() {
        let value: u64 = parse_env("TAILOR_TEST_UNSET_VARIABLE", 60).unwrap();
        assert_eq!(value, 60);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("TAILOR_TEST_GARBAGE_CAPACITY", "ten");
        let result: Result<usize> = parse_env("TAILOR_TEST_GARBAGE_CAPACITY", 10);
        assert!(result.is_err());
    }

    #[test]
    fn test_read_timeout_is_at_least_one_second() {
        assert_eq!(read_timeout(0), Duration::from_secs(1));
        assert_eq!(read_timeout(60), Duration::from_secs(60));
    }
}
