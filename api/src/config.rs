use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_upload_mb = match lookup("MAX_UPLOAD_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_MB must be a whole number, got {:?}", raw))?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };
        let max_upload_bytes = max_upload_mb
            .checked_mul(1024 * 1024)
            .with_context(|| format!("MAX_UPLOAD_MB is too large, got {}", max_upload_mb))?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.max_upload_bytes, 200 * 1024 * 1024);
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = ServerConfig::from_lookup(|key| match key {
            "BIND_ADDR" => Some("127.0.0.1:8501".to_string()),
            "MAX_UPLOAD_MB" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8501");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);

        let err = ServerConfig::from_lookup(|key| (key == "MAX_UPLOAD_MB").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_MB"));
    }

    #[test]
    fn upload_limit_that_overflows_is_an_error() {
        let huge = usize::MAX.to_string();
        let err = ServerConfig::from_lookup(|key| (key == "MAX_UPLOAD_MB").then(|| huge.clone()))
            .unwrap_err();
        assert!(err.to_string().contains("MAX_UPLOAD_MB is too large"));
    }
}
