use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_key: Option<String>,
    pub resend_url: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub payment_bucket: String,
    pub static_dir: PathBuf,
    pub allowed_origin: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| read_secret(key).or_else(|| var(key)))
    }

    /// Secrets and plain variables come through the same lookup, so tests can
    /// hand in a map instead of touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: try_load(&lookup, "RUST_PORT", "1111")?,
            supabase_url: require(&lookup, "SUPABASE_URL")?,
            supabase_anon_key: require(&lookup, "SUPABASE_ANON_KEY")?,
            supabase_service_key: optional(&lookup, "SUPABASE_SERVICE_ROLE_KEY"),
            resend_url: try_load(&lookup, "RESEND_URL", "https://api.resend.com")?,
            resend_api_key: optional(&lookup, "RESEND_API_KEY"),
            email_from: try_load(&lookup, "EMAIL_FROM", "Zayathon <noreply@zayathon.dev>")?,
            payment_bucket: try_load(&lookup, "PAYMENT_BUCKET", "payments")?,
            static_dir: try_load(&lookup, "STATIC_DIR", "dist")?,
            allowed_origin: try_load(&lookup, "ALLOWED_ORIGIN", "*")?,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    if value.is_none() {
        warn!("{key} not set");
    }

    value
}

fn require<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::Missing(key.to_string()))
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path).map(|s| s.trim().to_string()).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_ANON_KEY", " anon "),
        ]))
        .unwrap();

        assert_eq!(config.port, 1111);
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.supabase_service_key, None);
        assert_eq!(config.resend_api_key, None);
        assert_eq!(config.resend_url, "https://api.resend.com");
        assert_eq!(config.payment_bucket, "payments");
        assert_eq!(config.static_dir, PathBuf::from("dist"));
        assert_eq!(config.allowed_origin, "*");
    }

    #[test]
    fn test_missing_required() {
        assert_eq!(
            Config::from_lookup(lookup(&[("SUPABASE_URL", "https://x")])).unwrap_err(),
            ConfigError::Missing("SUPABASE_ANON_KEY".to_string())
        );
    }

    #[test]
    fn test_invalid_port() {
        let error = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://x"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("RUST_PORT", "eighty"),
        ]))
        .unwrap_err();

        assert!(matches!(error, ConfigError::Invalid { key, .. } if key == "RUST_PORT"));
    }
}
