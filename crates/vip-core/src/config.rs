//! ============================================================================
//! Configuration - Process settings read from the environment
//! ============================================================================
//! Appwrite settings are optional here; the store reports what is missing
//! on first use. The binary loads `config.env` / `.env` before calling
//! `AppConfig::from_env()`.
//! ============================================================================

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::fraud::DEFAULT_BLOCKED_EMAIL_DOMAIN;
use crate::store::AppwriteConfig;

pub const DEFAULT_PRODUCTS_CSV: &str = "products.csv";

/// Which document store backs a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Appwrite,
    Local,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "appwrite" => Ok(StoreBackend::Appwrite),
            "local" => Ok(StoreBackend::Local),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Appwrite => f.write_str("appwrite"),
            StoreBackend::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub appwrite: AppwriteConfig,
    pub products_csv: PathBuf,
    pub store_backend: StoreBackend,
    /// Local store file; None means the default under the home directory
    pub db_path: Option<PathBuf>,
    /// Always starts with `@tempmail.com`
    pub blocked_email_domains: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            appwrite: AppwriteConfig::default(),
            products_csv: PathBuf::from(DEFAULT_PRODUCTS_CSV),
            store_backend: StoreBackend::default(),
            db_path: None,
            blocked_email_domains: vec![DEFAULT_BLOCKED_EMAIL_DOMAIN.to_string()],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let store_backend = match get("VIP_STORE") {
            Some(value) => value.parse()?,
            None => defaults.store_backend,
        };

        // Extra domains add to the default, never replace it
        let mut blocked_email_domains = defaults.blocked_email_domains;
        if let Some(list) = get("VIP_BLOCKED_EMAIL_DOMAINS") {
            for domain in list.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                if !blocked_email_domains.iter().any(|d| d == domain) {
                    blocked_email_domains.push(domain.to_string());
                }
            }
        }

        Ok(Self {
            appwrite: AppwriteConfig {
                endpoint: get("APPWRITE_ENDPOINT"),
                project_id: get("APPWRITE_PROJECT_ID"),
                api_key: get("APPWRITE_API_KEY"),
                database_id: get("APPWRITE_DATABASE_ID"),
            },
            products_csv: get("VIP_PRODUCTS_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.products_csv),
            store_backend,
            db_path: get("VIP_DB_PATH").map(PathBuf::from),
            blocked_email_domains,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.products_csv, PathBuf::from("products.csv"));
        assert_eq!(config.blocked_email_domains, vec!["@tempmail.com"]);
        assert_eq!(config.appwrite.endpoint, None);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APPWRITE_ENDPOINT", "https://cloud.example.com/v1"),
            ("APPWRITE_PROJECT_ID", "proj"),
            ("APPWRITE_API_KEY", "secret"),
            ("APPWRITE_DATABASE_ID", "vipdb"),
            ("VIP_PRODUCTS_CSV", "/data/catalog.csv"),
            ("VIP_STORE", "Local"),
            ("VIP_DB_PATH", "/tmp/vip.redb"),
            ("VIP_BLOCKED_EMAIL_DOMAINS", "@tempmail.com, @mailinator.com ,"),
        ]))
        .unwrap();

        assert_eq!(config.appwrite.project_id.as_deref(), Some("proj"));
        assert_eq!(config.appwrite.database_id.as_deref(), Some("vipdb"));
        assert_eq!(config.products_csv, PathBuf::from("/data/catalog.csv"));
        assert_eq!(config.store_backend, StoreBackend::Local);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/vip.redb")));
        assert_eq!(
            config.blocked_email_domains,
            vec!["@tempmail.com", "@mailinator.com"]
        );
    }

    #[test]
    fn test_extra_domains_keep_default() {
        let config = AppConfig::from_lookup(lookup(&[(
            "VIP_BLOCKED_EMAIL_DOMAINS",
            "@mailinator.com",
        )]))
        .unwrap();
        assert_eq!(
            config.blocked_email_domains,
            vec!["@tempmail.com", "@mailinator.com"]
        );

        let config = AppConfig::from_lookup(lookup(&[("VIP_BLOCKED_EMAIL_DOMAINS", ",")])).unwrap();
        assert_eq!(config.blocked_email_domains, vec!["@tempmail.com"]);
    }

    #[test]
    fn test_empty_values_are_unset() {
        let config = AppConfig::from_lookup(lookup(&[("APPWRITE_API_KEY", ""), ("VIP_STORE", " ")])).unwrap();
        assert_eq!(config.appwrite.api_key, None);
        assert_eq!(config.store_backend, StoreBackend::Appwrite);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let result = AppConfig::from_lookup(lookup(&[("VIP_STORE", "mongo")]));
        assert!(matches!(result, Err(ConfigError::UnknownBackend(v)) if v == "mongo"));
    }
}
