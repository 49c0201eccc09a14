use std::env;
use std::path::PathBuf;

use crate::errors::{QuotationError, Result};

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;
const DATABASE: &str = "QuoteDesk";
const SETTINGS_DIR: &str = "./data/settings";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub jwt_secret: String,
    pub settings_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| QuotationError::validation("PORT", format!("'{}' is not a port", raw)))?,
            None => PORT,
        };
        let mongodb_uri = get("MONGODB_URI")
            .ok_or_else(|| QuotationError::validation("MONGODB_URI", "MONGODB_URI must be set"))?;
        let jwt_secret = get("JWT_SECRET")
            .ok_or_else(|| QuotationError::validation("JWT_SECRET", "JWT_SECRET must be set"))?;

        Ok(AppConfig {
            host: get("HOST").unwrap_or_else(|| HOST.to_string()),
            port,
            mongodb_uri,
            mongodb_database: get("MONGODB_DATABASE").unwrap_or_else(|| DATABASE.to_string()),
            jwt_secret,
            settings_dir: get("SETTINGS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(SETTINGS_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.mongodb_database, "QuoteDesk");
        assert_eq!(config.settings_dir, PathBuf::from("./data/settings"));
    }

    #[test]
    fn test_missing_mongo_uri_is_an_error() {
        let result = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "secret")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let result = AppConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("JWT_SECRET", "secret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(QuotationError::Validation { .. })));
    }
}
