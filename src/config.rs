use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Process settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_pool_size: u32,
    pub cart_cookie_secret: String,
    /// `dev` turns off the `Secure` attribute on the cart cookie.
    pub platform: String,
    pub cart_timeout: Duration,
    pub cart_sweep_interval: Duration,
    pub max_cart_quantity: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| vars.get(name).filter(|v| !v.is_empty()).cloned();

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let cart_cookie_secret =
            get("CART_COOKIE_SECRET").ok_or(ConfigError::Missing("CART_COOKIE_SECRET"))?;

        let timeout_minutes: u64 = parse_or(&vars, "CART_TIMEOUT_MINUTES", 60)?;
        let sweep_secs: u64 = parse_or(&vars, "CART_SWEEP_INTERVAL_SECS", 600)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CART_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }
        let max_cart_quantity: i32 = parse_or(&vars, "MAX_CART_QUANTITY", 100)?;
        if max_cart_quantity <= 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_CART_QUANTITY",
                value: max_cart_quantity.to_string(),
            });
        }

        Ok(Config {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&vars, "PORT", 8080)?,
            db_pool_size: parse_or(&vars, "DB_POOL_SIZE", 10)?,
            cart_cookie_secret,
            platform: get("PLATFORM").unwrap_or_else(|| "prod".to_string()),
            cart_timeout: Duration::from_secs(timeout_minutes * 60),
            cart_sweep_interval: Duration::from_secs(sweep_secs),
            max_cart_quantity,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.platform != "dev"
    }
}

fn parse_or<T: std::str::FromStr>(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(name).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("CART_COOKIE_SECRET", "s3cret"),
        ]
    }

    #[test]
    fn defaults_apply_when_optional_vars_absent() {
        let cfg = Config::from_vars(vars(&required())).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cart_timeout, Duration::from_secs(3600));
        assert_eq!(cfg.cart_sweep_interval, Duration::from_secs(600));
        assert_eq!(cfg.max_cart_quantity, 100);
        assert!(cfg.secure_cookies());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_vars(vars(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CART_COOKIE_SECRET"));
    }

    #[test]
    fn empty_database_url_counts_as_missing() {
        let mut v = required();
        v[0] = ("DATABASE_URL", "");
        let err = Config::from_vars(vars(&v)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut v = required();
        v.extend([
            ("PORT", "9000"),
            ("PLATFORM", "dev"),
            ("CART_TIMEOUT_MINUTES", "15"),
            ("MAX_CART_QUANTITY", "5"),
        ]);
        let cfg = Config::from_vars(vars(&v)).unwrap();
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.cart_timeout, Duration::from_secs(900));
        assert_eq!(cfg.max_cart_quantity, 5);
        assert!(!cfg.secure_cookies());
    }

    #[test]
    fn garbage_number_is_rejected() {
        let mut v = required();
        v.push(("PORT", "eighty"));
        assert_eq!(
            Config::from_vars(vars(&v)).unwrap_err(),
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let mut v = required();
        v.push(("CART_SWEEP_INTERVAL_SECS", "0"));
        assert!(matches!(
            Config::from_vars(vars(&v)),
            Err(ConfigError::Invalid { name: "CART_SWEEP_INTERVAL_SECS", .. })
        ));
    }
}
