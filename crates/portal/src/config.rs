//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_BASE_URL` - Public URL for the portal
//! - `PORTAL_REGISTER_URL` - Partner registration endpoint
//! - `PORTAL_LOGIN_URL` - Partner login endpoint
//! - `PORTAL_PARTNERS_URL` - Partner list / approve / reject endpoint
//! - `PORTAL_LEADS_URL` - Partner leads and statistics endpoint
//! - `PORTAL_CREATE_LEAD_URL` - Lead creation endpoint
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `PORTAL_ADMIN_LEADS_URL` - Admin lead list/update endpoint (default: `PORTAL_PARTNERS_URL`)
//! - `PORTAL_BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 30)
//! - `PORTAL_RATE_LIMIT` - Rate limit login and registration per IP (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the portal
    pub base_url: String,
    /// Hosted backend endpoints
    pub backend: BackendConfig,
    /// Rate limit the login and registration endpoints
    pub rate_limit: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Sentry error event sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Hosted backend endpoints.
///
/// Each operation is a separate hosted function with its own URL.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub register_url: Url,
    pub login_url: Url,
    pub partners_url: Url,
    pub leads_url: Url,
    pub create_lead_url: Url,
    pub admin_leads_url: Url,
    /// Timeout applied to every backend request
    pub timeout: Duration,
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let host = env.parsed_or_default("PORTAL_HOST", "127.0.0.1")?;
        let port = env.parsed_or_default("PORTAL_PORT", "3000")?;
        let base_url = env.get_required("PORTAL_BASE_URL")?;
        let backend = BackendConfig::from_env(&env)?;
        let rate_limit = env.flag_or_default("PORTAL_RATE_LIMIT", true)?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            rate_limit,
            sentry_dsn: env.get_optional("SENTRY_DSN"),
            sentry_environment: env.get_optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the portal is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let partners_url = env.get_endpoint("PORTAL_PARTNERS_URL")?;
        let admin_leads_url = match env.get_optional("PORTAL_ADMIN_LEADS_URL") {
            Some(raw) => parse_endpoint("PORTAL_ADMIN_LEADS_URL", &raw)?,
            None => partners_url.clone(),
        };
        let timeout_secs: u64 = env.parsed_or_default("PORTAL_BACKEND_TIMEOUT_SECS", "30")?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PORTAL_BACKEND_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            register_url: env.get_endpoint("PORTAL_REGISTER_URL")?,
            login_url: env.get_endpoint("PORTAL_LOGIN_URL")?,
            partners_url,
            leads_url: env.get_endpoint("PORTAL_LEADS_URL")?,
            create_lead_url: env.get_endpoint("PORTAL_CREATE_LEAD_URL")?,
            admin_leads_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; blank values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn get_required(&self, key: &str) -> Result<String, ConfigError> {
        self.get_optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parsed_or_default<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn flag_or_default(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get_optional(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got '{other}'"),
            )),
        }
    }

    fn get_endpoint(&self, key: &str) -> Result<Url, ConfigError> {
        parse_endpoint(key, &self.get_required(key)?)
    }
}

/// Parse a backend endpoint URL, accepting only http and https.
fn parse_endpoint(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{scheme}'"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn required() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("PORTAL_BASE_URL", "https://partners.example.com"),
            ("PORTAL_REGISTER_URL", "https://functions.example.com/register"),
            ("PORTAL_LOGIN_URL", "https://functions.example.com/login"),
            ("PORTAL_PARTNERS_URL", "https://functions.example.com/partners"),
            ("PORTAL_LEADS_URL", "https://functions.example.com/leads"),
            ("PORTAL_CREATE_LEAD_URL", "https://functions.example.com/create-lead"),
        ])
    }

    fn load(vars: &HashMap<&str, &str>) -> Result<PortalConfig, ConfigError> {
        PortalConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&required()).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert!(config.rate_limit);
        assert!(config.is_secure());
        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(config.backend.admin_leads_url, config.backend.partners_url);
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_required_endpoint() {
        let mut vars = required();
        vars.remove("PORTAL_LOGIN_URL");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PORTAL_LOGIN_URL"));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = required();
        vars.insert("PORTAL_BASE_URL", "  ");
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::MissingEnvVar(_)
        ));
    }

    #[test]
    fn test_endpoint_scheme_is_checked() {
        let mut vars = required();
        vars.insert("PORTAL_LEADS_URL", "ftp://functions.example.com/leads");
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PORTAL_LEADS_URL"));
    }

    #[test]
    fn test_overrides() {
        let mut vars = required();
        vars.insert("PORTAL_HOST", "0.0.0.0");
        vars.insert("PORTAL_PORT", "8080");
        vars.insert("PORTAL_RATE_LIMIT", "off");
        vars.insert("PORTAL_BACKEND_TIMEOUT_SECS", "5");
        vars.insert("PORTAL_ADMIN_LEADS_URL", "http://localhost:9000/admin");
        let config = load(&vars).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert!(!config.rate_limit);
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert_eq!(
            config.backend.admin_leads_url.as_str(),
            "http://localhost:9000/admin"
        );
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("PORTAL_PORT", "not-a-port"),
            ("PORTAL_RATE_LIMIT", "maybe"),
            ("PORTAL_BACKEND_TIMEOUT_SECS", "0"),
        ] {
            let mut vars = required();
            vars.insert(key, value);
            assert!(
                matches!(load(&vars), Err(ConfigError::InvalidEnvVar(ref k, _)) if k == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_http_base_url_is_not_secure() {
        let mut vars = required();
        vars.insert("PORTAL_BASE_URL", "http://localhost:3000");
        assert!(!load(&vars).unwrap().is_secure());
    }
}
