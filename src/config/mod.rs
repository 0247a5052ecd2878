//! Runtime configuration loaded from the process environment.
//!
//! A `.env` file in the working directory is read first when present.
//! Recognised keys:
//!
//! - `DATABASE_URL` (required): `PostgreSQL` connection URL. TLS is always
//!   requested; an `sslmode` weaker than `require` is replaced.
//! - `WEB_ORIGIN`: `*` (default) or a comma-separated list of allowed
//!   browser origins.
//! - `HOST` / `PORT`: listen address, `127.0.0.1:5000` by default.
//! - `DATABASE_POOL_SIZE`: maximum pooled connections, `10` by default.

use thiserror::Error;
use url::Url;

/// Environment key holding the database URL.
pub const DATABASE_URL_KEY: &str = "DATABASE_URL";
/// Environment key holding the allowed browser origins.
pub const WEB_ORIGIN_KEY: &str = "WEB_ORIGIN";
/// Environment key holding the listen host.
pub const HOST_KEY: &str = "HOST";
/// Environment key holding the listen port.
pub const PORT_KEY: &str = "PORT";
/// Environment key holding the connection pool size.
pub const POOL_SIZE_KEY: &str = "DATABASE_POOL_SIZE";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_POOL_SIZE: u32 = 10;

const SSL_MODE: &str = "sslmode";
const SECURE_SSL_MODES: [&str; 3] = ["require", "verify-ca", "verify-full"];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// A variable is set to an unusable value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Offending variable.
        key: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The `.env` file exists but could not be read.
    #[error("failed to load .env file: {0}")]
    EnvFile(#[source] dotenvy::Error),
}

/// Browser origins allowed to call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebOrigin {
    /// Any origin.
    Any,
    /// Only the listed origins.
    Exact(Vec<String>),
}

impl WebOrigin {
    /// Parses the `WEB_ORIGIN` value.
    ///
    /// `*`, an empty value, or a list without entries all allow any origin.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect();
        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            Self::Any
        } else {
            Self::Exact(origins)
        }
    }
}

/// Validated service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    database_url: String,
    web_origin: WebOrigin,
    host: String,
    port: u16,
    pool_size: u32,
}

impl Config {
    /// Loads `.env` (if present) and then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvFile`] when `.env` exists but is malformed,
    /// or any error from [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(ConfigError::EnvFile(err)),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` is absent
    /// and [`ConfigError::InvalidValue`] for unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_url = read(DATABASE_URL_KEY).ok_or(ConfigError::MissingEnvVar(DATABASE_URL_KEY))?;
        let database_url = require_tls(raw_url.trim())?;
        let web_origin = read(WEB_ORIGIN_KEY).map_or(WebOrigin::Any, |raw| WebOrigin::parse(&raw));
        let host = read(HOST_KEY).map_or_else(|| DEFAULT_HOST.to_owned(), |raw| raw.trim().to_owned());
        let port = read(PORT_KEY).map_or(Ok(DEFAULT_PORT), |raw| parse_number(PORT_KEY, &raw))?;
        let pool_size = read(POOL_SIZE_KEY)
            .map_or(Ok(DEFAULT_POOL_SIZE), |raw| parse_number(POOL_SIZE_KEY, &raw))?;
        if pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: POOL_SIZE_KEY,
                message: "must be at least 1".to_owned(),
            });
        }

        Ok(Self {
            database_url,
            web_origin,
            host,
            port,
            pool_size,
        })
    }

    /// Returns the database URL with TLS enforced.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Returns the allowed browser origins.
    #[must_use]
    pub const fn web_origin(&self) -> &WebOrigin {
        &self.web_origin
    }

    /// Returns the `host:port` listen address.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the maximum number of pooled database connections.
    #[must_use]
    pub const fn pool_size(&self) -> u32 {
        self.pool_size
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|err| ConfigError::InvalidValue {
            key,
            message: err.to_string(),
        })
}

/// Forces `sslmode=require` unless the URL already demands verified TLS.
fn require_tls(raw: &str) -> Result<String, ConfigError> {
    let mut url = Url::parse(raw).map_err(|err| ConfigError::InvalidValue {
        key: DATABASE_URL_KEY,
        message: err.to_string(),
    })?;

    let already_secure = url
        .query_pairs()
        .any(|(key, value)| key == SSL_MODE && SECURE_SSL_MODES.contains(&value.as_ref()));
    if already_secure {
        return Ok(raw.to_owned());
    }

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != SSL_MODE)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SSL_MODE, "require");
    Ok(url.into())
}
