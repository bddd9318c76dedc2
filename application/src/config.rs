//! [`Config`]-related definitions.

use std::{env, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use smart_default::SmartDefault;

use crate::session;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Session configuration.
    pub session: Session,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Name of the environment variable holding the session secret.
    pub const SESSION_SECRET_VAR: &'static str = "SESSION_SECRET";

    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - taking the session secret from [`Config::SESSION_SECRET_VAR`]
    ///   (if set);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .set_override_option(
                "session.secret",
                env::var(Self::SESSION_SECRET_VAR).ok(),
            )?
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(3000)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Session configuration.
#[derive(Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Session {
    /// Secret signing session cookies.
    pub secret: Option<SecretString>,

    /// Lifetime of a session.
    #[default(time::Duration::from_secs(60 * 60 * 24 * 30))]
    #[serde(with = "humantime_serde")]
    pub max_age: time::Duration,

    /// Indicator whether the session cookie is restricted to HTTPS.
    #[default(true)]
    pub secure: bool,
}

impl Session {
    /// Builds a [`service::Config`] signing sessions with the configured
    /// secret.
    ///
    /// # Errors
    ///
    /// If no secret is configured.
    pub fn service_config(&self) -> Result<service::Config, MissingSecret> {
        let secret = self
            .secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .ok_or(MissingSecret)?;
        Ok(service::Config::new(
            secret.expose_secret().as_bytes(),
            self.max_age,
        ))
    }
}

impl From<&Session> for session::Settings {
    fn from(value: &Session) -> Self {
        Self {
            max_age: value.max_age,
            secure: value.secure,
        }
    }
}

/// Error of a [`Session`] configured without a secret.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`{}` must be set", Config::SESSION_SECRET_VAR)]
pub struct MissingSecret;

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::{env, time::Duration};

    use secrecy::SecretString;

    use super::{Config, Session};

    #[test]
    fn defaults_to_thirty_days() {
        let session = Config::default().session;

        assert_eq!(session.max_age, Duration::from_secs(2_592_000));
        assert!(session.secure);
        assert!(session.secret.is_none());
    }

    #[test]
    fn loads_from_environment_only() {
        env::set_var(Config::SESSION_SECRET_VAR, "s3cr3t");
        let config = Config::new("there/is/no/config.toml");
        env::remove_var(Config::SESSION_SECRET_VAR);

        let config = config.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.postgres.port, 5432);
        assert_eq!(config.session.max_age, Duration::from_secs(2_592_000));
        assert!(config.session.service_config().is_ok());
    }

    #[test]
    fn requires_secret() {
        assert!(Session::default().service_config().is_err());

        let session = Session {
            secret: Some(SecretString::from(String::new())),
            ..Session::default()
        };
        assert!(session.service_config().is_err());

        let session = Session {
            secret: Some(SecretString::from("s3cr3t".to_owned())),
            ..Session::default()
        };
        assert!(session.service_config().is_ok());
    }
}
