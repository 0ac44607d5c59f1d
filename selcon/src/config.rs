//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `SELCON_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `SELCON_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `SELCON_COURSES__DEFAULT_CAPACITY=30` sets the `courses.default_capacity` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use selcon::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port`
//! - **Database**: `database.url`, `database.pool`, `database.busy_timeout`
//! - **Security**: `secret_key` (signs session tokens), `auth.security.cors`
//! - **Authentication**: `auth.allow_registration`, `auth.password`, `auth.session`
//! - **Courses**: `courses.default_capacity`
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! SELCON_PORT=8080
//! SELCON_SECRET_KEY="change-me"
//! DATABASE_URL="sqlite:///var/lib/selcon/selcon.db"
//! SELCON_AUTH__ALLOW_REGISTRATION=false
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "SELCON_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have defaults defined in the `Default` implementation, except `secret_key`
/// which must be supplied.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from `DATABASE_URL`; folded into `database.url` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// SQLite database settings
    pub database: DatabaseConfig,
    /// Secret key for signing session tokens (required)
    pub secret_key: Option<String>,
    /// Registration, password rules, session cookie and CORS
    pub auth: AuthConfig,
    /// Course defaults
    pub courses: CoursesConfig,
}

/// Individual pool configuration with all SQLx parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

/// SQLite database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://selcon.db`. The file is created if missing.
    pub url: String,
    /// Connection pool settings
    pub pool: PoolSettings,
    /// How long a connection waits for the write lock before failing with SQLITE_BUSY
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://selcon.db".to_string(),
            pool: PoolSettings::default(),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Allow new users to self-register
    pub allow_registration: bool,
    /// Password validation rules
    pub password: PasswordConfig,
    /// Session cookie configuration
    pub session: SessionConfig,
    /// Security settings (JWT, CORS)
    pub security: SecurityConfig,
}

/// Session cookie configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Session timeout duration (cookie Max-Age)
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Cookie name for session token
    pub cookie_name: String,
    /// Set Secure flag on cookies (HTTPS only)
    pub cookie_secure: bool,
    /// SameSite cookie attribute ("strict", "lax", or "none")
    pub cookie_same_site: String,
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations
    pub argon2_iterations: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

/// Security configuration for JWT and CORS.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://courses.example.edu`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

/// Course defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoursesConfig {
    /// Capacity used when a teacher creates a course without one
    pub default_capacity: i64,
}

impl Default for CoursesConfig {
    fn default() -> Self {
        Self { default_capacity: 50 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            secret_key: None,
            auth: AuthConfig::default(),
            courses: CoursesConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_registration: true,
            password: PasswordConfig::default(),
            session: SessionConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(24 * 60 * 60), // 24 hours
            cookie_name: "selcon_session".to_string(),
            cookie_secure: true,
            cookie_same_site: "strict".to_string(),
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            // Argon2id RFC recommendations
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(24 * 60 * 60), // 24 hours
            cors: CorsConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            // Development frontend
            allowed_origins: Url::parse("http://localhost:3000").map(CorsOrigin::Url).into_iter().collect(),
            allow_credentials: true,
            max_age: Some(3600),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL wins over database.url, pool settings are kept
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(str::is_empty) {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                     Please set SELCON_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        let password = &self.auth.password;
        if password.min_length > password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    password.min_length, password.max_length
                ),
            });
        }

        if password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: Invalid password configuration: min_length must be at least 1".to_string(),
            });
        }

        // Validate JWT expiry duration is reasonable
        if self.auth.security.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too short (minimum 5 minutes)".to_string(),
            });
        }

        if self.auth.security.jwt_expiry.as_secs() > 86400 * 30 {
            return Err(Error::Internal {
                operation: "Config validation: JWT expiry duration is too long (maximum 30 days)".to_string(),
            });
        }

        if self.auth.security.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin.".to_string(),
            });
        }

        let has_wildcard = self
            .auth
            .security
            .cors
            .allowed_origins
            .iter()
            .any(|origin| matches!(origin, CorsOrigin::Wildcard));
        if has_wildcard && self.auth.security.cors.allow_credentials {
            return Err(Error::Internal {
                operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                    .to_string(),
            });
        }

        if self.courses.default_capacity <= 0 {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: courses.default_capacity must be positive (got {})",
                    self.courses.default_capacity
                ),
            });
        }

        let pool = &self.database.pool;
        if pool.max_connections == 0 {
            return Err(Error::Internal {
                operation: "Config validation: database.pool.max_connections must be at least 1".to_string(),
            });
        }

        if pool.min_connections > pool.max_connections {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: database.pool.min_connections ({}) cannot be greater than max_connections ({})",
                    pool.min_connections, pool.max_connections
                ),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("SELCON_").ignore(&["config"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn valid_config() -> Config {
        Config {
            secret_key: Some("test-secret-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
courses:
  default_capacity: 30
"#,
            )?;

            jail.set_env("SELCON_HOST", "127.0.0.1");
            jail.set_env("SELCON_PORT", "8080");
            // The CLI's own variable must not leak into the config
            jail.set_env("SELCON_CONFIG", "test.yaml");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);

            // YAML values should be preserved
            assert_eq!(config.courses.default_capacity, 30);

            Ok(())
        });
    }

    #[test]
    fn test_nested_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\n")?;
            jail.set_env("SELCON_AUTH__ALLOW_REGISTRATION", "false");
            jail.set_env("SELCON_COURSES__DEFAULT_CAPACITY", "12");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;
            assert!(!config.auth.allow_registration);
            assert_eq!(config.courses.default_capacity, 12);

            Ok(())
        });
    }

    #[test]
    fn test_auth_config_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: "test-secret-key-for-testing"
auth:
  allow_registration: true
  password:
    min_length: 12
  session:
    cookie_name: "course_session"
    cookie_secure: false
  security:
    jwt_expiry: "2h"
    cors:
      allowed_origins:
        - "https://courses.example.edu"
"#,
            )?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;

            assert!(config.auth.allow_registration);
            assert_eq!(config.auth.password.min_length, 12);
            assert_eq!(config.auth.password.max_length, 64); // still default
            assert_eq!(config.auth.session.cookie_name, "course_session");
            assert!(!config.auth.session.cookie_secure);
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(2 * 60 * 60));
            assert!(matches!(
                &config.auth.security.cors.allowed_origins[..],
                [CorsOrigin::Url(url)] if url.as_str() == "https://courses.example.edu/"
            ));

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
database:
  url: "sqlite://from-yaml.db"
  busy_timeout: "10s"
  pool:
    max_connections: 4
"#,
            )?;
            jail.set_env("DATABASE_URL", "sqlite://from-env.db");

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            let config = Config::load(&args)?;
            assert_eq!(config.database.url, "sqlite://from-env.db");
            assert!(config.database_url.is_none());
            assert_eq!(config.database.pool.max_connections, 4);
            assert_eq!(config.database.busy_timeout, Duration::from_secs(10));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\nadmin_email: root@example.com\n")?;

            let args = Args {
                config: "test.yaml".to_string(),
                validate: false,
            };

            assert!(Config::load(&args).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_config_validation_missing_secret() {
        let config = Config::default();

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("secret_key is not configured"));
    }

    #[test]
    fn test_config_validation_invalid_password_length() {
        let mut config = valid_config();
        config.auth.password.min_length = 10;
        config.auth.password.max_length = 5;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("min_length"));
    }

    #[test]
    fn test_config_validation_jwt_expiry_bounds() {
        let mut config = valid_config();
        config.auth.security.jwt_expiry = Duration::from_secs(60);
        assert!(config.validate().unwrap_err().to_string().contains("too short"));

        config.auth.security.jwt_expiry = Duration::from_secs(86400 * 31);
        assert!(config.validate().unwrap_err().to_string().contains("too long"));
    }

    #[test]
    fn test_config_validation_wildcard_with_credentials() {
        let mut config = valid_config();
        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Wildcard];
        config.auth.security.cors.allow_credentials = true;
        assert!(config.validate().unwrap_err().to_string().contains("wildcard"));

        config.auth.security.cors.allow_credentials = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_default_capacity() {
        let mut config = valid_config();
        config.courses.default_capacity = 0;
        assert!(config.validate().unwrap_err().to_string().contains("default_capacity"));
    }

    #[test]
    fn test_config_validation_pool_bounds() {
        let mut config = valid_config();
        config.database.pool.min_connections = 5;
        config.database.pool.max_connections = 2;
        assert!(config.validate().unwrap_err().to_string().contains("min_connections"));
    }

    #[test]
    fn test_config_validation_valid_config() {
        assert!(valid_config().validate().is_ok());
    }
}
