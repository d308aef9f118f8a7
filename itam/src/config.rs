//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `ITAM_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `ITAM_` override YAML values
//! 3. **DATABASE_URL** - Special case: overrides `database.url` if set
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `ITAM_AUTH__SECURITY__JWT_EXPIRY=1h` sets the `auth.security.jwt_expiry` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use itam::config::{Args, Config};
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
//! - **Database**: `database.url`, `database.pool` - SQLite connection settings
//! - **Admin User**: `admin_username`, `admin_password` - Initial administrator ensured on startup
//! - **Security**: `secret_key`, `auth.security` - Token signing secret, algorithm and lifetime
//! - **Passwords**: `auth.password` - Length rules and Argon2 cost parameters
//! - **Files**: `files.upload_dir`, `files.max_file_size` - Deployable package file storage
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! ITAM_PORT=8080
//! DATABASE_URL="sqlite://itam.db?mode=rwc"
//! ITAM_SECRET_KEY="change-me"
//! ITAM_AUTH__ALLOW_REGISTRATION=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

use crate::errors::Error;
use crate::types::Tier;

/// Shortest token lifetime accepted by [`Config::validate`].
pub const MIN_JWT_EXPIRY: Duration = Duration::from_secs(60);
/// Longest token lifetime accepted by [`Config::validate`].
pub const MAX_JWT_EXPIRY: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "ITAM_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// This is the root configuration structure loaded from YAML and environment variables.
/// All fields have sensible defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Populated from the `DATABASE_URL` environment variable; folded into `database.url` on load
    #[serde(skip_serializing)]
    pub database_url: Option<String>,
    /// Secret used to sign bearer tokens. Required.
    pub secret_key: Option<String>,
    /// Username of the administrator ensured on startup
    pub admin_username: String,
    /// Password of the administrator ensured on startup
    pub admin_password: Option<String>,
    /// Authentication and token settings
    pub auth: AuthConfig,
    /// Package file storage
    pub files: FilesConfig,
}

/// SQLite connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://itam.db?mode=rwc`
    pub url: String,
    pub pool: PoolSettings,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://itam.db?mode=rwc".to_string(),
            pool: PoolSettings::default(),
        }
    }
}

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
    /// Production defaults: balanced for reliability and resource usage
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

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Allow unauthenticated users to create their own account via `/auth/register`
    pub allow_registration: bool,
    /// Tier given to self-registered users
    pub default_tier: Tier,
    pub security: SecurityConfig,
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            allow_registration: false,
            default_tier: Tier::VIEWER,
            security: SecurityConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Signing algorithm. Only the HMAC family is accepted.
    pub jwt_algorithm: Algorithm,
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_algorithm: Algorithm::HS256,
            jwt_expiry: Duration::from_secs(30 * 60),
        }
    }
}

/// Password validation rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB, secure for production)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations (default: 2, secure for production)
    pub argon2_iterations: u32,
    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 64,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Storage for deployable package files.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
    /// Maximum upload size in bytes
    pub max_file_size: u64,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./deploy"),
            max_file_size: 512 * 1024 * 1024, // 512 MB
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database: DatabaseConfig::default(),
            database_url: None,
            secret_key: None,
            admin_username: "admin".to_string(),
            admin_password: None,
            auth: AuthConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if database_url is set, use it (preserving pool settings)
        if let Some(url) = config.database_url.take() {
            config.database.url = url;
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(Error::Internal {
                operation: "Config validation: secret_key is not configured. \
                     Please set ITAM_SECRET_KEY environment variable or add secret_key to config file."
                    .to_string(),
            });
        }

        let security = &self.auth.security;
        if !matches!(security.jwt_algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: jwt_algorithm {:?} is not supported; use HS256, HS384 or HS512",
                    security.jwt_algorithm
                ),
            });
        }

        if security.jwt_expiry < MIN_JWT_EXPIRY || security.jwt_expiry > MAX_JWT_EXPIRY {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: jwt_expiry ({}) must be between {} and {}",
                    humantime_serde::re::humantime::format_duration(security.jwt_expiry),
                    humantime_serde::re::humantime::format_duration(MIN_JWT_EXPIRY),
                    humantime_serde::re::humantime::format_duration(MAX_JWT_EXPIRY)
                ),
            });
        }

        let password = &self.auth.password;
        if password.min_length < 1 {
            return Err(Error::Internal {
                operation: "Config validation: password min_length must be at least 1".to_string(),
            });
        }
        if password.min_length > password.max_length {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: Invalid password configuration: min_length ({}) cannot be greater than max_length ({})",
                    password.min_length, password.max_length
                ),
            });
        }

        if self.auth.default_tier.0 < 0 {
            return Err(Error::Internal {
                operation: format!("Config validation: default_tier ({}) cannot be negative", self.auth.default_tier.0),
            });
        }

        if self.files.max_file_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: files.max_file_size must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values.
            // ITAM_CONFIG names the file itself and is not a config key.
            .merge(Env::prefixed("ITAM_").ignore(&["CONFIG"]).split("__"))
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

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_from_minimal_file() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\n")?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 8000);
            assert_eq!(config.admin_username, "admin");
            assert_eq!(config.auth.security.jwt_algorithm, Algorithm::HS256);
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(30 * 60));
            assert_eq!(config.auth.default_tier, Tier::VIEWER);
            assert!(!config.auth.allow_registration);
            assert_eq!(config.files.upload_dir, PathBuf::from("./deploy"));

            Ok(())
        });
    }

    #[test]
    fn test_nested_yaml_values() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
auth:
  allow_registration: true
  default_tier: 2
  security:
    jwt_algorithm: HS512
    jwt_expiry: 2h
  password:
    min_length: 12
files:
  upload_dir: /srv/packages
  max_file_size: 1024
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert!(config.auth.allow_registration);
            assert_eq!(config.auth.default_tier, Tier::OPERATOR);
            assert_eq!(config.auth.security.jwt_algorithm, Algorithm::HS512);
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(2 * 60 * 60));
            assert_eq!(config.auth.password.min_length, 12);
            // Unset siblings keep their defaults
            assert_eq!(config.auth.password.max_length, 64);
            assert_eq!(config.files.upload_dir, PathBuf::from("/srv/packages"));
            assert_eq!(config.files.max_file_size, 1024);

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\nport: 9000\n")?;

            jail.set_env("ITAM_HOST", "127.0.0.1");
            jail.set_env("ITAM_PORT", "8080");
            jail.set_env("ITAM_AUTH__SECURITY__JWT_EXPIRY", "15m");

            let config = Config::load(&args("test.yaml"))?;

            // Env vars should override
            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.auth.security.jwt_expiry, Duration::from_secs(15 * 60));
            assert_eq!(config.bind_address(), "127.0.0.1:8080");

            Ok(())
        });
    }

    #[test]
    fn test_config_path_env_var_is_not_a_key() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.yaml", "secret_key: hello\nport: 9100\n")?;

            jail.set_env("ITAM_CONFIG", "custom.yaml");

            let config = Config::load(&args("custom.yaml"))?;
            assert_eq!(config.port, 9100);

            Ok(())
        });
    }

    #[test]
    fn test_database_url_env_var() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
secret_key: hello
database:
  url: sqlite://from-file.db
  pool:
    max_connections: 3
"#,
            )?;

            jail.set_env("DATABASE_URL", "sqlite://from-env.db");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.database.url, "sqlite://from-env.db");
            assert_eq!(config.database.pool.max_connections, 3);
            assert!(config.database_url.is_none());

            Ok(())
        });
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8000\n")?;

            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("secret_key"));

            jail.create_file("blank.yaml", "secret_key: '  '\n")?;
            assert!(Config::load(&args("blank.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_unknown_fields_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "secret_key: hello\nsecret_kye: typo\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_rejects_non_hmac_algorithm() {
        let mut config = Config {
            secret_key: Some("hello".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.auth.security.jwt_algorithm = Algorithm::RS256;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jwt_algorithm"));
    }

    #[test]
    fn test_rejects_expiry_out_of_bounds() {
        let mut config = Config {
            secret_key: Some("hello".to_string()),
            ..Default::default()
        };

        config.auth.security.jwt_expiry = Duration::from_secs(59);
        assert!(config.validate().is_err());

        config.auth.security.jwt_expiry = MAX_JWT_EXPIRY + Duration::from_secs(1);
        assert!(config.validate().is_err());

        config.auth.security.jwt_expiry = MIN_JWT_EXPIRY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inconsistent_limits() {
        let valid = Config {
            secret_key: Some("hello".to_string()),
            ..Default::default()
        };

        let mut config = valid.clone();
        config.auth.password.min_length = 100;
        assert!(config.validate().is_err());

        let mut config = valid.clone();
        config.auth.password.min_length = 0;
        assert!(config.validate().is_err());

        let mut config = valid.clone();
        config.auth.default_tier = Tier(-1);
        assert!(config.validate().is_err());

        let mut config = valid;
        config.files.max_file_size = 0;
        assert!(config.validate().is_err());
    }
}
