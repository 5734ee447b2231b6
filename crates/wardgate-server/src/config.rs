//! Server configuration.
//!
//! Values are layered, lowest priority first:
//!
//! 1. Defaults of each section
//! 2. The TOML file passed with `--config`
//! 3. `WARDGATE_*` environment variables

use std::path::{Path, PathBuf};

use serde::Deserialize;
use wardgate_auth::{AuthConfig, ResolverConfig};
use wardgate_clinic::SummarizerConfig;
use wardgate_db::DbConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub auth: AuthConfig,
    pub resolver: ResolverConfig,
    pub summarizer: SummarizerConfig,
    /// Seconds between sweeps of expired sessions.
    pub session_cleanup_interval_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Invalid value for {var}: {reason}")]
    InvalidEnvVar { var: &'static str, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl ServerConfig {
    /// Defaults, the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Apply `WARDGATE_*` overrides read through `lookup`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let string_vars: [(&str, &mut String); 7] = [
            ("WARDGATE_DB_URL", &mut self.database.url),
            ("WARDGATE_DB_NAMESPACE", &mut self.database.namespace),
            ("WARDGATE_DB_DATABASE", &mut self.database.database),
            ("WARDGATE_DB_USERNAME", &mut self.database.username),
            ("WARDGATE_DB_PASSWORD", &mut self.database.password),
            ("WARDGATE_JWT_PRIVATE_KEY", &mut self.auth.jwt_private_key_pem),
            ("WARDGATE_JWT_PUBLIC_KEY", &mut self.auth.jwt_public_key_pem),
        ];
        for (var, field) in string_vars {
            if let Some(val) = lookup(var) {
                *field = val;
            }
        }

        if let Some(val) = lookup("WARDGATE_PEPPER") {
            self.auth.pepper = Some(val).filter(|p| !p.is_empty());
        }
        if let Some(val) = lookup("WARDGATE_SUMMARIZER_API_KEY") {
            self.summarizer.api_key = Some(val).filter(|k| !k.is_empty());
        }
        if let Some(val) = lookup("WARDGATE_SIGN_OUT_TIMEOUT_SECS") {
            let secs: f64 = val.parse().map_err(|_| ConfigError::InvalidEnvVar {
                var: "WARDGATE_SIGN_OUT_TIMEOUT_SECS",
                reason: format!("expected seconds, got {val:?}"),
            })?;
            if !secs.is_finite() || secs < 0.0 {
                return Err(ConfigError::InvalidEnvVar {
                    var: "WARDGATE_SIGN_OUT_TIMEOUT_SECS",
                    reason: format!("expected non-negative seconds, got {val:?}"),
                });
            }
            self.resolver.sign_out_timeout = std::time::Duration::from_secs_f64(secs);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_private_key_pem.trim().is_empty() {
            return Err(ConfigError::Missing("auth.jwt_private_key_pem"));
        }
        if self.auth.jwt_public_key_pem.trim().is_empty() {
            return Err(ConfigError::Missing("auth.jwt_public_key_pem"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ServerConfig::parse("").unwrap();
        assert_eq!(config.database.namespace, "wardgate");
        assert_eq!(config.auth.access_token_lifetime_secs, 900);
        assert_eq!(config.resolver.sign_out_timeout, Duration::from_secs(5));
        assert!(config.summarizer.api_key.is_none());
    }

    #[test]
    fn parses_sections() {
        let config = ServerConfig::parse(
            r#"
session_cleanup_interval_secs = 600

[database]
url = "db.internal:8000"

[auth]
jwt_issuer = "st-mary"
min_password_length = 16

[resolver]
sign_out_timeout = 1.5

[summarizer]
model = "gemini-2.0-flash"
"#,
        )
        .unwrap();
        assert_eq!(config.database.url, "db.internal:8000");
        assert_eq!(config.database.database, "clinic");
        assert_eq!(config.auth.jwt_issuer, "st-mary");
        assert_eq!(config.auth.min_password_length, 16);
        assert_eq!(config.resolver.sign_out_timeout, Duration::from_millis(1500));
        assert_eq!(config.summarizer.model, "gemini-2.0-flash");
        assert_eq!(config.session_cleanup_interval_secs, Some(600));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = ServerConfig::parse("[database\nurl = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WARDGATE_DB_URL", "env-host:9000"),
            ("WARDGATE_PEPPER", "pepper"),
            ("WARDGATE_SUMMARIZER_API_KEY", ""),
            ("WARDGATE_SIGN_OUT_TIMEOUT_SECS", "0.25"),
        ]);
        let mut config = ServerConfig::parse(
            r#"
[database]
url = "file-host:8000"

[summarizer]
api_key = "from-file"
"#,
        )
        .unwrap();
        config
            .apply_env(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database.url, "env-host:9000");
        assert_eq!(config.auth.pepper.as_deref(), Some("pepper"));
        assert!(config.summarizer.api_key.is_none());
        assert_eq!(config.resolver.sign_out_timeout, Duration::from_millis(250));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(|var| (var == "WARDGATE_SIGN_OUT_TIMEOUT_SECS").then(|| "soon".into()))
            .unwrap_err();
        assert!(err.to_string().contains("WARDGATE_SIGN_OUT_TIMEOUT_SECS"));
    }

    #[test]
    fn signing_keys_are_required() {
        let err = ServerConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("auth.jwt_private_key_pem")));
    }
}
