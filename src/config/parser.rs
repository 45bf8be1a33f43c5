//! Configuration parser for loading configuration files.
//!
//! Loads YAML from disk, applies environment overrides and loads `.env`.

use crate::error::{ConfigError, LifecycleError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::LifecycleConfig;

/// Environment variable overriding `remote.endpoint`.
pub const ENDPOINT_ENV: &str = "GLUE_LIFECYCLE_ENDPOINT";

/// Environment variable overriding `remote.request_timeout_secs`.
pub const REQUEST_TIMEOUT_ENV: &str = "GLUE_LIFECYCLE_REQUEST_TIMEOUT_SECS";

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving `.env`.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path used to look up `.env`.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<LifecycleConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(LifecycleError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            LifecycleError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string. Blank input is an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<LifecycleConfig> {
        debug!("Parsing YAML configuration");

        if content.trim().is_empty() {
            return Ok(LifecycleConfig::default());
        }

        let config: LifecycleConfig = serde_yaml::from_str(content).map_err(|e| {
            LifecycleError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location: source.map(|p| p.display().to_string()),
            })
        })?;

        debug!(
            "Parsed configuration with {} profile override(s)",
            config.profiles.len()
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override is not a valid number.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<LifecycleConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout override is not a number.
    pub fn apply_env_overrides(config: &mut LifecycleConfig) -> Result<()> {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            debug!("Overriding remote.endpoint from environment");
            config.remote.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var(REQUEST_TIMEOUT_ENV) {
            debug!("Overriding remote.request_timeout_secs from environment");
            config.remote.request_timeout_secs = timeout.trim().parse().map_err(|_| {
                ConfigError::validation(
                    format!("{REQUEST_TIMEOUT_ENV} must be a whole number of seconds, got '{timeout}'"),
                    "remote.request_timeout_secs",
                )
            })?;
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                LifecycleError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["glue-lifecycle.yaml", "glue-lifecycle.yml"];

/// Finds the configuration file in `start_dir` or its ancestors.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(LifecycleError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::ResourceKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_blank_config() {
        let config = ConfigParser::new().parse_yaml("  \n", None).expect("blank is valid");
        assert_eq!(config, LifecycleConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r"
remote:
  endpoint: https://glue.eu-west-1.amazonaws.com
  request_timeout_secs: 10

profiles:
  trigger:
    delete:
      wait:
        pending: [DELETING]
        timeout_secs: 600
  crawler:
    create:
      retry:
        max_duration_secs: 120
        rules:
          - code: InvalidInputException
            message_contains: Service is unable to assume role
";
        let config = ConfigParser::new().parse_yaml(yaml, None).expect("valid config");

        assert_eq!(config.remote.endpoint, "https://glue.eu-west-1.amazonaws.com");
        assert_eq!(config.remote.request_timeout_secs, 10);
        assert_eq!(config.profiles.len(), 2);

        let trigger = &config.profiles[&ResourceKind::Trigger];
        let wait = trigger
            .delete
            .as_ref()
            .and_then(|op| op.wait.as_ref())
            .expect("delete wait");
        assert!(wait.target.is_empty());
        assert_eq!(wait.timeout_secs, 600);
    }

    #[test]
    fn test_parse_error_carries_location() {
        let err = ConfigParser::new()
            .parse_yaml("remote: [", Some(Path::new("glue-lifecycle.yaml")))
            .unwrap_err();

        match err {
            LifecycleError::Config(ConfigError::ParseError { location, .. }) => {
                assert_eq!(location.as_deref(), Some("glue-lifecycle.yaml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().expect("temp dir");
        let err = ConfigParser::new()
            .load_file(dir.path().join("absent.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Config(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().expect("temp dir");
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).expect("create dirs");
        let config_path = dir.path().join("glue-lifecycle.yml");
        fs::write(&config_path, "remote: {}\n").expect("write config");

        let found = find_config_file(&nested).expect("config found");
        assert_eq!(found, config_path);

        let config = ConfigParser::new().load_file(&found).expect("loads");
        assert_eq!(config.remote, super::super::RemoteConfig::default());
    }
}
