//! Configuration for the session manager.

use std::env::VarError;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SessionError};

/// Upper bound on the session lifetime, in seconds.
///
/// Larger configured values are capped to this when the manager is built.
pub const MAX_LIFETIME_SECS: u64 = 5;

/// Default session lifetime, in seconds.
pub const DEFAULT_LIFETIME_SECS: u64 = 5;

/// Environment variable overriding [`SessionConfig::lifetime_secs`].
pub const LIFETIME_ENV_VAR: &str = "KEEPER_SESSION_LIFETIME_SECS";

/// Configuration for the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a session lives after creation. Also the GC interval.
    /// Zero disables expiry and garbage collection.
    pub lifetime_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: DEFAULT_LIFETIME_SECS,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session lifetime.
    pub fn with_lifetime_secs(mut self, secs: u64) -> Self {
        self.lifetime_secs = secs;
        self
    }

    /// Lifetime after applying [`MAX_LIFETIME_SECS`].
    pub fn effective_lifetime_secs(&self) -> u64 {
        self.lifetime_secs.min(MAX_LIFETIME_SECS)
    }

    /// Parse a TOML document such as `lifetime_secs = 3`.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SessionError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment.
    ///
    /// An unset variable leaves the config unchanged. A set but unparseable
    /// (or non-UTF-8) value is an error.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_env_lookup(std::env::var(LIFETIME_ENV_VAR))
    }

    fn with_env_lookup(self, lookup: std::result::Result<String, VarError>) -> Result<Self> {
        match lookup {
            Ok(value) => self.with_env_value(&value),
            Err(VarError::NotPresent) => Ok(self),
            Err(e @ VarError::NotUnicode(_)) => {
                Err(SessionError::Config(format!("{LIFETIME_ENV_VAR}: {e}")))
            }
        }
    }

    fn with_env_value(self, value: &str) -> Result<Self> {
        let secs = value.trim().parse::<u64>().map_err(|e| {
            SessionError::Config(format!("{LIFETIME_ENV_VAR}={value:?}: {e}"))
        })?;
        Ok(self.with_lifetime_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_lifetime() {
        assert_eq!(SessionConfig::default().lifetime_secs, DEFAULT_LIFETIME_SECS);
    }

    #[test]
    fn test_effective_lifetime_is_capped() {
        let config = SessionConfig::new().with_lifetime_secs(MAX_LIFETIME_SECS + 100);
        assert_eq!(config.effective_lifetime_secs(), MAX_LIFETIME_SECS);

        let config = SessionConfig::new().with_lifetime_secs(2);
        assert_eq!(config.effective_lifetime_secs(), 2);
    }

    #[test]
    fn test_from_toml_str() {
        let config = SessionConfig::from_toml_str("lifetime_secs = 3").unwrap();
        assert_eq!(config.lifetime_secs, 3);

        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn test_from_toml_str_rejects_bad_type() {
        let result = SessionConfig::from_toml_str("lifetime_secs = \"long\"");
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lifetime_secs = 0").unwrap();

        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.lifetime_secs, 0);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionConfig::load(dir.path().join("missing.toml"));
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_env_value_override() {
        let config = SessionConfig::new().with_env_value(" 4 ").unwrap();
        assert_eq!(config.lifetime_secs, 4);

        let result = SessionConfig::new().with_env_value("soon");
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_env_lookup_not_unicode_is_error() {
        let config = SessionConfig::new().with_lifetime_secs(3);

        let unchanged = config.clone().with_env_lookup(Err(VarError::NotPresent)).unwrap();
        assert_eq!(unchanged.lifetime_secs, 3);

        let result = config.with_env_lookup(Err(VarError::NotUnicode("\u{fffd}".into())));
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_with_env_overrides_reads_process_env() {
        // Only this test touches the variable.
        unsafe { std::env::set_var(LIFETIME_ENV_VAR, "2") };
        let config = SessionConfig::new().with_env_overrides();
        unsafe { std::env::remove_var(LIFETIME_ENV_VAR) };
        assert_eq!(config.unwrap().lifetime_secs, 2);

        let config = SessionConfig::new().with_env_overrides().unwrap();
        assert_eq!(config, SessionConfig::default());
    }
}
