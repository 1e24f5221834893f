use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::error::{RootError, RootResult};

/// Environment variable holding the credential signing secret.
pub const SIGNING_SECRET_ENV: &str = "RESONANCE_SIGNING_SECRET";

/// Server-held credential signing secret. Zeroized on drop, never printed.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl<'de> Deserialize<'de> for SigningSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Zeroizing::new(String::deserialize(deserializer)?);
        Ok(Self::new(raw.as_bytes()))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "resonance=info,resonance_auth=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Top-level configuration, loaded from `~/.resonance/config.toml`.
///
/// Both tunables are read once at startup and held for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    /// Base resonance frequency; claimed frequencies must be within 10% of it.
    #[serde(default = "default_base_frequency")]
    pub base_frequency: f64,

    /// Signing secret from the file. The environment variable takes
    /// precedence. Never written back out by `save`.
    #[serde(default, skip_serializing)]
    pub signing_secret: Option<SigningSecret>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_base_frequency() -> f64 {
    resonance_auth::scorer::BASE_FREQUENCY
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            base_frequency: default_base_frequency(),
            signing_secret: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a TOML file, omitting the secret.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> RootResult<()> {
        if !self.base_frequency.is_finite() || self.base_frequency <= 0.0 {
            return Err(RootError::Config(format!(
                "base_frequency must be a positive number, got {}",
                self.base_frequency
            )));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(RootError::Config("logging.filter must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve the signing secret from the environment, then the file.
    pub fn resolve_secret(&self) -> RootResult<SigningSecret> {
        self.resolve_secret_with(std::env::var(SIGNING_SECRET_ENV).ok())
    }

    /// Resolve the signing secret given an explicit environment value.
    ///
    /// There is no built-in fallback: with neither source set, startup fails.
    pub fn resolve_secret_with(&self, env_value: Option<String>) -> RootResult<SigningSecret> {
        let from_env = env_value
            .map(Zeroizing::new)
            .filter(|v| !v.is_empty())
            .map(|v| SigningSecret::new(v.as_bytes()));

        from_env
            .or_else(|| self.signing_secret.clone().filter(|s| !s.is_empty()))
            .ok_or_else(|| {
                RootError::Config(format!(
                    "signing secret is required: set {} or signing_secret in the config file",
                    SIGNING_SECRET_ENV
                ))
            })
    }

    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".resonance/config.toml")
    }
}
