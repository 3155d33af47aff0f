//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, storage, duration limits, transcoding, tools
//! and auth. Every section defaults sensibly so a completely empty `{}` file
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub limits: LimitsConfig,
    pub transcode: TranscodeConfig,
    pub tools: ToolsConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.limits.min_duration_secs > self.limits.max_duration_secs {
            warnings.push(format!(
                "limits.min_duration_secs ({}) is greater than limits.max_duration_secs ({}); every upload will be rejected",
                self.limits.min_duration_secs, self.limits.max_duration_secs
            ));
        }

        if self.storage.max_upload_mb == 0 {
            warnings.push("storage.max_upload_mb is 0; every upload will be rejected".into());
        }

        if self.transcode.max_concurrent == 0 {
            warnings.push("transcode.max_concurrent is 0; it will be treated as 1".into());
        }

        if self.auth.enabled && self.auth.api_key.as_deref().map_or(true, str::is_empty) {
            warnings.push("auth is enabled but no api_key is set".into());
        }

        if let Some(ref url) = self.server.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                warnings.push(format!(
                    "server.public_base_url '{url}' should start with http:// or https://"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Base URL embedded in share links. When unset, it is derived from the
    /// request's `Host` header.
    pub public_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            db_path: PathBuf::from("./data/vidlink.db"),
            public_base_url: None,
        }
    }
}

/// Filesystem storage for video bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root_dir: PathBuf,
    pub max_upload_mb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./data/storage"),
            max_upload_mb: 100,
        }
    }
}

impl StorageConfig {
    /// Upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Accepted duration window for uploads, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub min_duration_secs: u32,
    pub max_duration_secs: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 5,
            max_duration_secs: 25,
        }
    }
}

impl LimitsConfig {
    /// Whether a probed duration lies inside `[min, max]`.
    pub fn accepts(&self, duration_secs: f64) -> bool {
        duration_secs >= f64::from(self.min_duration_secs)
            && duration_secs <= f64::from(self.max_duration_secs)
    }
}

/// External engine execution limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Maximum number of simultaneous ffmpeg/ffprobe processes.
    pub max_concurrent: usize,
    /// Seconds before a running engine process is killed.
    pub timeout_secs: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_concurrent: num_cpus::get(),
            timeout_secs: 600,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// API-key authentication for the management routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.limits.min_duration_secs, 5);
        assert_eq!(cfg.limits.max_duration_secs, 25);
        assert_eq!(cfg.storage.max_upload_mb, 100);
        assert!(cfg.transcode.max_concurrent >= 1);
        assert!(!cfg.auth.enabled);
    }

    #[test]
    fn default_config_no_warnings() {
        let warnings = Config::default().validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{"server": {"port": 9090}, "limits": {"max_duration_secs": 60}}"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.limits.max_duration_secs, 60);
        assert_eq!(cfg.limits.min_duration_secs, 5);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.transcode.timeout_secs, 600);
    }

    #[test]
    fn parse_invalid_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/vidlink.json")));
        assert_eq!(cfg.server.port, 3000);
    }

    #[test]
    fn limits_are_inclusive() {
        let limits = LimitsConfig::default();
        assert!(limits.accepts(5.0));
        assert!(limits.accepts(11.0));
        assert!(limits.accepts(25.0));
        assert!(!limits.accepts(4.99));
        assert!(!limits.accepts(25.01));
        assert!(!limits.accepts(2.0));
    }

    #[test]
    fn inverted_limits_warn() {
        let mut cfg = Config::default();
        cfg.limits.min_duration_secs = 30;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("min_duration_secs")));
    }

    #[test]
    fn auth_enabled_without_key_warns() {
        let mut cfg = Config::default();
        cfg.auth.enabled = true;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("api_key")));
    }

    #[test]
    fn max_upload_bytes_converts_megabytes() {
        let storage = StorageConfig {
            max_upload_mb: 2,
            ..StorageConfig::default()
        };
        assert_eq!(storage.max_upload_bytes(), 2 * 1024 * 1024);
    }
}
