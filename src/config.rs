//! YAML configuration for the engine
//!
//! One file configures both oracles and the reference frame. Every section is
//! optional; omitted fields fall back to their defaults.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "demo"
//!
//! similarity:
//!   mode: "api"
//!   api_url: "https://api.api-ninjas.com/v1/textsimilarity"
//!   max_concurrency: 8
//!   call_timeout: 10000
//!   failure_policy: "isolate"
//!   retry_config:
//!     max_retries: 2
//!     base_delay: 100
//!     max_delay: 2000
//!     backoff_multiplier: 2.0
//!     jitter: true
//!
//! face:
//!   mode: "api"
//!   api_url: "https://api.api-ninjas.com/v1/facedetect"
//!   api_timeout_secs: 30
//!
//! reference_frame:
//!   width: 200
//!   height: 260
//! ```
//!
//! API keys do not belong in the file. Set `PROFILE_AFFINITY_API_KEY` and call
//! [`EngineConfig::apply_env_overrides`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use alignment::{FaceDetectConfig, ReferenceFrame};
use serde::{Deserialize, Serialize};
use similarity::SimilarityConfig;
use thiserror::Error;
use tracing::debug;

/// API key shared by both oracles.
pub const ENV_API_KEY: &str = "PROFILE_AFFINITY_API_KEY";
/// Similarity endpoint override.
pub const ENV_SIMILARITY_URL: &str = "PROFILE_AFFINITY_SIMILARITY_URL";
/// Face detection endpoint override.
pub const ENV_FACE_URL: &str = "PROFILE_AFFINITY_FACE_URL";

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for [`crate::ProfileEngine`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub similarity: SimilarityConfig,

    #[serde(default)]
    pub face: FaceDetectConfig,

    /// Pixel space that detector boxes are expressed in.
    #[serde(default)]
    pub reference_frame: ReferenceFrame,

    /// Fallback values for the `PROFILE_AFFINITY_*` variables, used when the
    /// process environment does not set them.
    #[serde(default)]
    pub env_overrides: HashMap<String, String>,
}

impl EngineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Offline configuration: stub oracles on both sides.
    pub fn stub() -> Self {
        Self {
            similarity: SimilarityConfig {
                mode: "stub".into(),
                ..Default::default()
            },
            face: FaceDetectConfig {
                mode: "stub".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.similarity
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("similarity: {e}")))?;
        self.face
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("face: {e}")))?;

        let frame = &self.reference_frame;
        if !(frame.width > 0.0 && frame.height > 0.0) {
            return Err(ConfigLoadError::Validation(
                "reference_frame dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply `PROFILE_AFFINITY_*` overrides from the process environment,
    /// falling back to [`EngineConfig::env_overrides`].
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`EngineConfig::apply_env_overrides`] with an explicit lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |key: &str| {
            lookup(key)
                .or_else(|| self.env_overrides.get(key).cloned())
                .filter(|value| !value.trim().is_empty())
        };
        let api_key = resolve(ENV_API_KEY);
        let similarity_url = resolve(ENV_SIMILARITY_URL);
        let face_url = resolve(ENV_FACE_URL);

        if let Some(key) = api_key {
            debug!(var = ENV_API_KEY, "config_env_override");
            self.similarity.api_key = Some(key.clone());
            self.face.api_key = Some(key);
        }
        if let Some(url) = similarity_url {
            debug!(var = ENV_SIMILARITY_URL, url = %url, "config_env_override");
            self.similarity.api_url = url;
        }
        if let Some(url) = face_url {
            debug!(var = ENV_FACE_URL, url = %url, "config_env_override");
            self.face.api_url = url;
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            similarity: SimilarityConfig::default(),
            face: FaceDetectConfig::default(),
            reference_frame: ReferenceFrame::default(),
            env_overrides: HashMap::new(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}
