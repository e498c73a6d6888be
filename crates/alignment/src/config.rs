use serde::{Deserialize, Serialize};
use similarity::resilience::{CircuitBreakerConfig, RetryConfig};
use std::time::Duration;

use crate::AlignmentError;

/// Default face-detection endpoint (API Ninjas).
pub const DEFAULT_FACE_DETECT_URL: &str = "https://api.api-ninjas.com/v1/facedetect";

/// Runtime configuration for the face detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FaceDetectConfig {
    /// `"api"` (remote HTTP) or `"stub"` (fixed boxes, offline).
    pub mode: String,
    /// Endpoint queried with an `image` parameter in api mode.
    pub api_url: String,
    /// Value for the `X-Api-Key` header.
    pub api_key: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker_config: Option<CircuitBreakerConfig>,
    pub enable_resilience: bool,
}

impl Default for FaceDetectConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            api_url: DEFAULT_FACE_DETECT_URL.into(),
            api_key: None,
            api_timeout_secs: Some(30),
            retry_config: None,
            circuit_breaker_config: None,
            enable_resilience: true,
        }
    }
}

impl FaceDetectConfig {
    pub fn validate(&self) -> Result<(), AlignmentError> {
        match self.mode.as_str() {
            "api" if self.api_url.trim().is_empty() => Err(AlignmentError::InvalidConfig(
                "api_url is required for api mode".into(),
            )),
            "api" | "stub" => Ok(()),
            other => Err(AlignmentError::InvalidConfig(format!(
                "unknown face detection mode '{other}' (expected 'api' or 'stub')"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs.unwrap_or(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = FaceDetectConfig::default();
        assert_eq!(cfg.api_url, DEFAULT_FACE_DETECT_URL);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_mode_and_empty_url() {
        let bad_mode = FaceDetectConfig {
            mode: "opencv".into(),
            ..Default::default()
        };
        assert!(bad_mode.validate().is_err());

        let no_url = FaceDetectConfig {
            api_url: String::new(),
            ..Default::default()
        };
        assert!(no_url.validate().is_err());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: FaceDetectConfig = serde_json::from_str(r#"{"mode": "stub"}"#).unwrap();
        assert_eq!(cfg.mode, "stub");
        assert!(cfg.enable_resilience);
    }
}
