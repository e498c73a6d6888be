use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use similarity::resilience::{execute_with_retry_async, CircuitBreaker, RetryConfig};
use std::time::Duration;
use tracing::debug;

use crate::{AlignmentError, BoundingBox, FaceDetectConfig, FaceDetector};

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// Face detector backed by a `GET ?image=<ref>` endpoint answering
/// `{"faces": [{x, y, width, height}, ...]}`.
pub struct HttpFaceDetector {
    url: String,
    api_key: Option<String>,
    timeout: Duration,
    retry: Option<RetryConfig>,
    breaker: Option<CircuitBreaker>,
}

impl HttpFaceDetector {
    pub fn new(cfg: &FaceDetectConfig) -> Result<Self, AlignmentError> {
        cfg.validate()?;
        Ok(Self {
            url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.request_timeout(),
            retry: cfg
                .enable_resilience
                .then(|| cfg.retry_config.unwrap_or_default()),
            breaker: cfg
                .enable_resilience
                .then(|| CircuitBreaker::new(cfg.circuit_breaker_config.unwrap_or_default())),
        })
    }

    async fn send_request(&self, image_ref: &str) -> Result<Vec<BoundingBox>, AlignmentError> {
        let mut request = HTTP_CLIENT
            .get(&self.url)
            .query(&[("image", image_ref)])
            .timeout(self.timeout);
        if let Some(key) = self.api_key.as_deref() {
            request = request.header("X-Api-Key", key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AlignmentError::Timeout(self.timeout)
            } else {
                AlignmentError::Request(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AlignmentError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| AlignmentError::InvalidResponse(format!("invalid JSON response: {e}")))?;
        parse_faces(value)
    }
}

#[async_trait]
impl FaceDetector for HttpFaceDetector {
    fn name(&self) -> &str {
        "http"
    }

    async fn detect(&self, image_ref: &str) -> Result<Vec<BoundingBox>, AlignmentError> {
        if let Some(breaker) = &self.breaker {
            if !breaker.allow_request() {
                return Err(AlignmentError::CircuitOpen(self.name().into()));
            }
        }

        let result = match &self.retry {
            Some(retry) => {
                execute_with_retry_async(retry, AlignmentError::is_retryable, |attempt| async move {
                    if attempt > 0 {
                        debug!(attempt, image_ref, "face_detect_retry");
                    }
                    self.send_request(image_ref).await
                })
                .await
                .result
            }
            None => self.send_request(image_ref).await,
        };

        if let Some(breaker) = &self.breaker {
            match &result {
                Ok(_) => breaker.record_success(),
                Err(_) => breaker.record_failure(),
            }
        }
        result
    }
}

/// Accept `{"faces": [...]}` or a bare array of boxes.
pub(crate) fn parse_faces(value: Value) -> Result<Vec<BoundingBox>, AlignmentError> {
    let faces = match value {
        Value::Object(mut map) => map
            .remove("faces")
            .ok_or_else(|| AlignmentError::InvalidResponse("missing `faces` field".into()))?,
        other => other,
    };
    if !faces.is_array() {
        return Err(AlignmentError::InvalidResponse(
            "faces must be an array".into(),
        ));
    }
    serde_json::from_value(faces)
        .map_err(|e| AlignmentError::InvalidResponse(format!("malformed face box: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_faces_object() {
        let faces = parse_faces(json!({
            "faces": [
                {"x": 10, "y": 20, "width": 50, "height": 60},
                {"x": 1, "y": 2, "width": 3, "height": 4}
            ]
        }))
        .unwrap();
        assert_eq!(faces.len(), 2);
        assert_eq!(faces[0], BoundingBox::new(10.0, 20.0, 50.0, 60.0));
    }

    #[test]
    fn parse_bare_array_and_empty() {
        assert_eq!(parse_faces(json!([])).unwrap(), Vec::new());
        assert_eq!(parse_faces(json!({"faces": []})).unwrap(), Vec::new());
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(parse_faces(json!({"boxes": []})).is_err());
        assert!(parse_faces(json!({"faces": "none"})).is_err());
        assert!(parse_faces(json!({"faces": [{"x": 1}]})).is_err());
    }

    #[test]
    fn resilience_follows_config() {
        let plain = HttpFaceDetector::new(&FaceDetectConfig {
            enable_resilience: false,
            ..Default::default()
        })
        .unwrap();
        assert!(plain.retry.is_none() && plain.breaker.is_none());

        let guarded = HttpFaceDetector::new(&FaceDetectConfig::default()).unwrap();
        assert!(guarded.retry.is_some() && guarded.breaker.is_some());
    }

    #[tokio::test]
    async fn open_breaker_fails_fast() {
        let det = HttpFaceDetector::new(&FaceDetectConfig {
            api_url: "http://127.0.0.1:9/unused".into(),
            ..Default::default()
        })
        .unwrap();
        let breaker = det.breaker.as_ref().unwrap();
        for _ in 0..5 {
            breaker.record_failure();
        }
        let err = det.detect("a.jpg").await.unwrap_err();
        assert_eq!(err, AlignmentError::CircuitOpen("http".into()));
        assert!(!err.is_retryable());
    }
}
