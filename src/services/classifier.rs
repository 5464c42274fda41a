// src/services/classifier.rs
use crate::errors::GenlyzError;
use crate::models::{AnalysisResult, NormalizedAsset};
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "https://api.tionlab.software/predict";

/// Seam to the remote classification service, mockable in tests.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, asset: &NormalizedAsset) -> Result<AnalysisResult, GenlyzError>;
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(rename = "isAiGenerated")]
    is_ai_generated: bool,
    confidence: f64,
}

/// One multipart POST per classification. Any transport error,
/// non-2xx status, or malformed body maps to `AnalysisRequest`; there
/// is no retry here, recovery is user-initiated.
pub struct ClassifierClient {
    endpoint: String,
    client: Client,
}

impl ClassifierClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Classifier for ClassifierClient {
    async fn classify(&self, asset: &NormalizedAsset) -> Result<AnalysisResult, GenlyzError> {
        debug!(
            "uploading {} ({} bytes) to {}",
            asset.name,
            asset.len(),
            self.endpoint
        );

        let part = Part::bytes(asset.data.to_vec())
            .file_name(asset.name.clone())
            .mime_str(&asset.media_type)
            .map_err(|e| GenlyzError::AnalysisRequest(format!("bad media type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GenlyzError::AnalysisRequest(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenlyzError::AnalysisRequest(format!(
                "server returned {}",
                status
            )));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| GenlyzError::AnalysisRequest(format!("malformed response: {}", e)))?;

        Ok(AnalysisResult {
            is_ai_generated: parsed.is_ai_generated,
            confidence: parsed.confidence,
            timestamp: Utc::now(),
        })
    }
}
