// src/models.rs
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const JPEG: &str = "image/jpeg";
pub const PNG: &str = "image/png";

/// Anything the host declares as an image. Non-image declarations are
/// rejected before decoding is attempted.
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// The two encodings the classification endpoint accepts as-is.
/// `image/jpg` shows up from extension-guessed uploads and is treated
/// as JPEG.
pub fn is_accepted_media_type(media_type: &str) -> bool {
    matches!(media_type, "image/jpeg" | "image/jpg" | "image/png")
}

/// Declared media type guessed from the file extension, the way a
/// picker reports it. The pipeline validates the actual bytes.
pub fn declared_media_type(path: &std::path::Path) -> String {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => JPEG.to_string(),
        Some(ext) if ext == "png" => PNG.to_string(),
        Some(ext) => format!("image/{}", ext),
        None => "application/octet-stream".to_string(),
    }
}

/// A file as selected, before any normalization.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
}

impl SourceAsset {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// A format- and size-compliant asset, ready for submission. The
/// preview is a displayable view of the normalized bytes and drops
/// with the asset when it is replaced or the gate resets.
#[derive(Debug, Clone)]
pub struct NormalizedAsset {
    pub name: String,
    pub media_type: String,
    pub data: Bytes,
    pub preview: String,
}

impl NormalizedAsset {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, data: Bytes) -> Self {
        let media_type = media_type.into();
        let preview = format!(
            "data:{};base64,{}",
            media_type,
            general_purpose::STANDARD.encode(&data)
        );
        Self {
            name: name.into(),
            media_type,
            data,
            preview,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// Original vs. final byte size of one pipeline run, surfaced to the
/// user after an automatic compression.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SizeReport {
    pub original_bytes: usize,
    pub final_bytes: usize,
    pub quality: Option<u8>,
}

impl SizeReport {
    pub fn passthrough(bytes: usize) -> Self {
        Self {
            original_bytes: bytes,
            final_bytes: bytes,
            quality: None,
        }
    }

    pub fn was_compressed(&self) -> bool {
        self.quality.is_some()
    }

    pub fn summary(&self) -> String {
        if self.was_compressed() {
            format!(
                "{:.2} MB -> {:.2} MB (quality {})",
                mib(self.original_bytes),
                mib(self.final_bytes),
                self.quality.unwrap_or_default()
            )
        } else {
            format!("{:.2} MB, kept as-is", mib(self.original_bytes))
        }
    }
}

pub fn mib(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Classifier output for a single submission. `confidence` is the raw
/// 0-100 score from the endpoint and is stored untouched; the display
/// offset lives in `display_confidence` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub is_ai_generated: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    /// Confidence as shown to the user: a fixed -0.1 offset at two
    /// decimals. Kept for compatibility with the established display;
    /// the raw score is what gets persisted.
    pub fn display_confidence(&self) -> String {
        format!("{:.2}", self.confidence - 0.1)
    }

    pub fn label(&self) -> &'static str {
        if self.is_ai_generated {
            "AI-generated"
        } else {
            "Human-generated"
        }
    }
}

/// Name and size of the analyzed file, carried into the history log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetMeta {
    pub name: String,
    pub size: usize,
}

/// One appended record of the history log. Field names stay camelCase
/// on the wire to match the established log format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub is_ai_generated: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub analyzed_at: String,
    pub image_data: AssetMeta,
}

impl HistoryEntry {
    /// Same fixed display offset as `AnalysisResult::display_confidence`.
    pub fn display_confidence(&self) -> String {
        format!("{:.2}", self.confidence - 0.1)
    }

    pub fn from_result(result: &AnalysisResult, asset: &NormalizedAsset) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_ai_generated: result.is_ai_generated,
            confidence: result.confidence,
            timestamp: result.timestamp,
            analyzed_at: result.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            image_data: AssetMeta {
                name: asset.name.clone(),
                size: asset.len(),
            },
        }
    }
}
