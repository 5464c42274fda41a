// src/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenlyzError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image is {compressed} bytes after compression, over the {limit} byte limit")]
    TooLarge {
        original: usize,
        compressed: usize,
        limit: usize,
    },

    #[error("Analysis request failed: {0}")]
    AnalysisRequest(String),

    #[error("History store error: {0}")]
    History(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl GenlyzError {
    /// Whether the current selection should be discarded when this
    /// error surfaces. Network failures keep the asset so the user can
    /// re-trigger analysis; everything else returns the gate to empty.
    pub fn discards_selection(&self) -> bool {
        !matches!(self, GenlyzError::AnalysisRequest(_))
    }
}
