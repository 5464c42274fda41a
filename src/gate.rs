// src/gate.rs
use crate::errors::GenlyzError;
use crate::models::{AnalysisResult, NormalizedAsset, SizeReport, SourceAsset, is_image_media_type};
use crate::services::ImagePipeline;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Empty,
    Selected,
    Normalizing,
    Compressing,
    Ready,
    Submitting,
    Result,
    Failed,
}

/// Handed out by `begin_submit`; a response is only applied if the
/// token still matches the gate's current selection sequence, so a
/// late response from an abandoned request can never overwrite a newer
/// selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitToken {
    seq: u64,
}

/// Owns the single current asset and decides whether an analyze
/// action may proceed. All access is single-threaded; the async parts
/// (the network call) happen outside and report back through
/// `apply_success`/`apply_failure`.
pub struct SubmissionGate {
    pipeline: ImagePipeline,
    state: GateState,
    current: Option<NormalizedAsset>,
    result: Option<AnalysisResult>,
    seq: u64,
}

impl SubmissionGate {
    pub fn new(pipeline: ImagePipeline) -> Self {
        Self {
            pipeline,
            state: GateState::Empty,
            current: None,
            result: None,
            seq: 0,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn current(&self) -> Option<&NormalizedAsset> {
        self.current.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Takes a newly chosen file through normalization and, if it
    /// survives, makes it the current asset. Any previously held asset
    /// and preview drop here, and any in-flight submission is
    /// superseded. On failure the gate returns to `Empty`.
    pub fn select(&mut self, asset: SourceAsset) -> Result<SizeReport, GenlyzError> {
        self.discard();
        if !is_image_media_type(&asset.media_type) {
            return Err(GenlyzError::InvalidFileType(asset.media_type));
        }
        self.state = GateState::Selected;
        match self.run_pipeline(asset) {
            Ok((normalized, report)) => {
                debug!("{} ready for analysis ({})", normalized.name, report.summary());
                self.current = Some(normalized);
                self.state = GateState::Ready;
                Ok(report)
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }

    fn run_pipeline(
        &mut self,
        asset: SourceAsset,
    ) -> Result<(NormalizedAsset, SizeReport), GenlyzError> {
        let asset = if self.pipeline.needs_conversion(&asset) {
            self.state = GateState::Normalizing;
            self.pipeline.convert_to_jpeg(asset)?
        } else {
            asset
        };
        if asset.len() > self.pipeline.max_bytes() {
            self.state = GateState::Compressing;
        }
        self.pipeline.reduce(asset)
    }

    /// Moves `Ready` (or `Failed`, for a user retry) to `Submitting`
    /// and hands back the asset to upload. Rejected while a submission
    /// is already in flight, and with nothing selected.
    pub fn begin_submit(&mut self) -> Result<(SubmitToken, NormalizedAsset), GenlyzError> {
        if self.state == GateState::Submitting {
            return Err(GenlyzError::Validation(
                "an analysis is already in progress".to_string(),
            ));
        }
        let asset = self
            .current
            .clone()
            .ok_or_else(|| GenlyzError::Validation("no image selected".to_string()))?;
        if !matches!(self.state, GateState::Ready | GateState::Failed) {
            return Err(GenlyzError::Validation(format!(
                "cannot analyze from state {:?}",
                self.state
            )));
        }
        self.state = GateState::Submitting;
        Ok((SubmitToken { seq: self.seq }, asset))
    }

    /// Applies a successful response if its token is still current.
    /// Returns false when the response is stale (the selection changed
    /// or the gate was reset while the request was in flight).
    pub fn apply_success(&mut self, token: SubmitToken, result: AnalysisResult) -> bool {
        if !self.accepts(token) {
            warn!("ignoring stale analysis response");
            return false;
        }
        self.result = Some(result);
        self.state = GateState::Result;
        true
    }

    /// Same staleness discipline as `apply_success`. The asset is kept
    /// so the user can re-trigger analysis.
    pub fn apply_failure(&mut self, token: SubmitToken) -> bool {
        if !self.accepts(token) {
            warn!("ignoring stale analysis failure");
            return false;
        }
        self.state = GateState::Failed;
        true
    }

    fn accepts(&self, token: SubmitToken) -> bool {
        token.seq == self.seq && self.state == GateState::Submitting
    }

    /// Always available; discards the asset, preview, and result.
    pub fn reset(&mut self) {
        self.discard();
    }

    fn discard(&mut self) {
        // Bumping the sequence abandons any in-flight submission.
        self.seq += 1;
        self.current = None;
        self.result = None;
        self.state = GateState::Empty;
    }
}
