// src/services/reporter.rs
use crate::errors::GenlyzError;
use crate::gate::SubmissionGate;
use crate::models::{AnalysisResult, HistoryEntry};
use crate::progress::ProgressTicker;
use crate::services::classifier::Classifier;
use crate::services::history::HistoryStore;
use log::info;
use std::sync::Arc;

/// Drives one submission end to end: takes the gate's submit token,
/// runs the synthetic progress indicator while the classifier call is
/// outstanding, applies the outcome back to the gate, and records
/// successful results in the history log.
pub struct UploadReporter {
    classifier: Arc<dyn Classifier>,
    history: Arc<dyn HistoryStore>,
}

impl UploadReporter {
    pub fn new(classifier: Arc<dyn Classifier>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            classifier,
            history,
        }
    }

    /// On failure the gate ends in `Failed` and the log is untouched.
    /// A history write error after a successful classification still
    /// leaves the gate in `Result`; the outcome stays readable there.
    pub async fn submit(
        &self,
        gate: &mut SubmissionGate,
    ) -> Result<AnalysisResult, GenlyzError> {
        let (token, asset) = gate.begin_submit()?;

        let ticker = ProgressTicker::start();
        let outcome = self.classifier.classify(&asset).await;
        ticker.finish();

        match outcome {
            Ok(result) => {
                if !gate.apply_success(token, result.clone()) {
                    return Err(GenlyzError::Validation(
                        "analysis superseded by a newer selection".to_string(),
                    ));
                }
                info!(
                    "{}: {} ({}% confidence)",
                    asset.name,
                    result.label(),
                    result.display_confidence()
                );
                let entry = HistoryEntry::from_result(&result, &asset);
                self.history.append(entry).await?;
                Ok(result)
            }
            Err(e) => {
                gate.apply_failure(token);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateState;
    use crate::models::{NormalizedAsset, PNG, SourceAsset};
    use crate::services::history::FileHistoryStore;
    use crate::services::pipeline::ImagePipeline;
    use crate::services::pipeline::test_images::{encode_as, solid_image};
    use async_trait::async_trait;
    use chrono::Utc;
    use image::ImageOutputFormat;

    struct FixedClassifier {
        confidence: f64,
    }

    #[async_trait]
    impl Classifier for FixedClassifier {
        async fn classify(&self, _: &NormalizedAsset) -> Result<AnalysisResult, GenlyzError> {
            Ok(AnalysisResult {
                is_ai_generated: true,
                confidence: self.confidence,
                timestamp: Utc::now(),
            })
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl Classifier for FailingClassifier {
        async fn classify(&self, _: &NormalizedAsset) -> Result<AnalysisResult, GenlyzError> {
            Err(GenlyzError::AnalysisRequest("server returned 500".to_string()))
        }
    }

    fn ready_gate() -> SubmissionGate {
        let mut gate = SubmissionGate::new(ImagePipeline::new());
        gate.select(SourceAsset::new(
            "photo.png",
            PNG,
            encode_as(&solid_image(16, 16), ImageOutputFormat::Png),
        ))
        .unwrap();
        gate
    }

    #[tokio::test]
    async fn success_reaches_result_and_appends_history() {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(FileHistoryStore::new(dir.path().join("history.json")));
        let reporter = UploadReporter::new(
            Arc::new(FixedClassifier { confidence: 87.3 }),
            history.clone(),
        );

        let mut gate = ready_gate();
        let result = reporter.submit(&mut gate).await.unwrap();
        assert!(result.is_ai_generated);
        assert_eq!(gate.state(), GateState::Result);

        let entries = history.read().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].confidence, 87.3);
        assert!(entries[0].is_ai_generated);
        assert_eq!(entries[0].image_data.name, "photo.png");
    }

    #[tokio::test]
    async fn failure_reaches_failed_and_history_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(FileHistoryStore::new(dir.path().join("history.json")));
        let reporter = UploadReporter::new(Arc::new(FailingClassifier), history.clone());

        let mut gate = ready_gate();
        let err = reporter.submit(&mut gate).await.unwrap_err();
        assert!(matches!(err, GenlyzError::AnalysisRequest(_)));
        assert_eq!(gate.state(), GateState::Failed);
        assert!(history.read().await.unwrap().is_empty());

        // The asset survives for a user retry.
        assert!(gate.current().is_some());
    }

    #[tokio::test]
    async fn retry_after_failure_can_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(FileHistoryStore::new(dir.path().join("history.json")));

        let mut gate = ready_gate();
        UploadReporter::new(Arc::new(FailingClassifier), history.clone())
            .submit(&mut gate)
            .await
            .unwrap_err();

        let result = UploadReporter::new(
            Arc::new(FixedClassifier { confidence: 64.0 }),
            history.clone(),
        )
        .submit(&mut gate)
        .await
        .unwrap();
        assert_eq!(result.confidence, 64.0);
        assert_eq!(gate.state(), GateState::Result);
        assert_eq!(history.read().await.unwrap().len(), 1);
    }
}
