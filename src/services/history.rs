// src/services/history.rs
use crate::errors::GenlyzError;
use crate::models::HistoryEntry;
use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;

/// Logical key the log lives under, kept stable so existing records
/// stay readable.
pub const HISTORY_KEY: &str = "aiOrHumanResults";

/// Durable append-only log of past analyses. Appends come only from
/// the reporter on success; reads come from the history view.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn read(&self) -> Result<Vec<HistoryEntry>, GenlyzError>;
    async fn append(&self, entry: HistoryEntry) -> Result<(), GenlyzError>;
}

/// Single-file JSON store: one object holding the entry array under
/// `HISTORY_KEY`. A missing file, unparseable payload, or a non-array
/// value reads as the empty sequence rather than an error, so a
/// corrupt log never blocks an analysis.
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn read(&self) -> Result<Vec<HistoryEntry>, GenlyzError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(GenlyzError::History(e.to_string())),
        };

        let doc: Value = match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("history log is unreadable, starting fresh: {}", e);
                return Ok(Vec::new());
            }
        };

        let entries = doc.get(HISTORY_KEY).cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<Vec<HistoryEntry>>(entries) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("history log is not a valid entry array, starting fresh: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn append(&self, entry: HistoryEntry) -> Result<(), GenlyzError> {
        let mut entries = self.read().await?;
        entries.push(entry);

        let mut doc = serde_json::Map::new();
        doc.insert(
            HISTORY_KEY.to_string(),
            serde_json::to_value(&entries).map_err(|e| GenlyzError::History(e.to_string()))?,
        );
        let payload = serde_json::to_string_pretty(&Value::Object(doc))
            .map_err(|e| GenlyzError::History(e.to_string()))?;

        fs::write(&self.path, payload)
            .await
            .map_err(|e| GenlyzError::History(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, JPEG, NormalizedAsset};
    use bytes::Bytes;
    use chrono::Utc;

    fn entry(name: &str, confidence: f64) -> HistoryEntry {
        let result = AnalysisResult {
            is_ai_generated: true,
            confidence,
            timestamp: Utc::now(),
        };
        let asset = NormalizedAsset::new(name, JPEG, Bytes::from_static(b"img"));
        HistoryEntry::from_result(&result, &asset)
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("history.json"));
        assert!(store.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHistoryStore::new(dir.path().join("history.json"));
        store.append(entry("first.jpg", 10.0)).await.unwrap();
        store.append(entry("second.jpg", 20.0)).await.unwrap();

        let entries = store.read().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].image_data.name, "first.jpg");
        assert_eq!(entries[1].image_data.name, "second.jpg");
    }

    #[tokio::test]
    async fn corrupt_payload_recovers_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileHistoryStore::new(&path);
        assert!(store.read().await.unwrap().is_empty());

        // And the next append starts a clean log.
        store.append(entry("a.jpg", 50.0)).await.unwrap();
        assert_eq!(store.read().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_array_payload_recovers_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, format!("{{\"{}\": 42}}", HISTORY_KEY)).unwrap();

        let store = FileHistoryStore::new(&path);
        assert!(store.read().await.unwrap().is_empty());
    }
}
