// src/services/samples.rs
use crate::errors::GenlyzError;
use crate::models::{SourceAsset, declared_media_type};
use bytes::Bytes;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const SAMPLES_PER_CATEGORY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCategory {
    Real,
    Fake,
}

impl SampleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleCategory::Real => "real",
            SampleCategory::Fake => "fake",
        }
    }
}

/// The bundled example images: two fixed categories of numbered JPEGs
/// under a gallery root, loadable as ordinary file input so they flow
/// through the same gate as a user's own picture.
pub struct SampleGallery {
    root: PathBuf,
}

impl SampleGallery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/real/real_1.jpg` through `real_30.jpg`, same for fake.
    pub fn paths(&self, category: SampleCategory) -> Vec<PathBuf> {
        (1..=SAMPLES_PER_CATEGORY)
            .map(|i| {
                self.root
                    .join(category.as_str())
                    .join(format!("{}_{}.jpg", category.as_str(), i))
            })
            .collect()
    }

    /// A fresh random subset, the "show me other examples" action.
    pub fn random_picks(&self, category: SampleCategory, count: usize) -> Vec<PathBuf> {
        let mut paths = self.paths(category);
        paths.shuffle(&mut rand::thread_rng());
        paths.truncate(count);
        paths
    }

    pub async fn load(&self, path: &Path) -> Result<SourceAsset, GenlyzError> {
        let data = fs::read(path)
            .await
            .map_err(|e| GenlyzError::Validation(format!("cannot read {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("sample")
            .to_string();
        Ok(SourceAsset::new(
            name,
            declared_media_type(path),
            Bytes::from(data),
        ))
    }
}
