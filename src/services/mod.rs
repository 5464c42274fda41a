// src/services/mod.rs
pub mod classifier;
pub mod history;
pub mod pipeline;
pub mod reporter;
pub mod samples;

pub use classifier::{Classifier, ClassifierClient};
pub use history::{FileHistoryStore, HistoryStore};
pub use pipeline::ImagePipeline;
pub use reporter::UploadReporter;
pub use samples::{SampleCategory, SampleGallery};
