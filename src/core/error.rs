//! Error types for the terrain streamer

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
