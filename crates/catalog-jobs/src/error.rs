//! Job error types.

use catalog_core::CatalogError;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Job-related errors.
#[derive(Debug, Error)]
pub enum JobError {
    /// Broker connection or channel failure.
    #[error("Queue connection error: {0}")]
    Connection(String),

    /// Publishing a work item failed.
    #[error("Failed to publish work item: {0}")]
    Publish(String),

    /// Acknowledging a delivery failed.
    #[error("Failed to acknowledge delivery: {0}")]
    Acknowledge(String),

    /// Payload is not a valid work item envelope.
    #[error("Undecodable work item: {0}")]
    Decode(String),

    /// Envelope was produced by a newer version of the service.
    #[error("Unsupported envelope version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A dependency (store, cache) failed transiently.
    #[error("Dependency unavailable: {0}")]
    Dependency(String),

    /// Work item can never succeed (e.g. the product does not exist).
    #[error("Work item rejected: {0}")]
    Rejected(String),

    /// Transformation of the image failed.
    #[error("Image processing failed: {0}")]
    ExecutionFailed(String),

    /// Processor lifecycle misuse.
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JobError {
    /// Returns true if the delivery should be requeued for another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            JobError::Connection(_)
                | JobError::Publish(_)
                | JobError::Dependency(_)
                | JobError::ExecutionFailed(_)
        )
    }

    /// Returns true if the payload itself is unusable.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            JobError::Decode(_) | JobError::UnsupportedVersion { .. } | JobError::Serialization(_)
        )
    }
}

impl From<CatalogError> for JobError {
    fn from(err: CatalogError) -> Self {
        if err.is_retriable() {
            JobError::Dependency(err.to_string())
        } else {
            JobError::Rejected(err.to_string())
        }
    }
}

impl From<lapin::Error> for JobError {
    fn from(err: lapin::Error) -> Self {
        JobError::Connection(err.to_string())
    }
}
