//! Work item envelope carried on the queue.
//!
//! Wire format (JSON):
//!
//! ```json
//! { "version": 1, "id": "<uuid>", "enqueued_at": "<rfc3339>",
//!   "kind": "compress_image", "product_id": 42, "image_ref": "a.jpg" }
//! ```
//!
//! `kind` selects the work variant. Decoding rejects envelopes with a
//! version newer than [`ENVELOPE_VERSION`] and kinds this build does not know.
//! Unknown extra fields are ignored, so older consumers accept additive
//! changes within a version.

use crate::error::{JobError, JobResult};
use catalog_core::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Current envelope version.
pub const ENVELOPE_VERSION: u32 = 1;

/// Work to be performed by the image processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    /// Produce a compressed rendition of one original product image.
    CompressImage {
        product_id: ProductId,
        image_ref: String,
    },
}

impl WorkItem {
    /// Wire name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkItem::CompressImage { .. } => "compress_image",
        }
    }

    /// Product the work applies to.
    pub fn product_id(&self) -> ProductId {
        match self {
            WorkItem::CompressImage { product_id, .. } => *product_id,
        }
    }
}

/// Versioned envelope around a [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkMessage {
    pub version: u32,
    pub id: Uuid,
    pub enqueued_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: WorkItem,
}

#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl WorkMessage {
    /// Wraps a work item in a fresh envelope.
    pub fn new(item: WorkItem) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            item,
        }
    }

    /// Creates a compress-image work message.
    pub fn compress_image(product_id: ProductId, image_ref: impl Into<String>) -> Self {
        Self::new(WorkItem::CompressImage {
            product_id,
            image_ref: image_ref.into(),
        })
    }

    /// Serializes the envelope to its JSON wire form.
    pub fn encode(&self) -> JobResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses an envelope from its JSON wire form.
    pub fn decode(payload: &[u8]) -> JobResult<Self> {
        let header: VersionHeader =
            serde_json::from_slice(payload).map_err(|e| JobError::Decode(e.to_string()))?;

        if header.version == 0 || header.version > ENVELOPE_VERSION {
            return Err(JobError::UnsupportedVersion {
                found: header.version,
                supported: ENVELOPE_VERSION,
            });
        }

        serde_json::from_slice(payload).map_err(|e| JobError::Decode(e.to_string()))
    }
}

impl fmt::Display for WorkMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} (v{})", self.item.kind(), self.id, self.version)
    }
}
