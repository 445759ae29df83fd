//! The stored object representation.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sandbar_model::types::{ObjectSummary, Owner, Tag};

use crate::utils::etag_of;

/// The default content type for PUT requests that supply none.
pub const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

/// One stored object.
///
/// The body is an immutable [`Bytes`]; a clone handed to a response is a
/// snapshot of the state at open time, untouched by concurrent overwrites
/// or deletes of the same key.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// The exact key byte string (trailing `/` significant).
    pub key: String,
    /// The content bytes.
    pub data: Bytes,
    /// The quoted ETag.
    pub etag: String,
    /// Content length in bytes.
    pub size: u64,
    /// The content type served back.
    pub content_type: String,
    /// Wall-clock time of the write.
    pub last_modified: DateTime<Utc>,
    /// User metadata; keys lowercased, `x-amz-meta-` prefix stripped.
    pub metadata: HashMap<String, String>,
    /// Persisted `x-amz-website-redirect-location`, if any.
    pub website_redirect_location: Option<String>,
    /// The object's tag set.
    pub tags: Vec<Tag>,
}

impl StoredObject {
    /// Build an object from a body, computing size and ETag.
    #[must_use]
    pub fn new(key: impl Into<String>, data: Bytes, content_type: Option<String>) -> Self {
        let etag = etag_of(&data);
        let size = data.len() as u64;
        Self {
            key: key.into(),
            data,
            etag,
            size,
            content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            last_modified: Utc::now(),
            metadata: HashMap::new(),
            website_redirect_location: None,
            tags: Vec::new(),
        }
    }

    /// The listing summary for this object.
    #[must_use]
    pub fn summary(&self, owner: &Owner) -> ObjectSummary {
        ObjectSummary {
            key: self.key.clone(),
            last_modified: self.last_modified,
            etag: self.etag.clone(),
            size: self.size,
            owner: owner.clone(),
        }
    }
}
