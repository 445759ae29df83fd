//! Multipart upload staging.
//!
//! An upload captures its target key and object metadata at initiate time
//! and accumulates parts, possibly out of order, until completion or abort.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Highest part number the protocol allows.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// An in-progress multipart upload.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    /// The opaque upload ID.
    pub upload_id: String,
    /// The key the completed object will occupy.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// Content type captured at initiate.
    pub content_type: Option<String>,
    /// User metadata captured at initiate.
    pub metadata: HashMap<String, String>,
    /// `x-amz-website-redirect-location` captured at initiate.
    pub website_redirect_location: Option<String>,
    /// Uploaded parts keyed by part number; arrivals may be out of order.
    pub parts: BTreeMap<u32, UploadPart>,
}

/// One staged part.
#[derive(Debug, Clone)]
pub struct UploadPart {
    /// The part number (1..=10000).
    pub part_number: u32,
    /// The part's quoted ETag.
    pub etag: String,
    /// The part body.
    pub data: Bytes,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
}

impl UploadPart {
    /// Part size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

impl MultipartUpload {
    /// Start a new upload for a key.
    #[must_use]
    pub fn new(upload_id: String, key: String) -> Self {
        Self {
            upload_id,
            key,
            initiated: Utc::now(),
            content_type: None,
            metadata: HashMap::new(),
            website_redirect_location: None,
            parts: BTreeMap::new(),
        }
    }

    /// Insert or replace a part.
    pub fn put_part(&mut self, part: UploadPart) {
        self.parts.insert(part.part_number, part);
    }

    /// Look up a part by number.
    #[must_use]
    pub fn get_part(&self, part_number: u32) -> Option<&UploadPart> {
        self.parts.get(&part_number)
    }
}
