//! Per-bucket state.
//!
//! Objects, multipart staging, and configuration blobs sit behind
//! `parking_lot::RwLock`s; taking the write lock is what makes each
//! mutating operation atomic with respect to the others on the same
//! bucket.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{BucketSummary, CorsConfiguration, WebsiteConfiguration};

use super::keystore::KeyStore;
use super::multipart::MultipartUpload;

/// The bucket-configuration kinds this server stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    /// CORS rules (`?cors`).
    Cors,
    /// Static-website configuration (`?website`).
    Website,
    /// Bucket policy (`?policy`), stored opaquely.
    Policy,
    /// Lifecycle configuration (`?lifecycle`), stored opaquely.
    Lifecycle,
    /// Bucket ACL (`?acl`), stored opaquely.
    Acl,
    /// Bucket tagging (`?tagging`), stored opaquely.
    Tagging,
}

impl ConfigKind {
    /// Stable name, used for persistence file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cors => "cors",
            Self::Website => "website",
            Self::Policy => "policy",
            Self::Lifecycle => "lifecycle",
            Self::Acl => "acl",
            Self::Tagging => "tagging",
        }
    }

    /// Parse a persisted configuration file name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cors" => Some(Self::Cors),
            "website" => Some(Self::Website),
            "policy" => Some(Self::Policy),
            "lifecycle" => Some(Self::Lifecycle),
            "acl" => Some(Self::Acl),
            "tagging" => Some(Self::Tagging),
            _ => None,
        }
    }

    /// The error returned when this configuration is not set.
    #[must_use]
    pub fn missing_error(&self) -> S3Error {
        match self {
            Self::Cors => S3Error::new(S3ErrorCode::NoSuchCORSConfiguration),
            Self::Website => S3Error::new(S3ErrorCode::NoSuchWebsiteConfiguration),
            Self::Policy => S3Error::new(S3ErrorCode::NoSuchBucketPolicy),
            Self::Lifecycle => S3Error::new(S3ErrorCode::NoSuchLifecycleConfiguration),
            Self::Tagging => S3Error::new(S3ErrorCode::NoSuchTagSet),
            // ACLs always resolve; the canned FULL_CONTROL policy is
            // served when nothing was stored.
            Self::Acl => S3Error::new(S3ErrorCode::InternalError),
        }
    }
}

/// A stored configuration: the raw document (returned verbatim on GET)
/// plus the parsed engine form for the kinds the server interprets.
#[derive(Debug, Clone)]
pub struct StoredConfig {
    /// The raw XML (or JSON, for policies) document as uploaded.
    pub raw: Bytes,
    /// Parsed CORS rules when this is a CORS configuration.
    pub cors: Option<CorsConfiguration>,
    /// Parsed website configuration when this is one.
    pub website: Option<WebsiteConfiguration>,
}

impl StoredConfig {
    /// An opaque configuration (policy, lifecycle, ACL, tagging).
    #[must_use]
    pub fn opaque(raw: Bytes) -> Self {
        Self {
            raw,
            cors: None,
            website: None,
        }
    }
}

/// One bucket.
#[derive(Debug)]
pub struct BucketState {
    /// The bucket name.
    pub name: String,
    /// Creation timestamp; also drives `ListBuckets` ordering.
    pub created: DateTime<Utc>,
    /// The object map.
    pub objects: RwLock<KeyStore>,
    /// In-progress multipart uploads by upload ID.
    pub uploads: RwLock<BTreeMap<String, MultipartUpload>>,
    /// Stored configurations by kind.
    pub configs: RwLock<HashMap<ConfigKind, StoredConfig>>,
}

impl BucketState {
    /// Create an empty bucket stamped now.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_created(name, Utc::now())
    }

    /// Create an empty bucket with a known creation time (persistence
    /// reload path).
    #[must_use]
    pub fn with_created(name: impl Into<String>, created: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            created,
            objects: RwLock::new(KeyStore::default()),
            uploads: RwLock::new(BTreeMap::new()),
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// The `ListBuckets` summary.
    #[must_use]
    pub fn summary(&self) -> BucketSummary {
        BucketSummary {
            name: self.name.clone(),
            creation_date: self.created,
        }
    }

    /// Clone of the stored configuration of a kind, if set.
    #[must_use]
    pub fn config(&self, kind: ConfigKind) -> Option<StoredConfig> {
        self.configs.read().get(&kind).cloned()
    }

    /// The parsed CORS configuration, if set.
    #[must_use]
    pub fn cors(&self) -> Option<CorsConfiguration> {
        self.configs
            .read()
            .get(&ConfigKind::Cors)
            .and_then(|c| c.cors.clone())
    }

    /// The parsed website configuration, if set.
    #[must_use]
    pub fn website(&self) -> Option<WebsiteConfiguration> {
        self.configs
            .read()
            .get(&ConfigKind::Website)
            .and_then(|c| c.website.clone())
    }
}
