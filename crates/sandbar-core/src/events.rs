//! The in-process notification bus.
//!
//! Successful mutations publish one [`EventRecord`]. Records for a bucket
//! are published in the order their operations committed (mutations are
//! serialized under the bucket's write lock). Each bucket fans out through
//! its own `tokio::sync::broadcast` channel, so a slow, lagging, or dropped
//! subscriber never blocks the publisher or other subscribers.

use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Per-bucket channel capacity. Subscribers that fall further behind than
/// this see a `Lagged` error and continue from the oldest retained record.
const CHANNEL_CAPACITY: usize = 256;

/// The notification names this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventName {
    /// `ObjectCreated:Put`
    CreatedPut,
    /// `ObjectCreated:Post`
    CreatedPost,
    /// `ObjectCreated:Copy`
    CreatedCopy,
    /// `ObjectCreated:CompleteMultipartUpload`
    CreatedCompleteMultipartUpload,
    /// `ObjectRemoved:Delete`
    RemovedDelete,
}

impl EventName {
    /// The wire name of the event.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedPut => "ObjectCreated:Put",
            Self::CreatedPost => "ObjectCreated:Post",
            Self::CreatedCopy => "ObjectCreated:Copy",
            Self::CreatedCompleteMultipartUpload => "ObjectCreated:CompleteMultipartUpload",
            Self::RemovedDelete => "ObjectRemoved:Delete",
        }
    }
}

/// The object half of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventObject {
    /// The object key.
    pub key: String,
    /// Object size in bytes (zero for deletions).
    pub size: u64,
    /// The object's quoted ETag (empty for deletions).
    pub e_tag: String,
}

/// One notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// ISO-8601 timestamp with millisecond precision.
    pub event_time: String,
    /// The event name (`ObjectCreated:Put`, …).
    pub event_name: &'static str,
    /// The bucket the operation committed against.
    pub bucket: String,
    /// The affected object.
    pub object: EventObject,
}

impl EventRecord {
    /// Build a record stamped with the given commit time.
    #[must_use]
    pub fn new(
        name: EventName,
        bucket: impl Into<String>,
        key: impl Into<String>,
        size: u64,
        etag: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_time: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            event_name: name.as_str(),
            bucket: bucket.into(),
            object: EventObject {
                key: key.into(),
                size,
                e_tag: etag.into(),
            },
        }
    }
}

/// The per-bucket publish/subscribe bus.
#[derive(Debug, Default)]
pub struct EventBus {
    channels: DashMap<String, broadcast::Sender<EventRecord>>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a bucket's notifications.
    #[must_use]
    pub fn subscribe(&self, bucket: &str) -> broadcast::Receiver<EventRecord> {
        self.sender(bucket).subscribe()
    }

    /// Publish a record to its bucket's subscribers.
    ///
    /// A send with no live subscribers is a no-op, not an error.
    pub fn publish(&self, record: EventRecord) {
        trace!(bucket = %record.bucket, event = record.event_name, key = %record.object.key, "publishing event");
        let _ = self.sender(&record.bucket).send(record);
    }

    fn sender(&self, bucket: &str) -> broadcast::Sender<EventRecord> {
        self.channels
            .entry(bucket.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}
