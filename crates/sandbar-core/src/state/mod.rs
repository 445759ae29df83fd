//! In-memory service state.
//!
//! - [`service`]: [`service::ServiceState`], the bucket map and the
//!   write-through glue to the persistence layer.
//! - [`bucket`]: [`bucket::BucketState`] and the bucket-configuration
//!   slots.
//! - [`keystore`]: the sorted key store and the paged listing engine.
//! - [`object`]: [`object::StoredObject`].
//! - [`multipart`]: in-progress multipart uploads.

pub mod bucket;
pub mod keystore;
pub mod multipart;
pub mod object;
pub mod service;

pub use bucket::{BucketState, ConfigKind, StoredConfig};
pub use keystore::{KeyStore, ListPage};
pub use multipart::{MultipartUpload, UploadPart};
pub use object::StoredObject;
pub use service::ServiceState;
