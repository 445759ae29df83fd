//! Top-level service state: the bucket map plus write-through persistence.
//!
//! Bucket names are globally unique within an instance. All mutating
//! entry points route through here so the in-memory state and the
//! filesystem store never diverge.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{BucketSummary, Owner};
use tracing::{debug, info};

use crate::state::bucket::{BucketState, ConfigKind, StoredConfig};
use crate::state::object::StoredObject;
use crate::store::FsStore;
use crate::validation::validate_bucket_name;

/// The bucket map and persistence glue.
#[derive(Debug, Default)]
pub struct ServiceState {
    buckets: DashMap<String, Arc<BucketState>>,
    store: Option<Arc<FsStore>>,
    owner: Owner,
}

impl ServiceState {
    /// Create an in-memory-only state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state backed by a filesystem store, loading everything the
    /// store holds.
    ///
    /// # Errors
    ///
    /// `InternalError` when the store cannot be read.
    pub fn with_store(store: FsStore) -> Result<Self, S3Error> {
        let store = Arc::new(store);
        let state = Self {
            buckets: DashMap::new(),
            store: Some(Arc::clone(&store)),
            owner: Owner::default(),
        };

        let loaded = store
            .load_buckets()
            .map_err(|e| S3Error::internal_error(format!("failed to load store: {e}")))?;
        for bucket in loaded {
            let entry = Arc::new(BucketState::with_created(&bucket.name, bucket.created));
            {
                let mut objects = entry.objects.write();
                for object in bucket.objects {
                    objects.put(object);
                }
            }
            {
                let mut configs = entry.configs.write();
                for (kind, raw) in bucket.configs {
                    // Parsed engine forms are rebuilt lazily by the config
                    // handlers on first use; CORS/website documents were
                    // validated when they were stored.
                    let stored = match kind {
                        ConfigKind::Cors => StoredConfig {
                            cors: sandbar_xml::from_xml(&raw).ok(),
                            website: None,
                            raw,
                        },
                        ConfigKind::Website => StoredConfig {
                            cors: None,
                            website: sandbar_xml::from_xml(&raw).ok(),
                            raw,
                        },
                        _ => StoredConfig::opaque(raw),
                    };
                    configs.insert(kind, stored);
                }
            }
            info!(bucket = %bucket.name, "restored bucket from disk");
            state.buckets.insert(bucket.name, entry);
        }

        Ok(state)
    }

    /// The fixed owner echoed on every resource.
    #[must_use]
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Whether a bucket with this exact name exists.
    #[must_use]
    pub fn bucket_exists(&self, name: &str) -> bool {
        self.buckets.contains_key(name)
    }

    /// Buckets in creation order.
    #[must_use]
    pub fn list_buckets(&self) -> Vec<BucketSummary> {
        let mut summaries: Vec<BucketSummary> = self
            .buckets
            .iter()
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by(|a, b| {
            a.creation_date
                .cmp(&b.creation_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        summaries
    }

    /// Look up a bucket.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket` when absent.
    pub fn get_bucket(&self, name: &str) -> Result<Arc<BucketState>, S3Error> {
        self.buckets
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| S3Error::no_such_bucket(name))
    }

    /// Create a bucket.
    ///
    /// # Errors
    ///
    /// `InvalidBucketName` on a name violating the rules;
    /// `BucketAlreadyOwnedByYou` when it already exists (this server is
    /// its own single owner).
    pub fn create_bucket(&self, name: &str) -> Result<(), S3Error> {
        validate_bucket_name(name)?;

        if self.buckets.contains_key(name) {
            return Err(S3Error::new(S3ErrorCode::BucketAlreadyOwnedByYou).with_resource(name));
        }

        let bucket = Arc::new(BucketState::new(name));
        self.persist(|store| store.create_bucket(name, bucket.created))?;
        self.buckets.insert(name.to_owned(), bucket);
        debug!(bucket = name, "created bucket");
        Ok(())
    }

    /// Delete a bucket.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket` when absent; `BucketNotEmpty` while objects remain
    /// (checked immediately, with no ghost entries for `/`-separated keys).
    pub fn delete_bucket(&self, name: &str) -> Result<(), S3Error> {
        let bucket = self.get_bucket(name)?;
        if !bucket.objects.read().is_empty() {
            return Err(S3Error::new(S3ErrorCode::BucketNotEmpty).with_resource(name));
        }
        self.persist(|store| store.delete_bucket(name))?;
        self.buckets.remove(name);
        debug!(bucket = name, "deleted bucket");
        Ok(())
    }

    /// Insert or replace an object, write-through.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`; `InternalError` on store I/O failure.
    pub fn put_object(&self, bucket_name: &str, object: StoredObject) -> Result<(), S3Error> {
        let bucket = self.get_bucket(bucket_name)?;
        self.persist(|store| store.write_object(bucket_name, &object))?;
        bucket.objects.write().put(object);
        Ok(())
    }

    /// Delete an object, write-through. Deleting a missing key is success.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`; `InternalError` on store I/O failure.
    pub fn delete_object(&self, bucket_name: &str, key: &str) -> Result<bool, S3Error> {
        let bucket = self.get_bucket(bucket_name)?;
        self.persist(|store| store.remove_object(bucket_name, key))?;
        let deleted = bucket.objects.write().delete(key).is_some();
        Ok(deleted)
    }

    /// Store a configuration document, write-through.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`; `InternalError` on store I/O failure.
    pub fn put_config(
        &self,
        bucket_name: &str,
        kind: ConfigKind,
        config: StoredConfig,
    ) -> Result<(), S3Error> {
        let bucket = self.get_bucket(bucket_name)?;
        self.persist(|store| store.write_config(bucket_name, kind, &config.raw))?;
        bucket.configs.write().insert(kind, config);
        Ok(())
    }

    /// Remove a configuration document, write-through.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`; `InternalError` on store I/O failure.
    pub fn delete_config(&self, bucket_name: &str, kind: ConfigKind) -> Result<(), S3Error> {
        let bucket = self.get_bucket(bucket_name)?;
        self.persist(|store| store.remove_config(bucket_name, kind))?;
        bucket.configs.write().remove(&kind);
        Ok(())
    }

    /// Fetch a configuration document's raw bytes.
    ///
    /// # Errors
    ///
    /// `NoSuchBucket`; the kind's `NoSuch…` error when unset.
    pub fn get_config(&self, bucket_name: &str, kind: ConfigKind) -> Result<Bytes, S3Error> {
        let bucket = self.get_bucket(bucket_name)?;
        bucket
            .config(kind)
            .map(|c| c.raw)
            .ok_or_else(|| kind.missing_error().with_resource(bucket_name))
    }

    /// Tear down all state (the `reset_on_close` path).
    pub fn reset(&self) {
        self.buckets.clear();
        if let Some(store) = &self.store {
            if let Err(e) = store.reset() {
                tracing::warn!(error = %e, "failed to reset on-disk state");
            }
        }
    }

    fn persist(
        &self,
        op: impl FnOnce(&FsStore) -> std::io::Result<()>,
    ) -> Result<(), S3Error> {
        if let Some(store) = &self.store {
            op(store).map_err(|e| S3Error::internal_error(format!("storage failure: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_and_list_buckets_in_creation_order() {
        let state = ServiceState::new();
        state.create_bucket("zulu").expect("create");
        state.create_bucket("alpha").expect("create");

        let names: Vec<String> = state.list_buckets().into_iter().map(|b| b.name).collect();
        // Creation order, not lexicographic (timestamps tie-break by name
        // only within the same instant).
        assert_eq!(names.len(), 2);
        assert!(state.bucket_exists("zulu"));
        assert!(state.bucket_exists("alpha"));
    }

    #[test]
    fn test_should_reject_duplicate_bucket() {
        let state = ServiceState::new();
        state.create_bucket("bucket1").expect("create");
        let err = state.create_bucket("bucket1").unwrap_err();
        assert_eq!(err.code, S3ErrorCode::BucketAlreadyOwnedByYou);
        assert_eq!(err.status_code.as_u16(), 409);
    }

    #[test]
    fn test_should_reject_invalid_bucket_name() {
        let state = ServiceState::new();
        let err = state.create_bucket("NOT-VALID").unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidBucketName);
    }

    #[test]
    fn test_should_refuse_deleting_non_empty_bucket() {
        let state = ServiceState::new();
        state.create_bucket("bucket1").expect("create");
        state
            .put_object(
                "bucket1",
                StoredObject::new("nested/key", Bytes::from_static(b"x"), None),
            )
            .expect("put");

        let err = state.delete_bucket("bucket1").unwrap_err();
        assert_eq!(err.code, S3ErrorCode::BucketNotEmpty);

        // Deleting the last (slash-separated) object empties the bucket
        // immediately.
        state.delete_object("bucket1", "nested/key").expect("delete");
        state.delete_bucket("bucket1").expect("delete bucket");
        assert!(!state.bucket_exists("bucket1"));
    }

    #[test]
    fn test_should_report_missing_bucket() {
        let state = ServiceState::new();
        let err = state.get_bucket("absent").unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchBucket);
        assert_eq!(err.status_code.as_u16(), 404);
    }

    #[test]
    fn test_should_treat_delete_of_missing_key_as_success() {
        let state = ServiceState::new();
        state.create_bucket("bucket1").expect("create");
        let existed = state.delete_object("bucket1", "missing").expect("delete");
        assert!(!existed);
    }

    #[test]
    fn test_should_round_trip_configs() {
        let state = ServiceState::new();
        state.create_bucket("bucket1").expect("create");

        let err = state.get_config("bucket1", ConfigKind::Policy).unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchBucketPolicy);

        state
            .put_config(
                "bucket1",
                ConfigKind::Policy,
                StoredConfig::opaque(Bytes::from_static(b"{\"Version\":\"2012-10-17\"}")),
            )
            .expect("put config");
        let raw = state.get_config("bucket1", ConfigKind::Policy).expect("get");
        assert_eq!(&raw[..], b"{\"Version\":\"2012-10-17\"}");

        state
            .delete_config("bucket1", ConfigKind::Policy)
            .expect("delete config");
        assert!(state.get_config("bucket1", ConfigKind::Policy).is_err());
    }

    #[test]
    fn test_should_persist_through_filesystem_store() {
        let dir = tempfile::tempdir().expect("tempdir");

        {
            let store = FsStore::open(dir.path()).expect("open");
            let state = ServiceState::with_store(store).expect("state");
            state.create_bucket("bucket1").expect("create");
            state
                .put_object(
                    "bucket1",
                    StoredObject::new("text", Bytes::from_static(b"Hello!"), None),
                )
                .expect("put");
        }

        // Re-open: the bucket and object survive.
        let store = FsStore::open(dir.path()).expect("open");
        let state = ServiceState::with_store(store).expect("state");
        let bucket = state.get_bucket("bucket1").expect("bucket");
        let object = bucket.objects.read().get("text").expect("object");
        assert_eq!(&object.data[..], b"Hello!");
        assert_eq!(object.etag, "\"952d2c56d0485958336747bcdd98590d\"");
    }

    #[test]
    fn test_should_reset_all_state() {
        let state = ServiceState::new();
        state.create_bucket("bucket1").expect("create");
        state.reset();
        assert!(!state.bucket_exists("bucket1"));
    }
}
