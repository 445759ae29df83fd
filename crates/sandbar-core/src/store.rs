//! Filesystem persistence.
//!
//! Layout under the configured root:
//!
//! ```text
//! <root>/<bucket>/.bucket.json            creation metadata
//! <root>/<bucket>/objects/<enc-key>       content bytes
//! <root>/<bucket>/objects/<enc-key>.meta.json   sidecar metadata
//! <root>/<bucket>/configs/<kind>.xml      configuration documents
//! ```
//!
//! Keys are percent-encoded into single file names (slashes included), so
//! `text` and `text/` stay distinct, nested keys leave no directory
//! residue behind on delete, and emptiness is a plain directory listing.
//! The sidecar carries everything the content bytes don't: ETag, content
//! type, timestamps, user metadata, redirect location, and tags.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sandbar_model::types::Tag;

use crate::state::bucket::ConfigKind;
use crate::state::object::StoredObject;

/// Everything except `[A-Za-z0-9_-]` is encoded, `/` and `.` included, so
/// an encoded key is always a single safe file name.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Suffix of object sidecar files.
const SIDECAR_SUFFIX: &str = ".meta.json";

/// Bucket-level metadata file name.
const BUCKET_META: &str = ".bucket.json";

/// Serialized object metadata.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectSidecar {
    etag: String,
    content_type: String,
    last_modified: DateTime<Utc>,
    #[serde(default)]
    metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    website_redirect_location: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
}

/// Serialized bucket metadata.
#[derive(Debug, Serialize, Deserialize)]
struct BucketSidecar {
    created: DateTime<Utc>,
}

/// A bucket reloaded from disk.
#[derive(Debug)]
pub struct LoadedBucket {
    /// The bucket name.
    pub name: String,
    /// The persisted creation time.
    pub created: DateTime<Utc>,
    /// All persisted objects.
    pub objects: Vec<StoredObject>,
    /// All persisted configuration documents.
    pub configs: Vec<(ConfigKind, Bytes)>,
}

/// The filesystem store.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (creating if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// I/O errors creating the root directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load every persisted bucket.
    ///
    /// # Errors
    ///
    /// I/O errors walking the tree. Unreadable individual entries are
    /// skipped with a warning rather than failing the whole load.
    pub fn load_buckets(&self) -> io::Result<Vec<LoadedBucket>> {
        let mut buckets = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            buckets.push(self.load_bucket(&name)?);
        }

        buckets.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
        Ok(buckets)
    }

    fn load_bucket(&self, name: &str) -> io::Result<LoadedBucket> {
        let dir = self.bucket_dir(name);

        let created = fs::read(dir.join(BUCKET_META))
            .ok()
            .and_then(|raw| serde_json::from_slice::<BucketSidecar>(&raw).ok())
            .map_or_else(Utc::now, |meta| meta.created);

        let mut objects = Vec::new();
        let objects_dir = dir.join("objects");
        if objects_dir.is_dir() {
            for entry in fs::read_dir(&objects_dir)? {
                let entry = entry?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if file_name.ends_with(SIDECAR_SUFFIX) {
                    continue;
                }
                match self.load_object(&objects_dir, &file_name) {
                    Ok(object) => objects.push(object),
                    Err(e) => {
                        warn!(bucket = name, file = %file_name, error = %e, "skipping unreadable object");
                    }
                }
            }
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        let mut configs = Vec::new();
        let configs_dir = dir.join("configs");
        if configs_dir.is_dir() {
            for entry in fs::read_dir(&configs_dir)? {
                let entry = entry?;
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let kind_name = file_name.strip_suffix(".xml").unwrap_or(&file_name);
                if let Some(kind) = ConfigKind::from_name(kind_name) {
                    configs.push((kind, Bytes::from(fs::read(entry.path())?)));
                }
            }
        }

        debug!(bucket = name, objects = objects.len(), configs = configs.len(), "loaded bucket");

        Ok(LoadedBucket {
            name: name.to_owned(),
            created,
            objects,
            configs,
        })
    }

    fn load_object(&self, objects_dir: &Path, file_name: &str) -> io::Result<StoredObject> {
        let key = decode_key(file_name).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("undecodable object file name: {file_name}"),
            )
        })?;
        let data = Bytes::from(fs::read(objects_dir.join(file_name))?);
        let sidecar_path = objects_dir.join(format!("{file_name}{SIDECAR_SUFFIX}"));
        let sidecar: ObjectSidecar = serde_json::from_slice(&fs::read(sidecar_path)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(StoredObject {
            key,
            size: data.len() as u64,
            data,
            etag: sidecar.etag,
            content_type: sidecar.content_type,
            last_modified: sidecar.last_modified,
            metadata: sidecar.metadata,
            website_redirect_location: sidecar.website_redirect_location,
            tags: sidecar.tags,
        })
    }

    /// Persist a new bucket.
    ///
    /// # Errors
    ///
    /// I/O errors creating the directories.
    pub fn create_bucket(&self, name: &str, created: DateTime<Utc>) -> io::Result<()> {
        let dir = self.bucket_dir(name);
        fs::create_dir_all(dir.join("objects"))?;
        fs::create_dir_all(dir.join("configs"))?;
        let meta = serde_json::to_vec(&BucketSidecar { created })
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(dir.join(BUCKET_META), meta)
    }

    /// Remove a bucket and everything under it.
    ///
    /// # Errors
    ///
    /// I/O errors removing the tree.
    pub fn delete_bucket(&self, name: &str) -> io::Result<()> {
        match fs::remove_dir_all(self.bucket_dir(name)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Persist an object's content and sidecar.
    ///
    /// # Errors
    ///
    /// I/O errors writing the files.
    pub fn write_object(&self, bucket: &str, object: &StoredObject) -> io::Result<()> {
        let objects_dir = self.bucket_dir(bucket).join("objects");
        fs::create_dir_all(&objects_dir)?;
        let file_name = encode_key(&object.key);

        fs::write(objects_dir.join(&file_name), &object.data)?;

        let sidecar = ObjectSidecar {
            etag: object.etag.clone(),
            content_type: object.content_type.clone(),
            last_modified: object.last_modified,
            metadata: object.metadata.clone(),
            website_redirect_location: object.website_redirect_location.clone(),
            tags: object.tags.clone(),
        };
        let raw = serde_json::to_vec(&sidecar)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(objects_dir.join(format!("{file_name}{SIDECAR_SUFFIX}")), raw)
    }

    /// Remove an object's content and sidecar.
    ///
    /// # Errors
    ///
    /// I/O errors removing the files.
    pub fn remove_object(&self, bucket: &str, key: &str) -> io::Result<()> {
        let objects_dir = self.bucket_dir(bucket).join("objects");
        let file_name = encode_key(key);
        for path in [
            objects_dir.join(&file_name),
            objects_dir.join(format!("{file_name}{SIDECAR_SUFFIX}")),
        ] {
            match fs::remove_file(path) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
                Ok(()) => {}
            }
        }
        Ok(())
    }

    /// Persist a configuration document.
    ///
    /// # Errors
    ///
    /// I/O errors writing the file.
    pub fn write_config(&self, bucket: &str, kind: ConfigKind, raw: &[u8]) -> io::Result<()> {
        let configs_dir = self.bucket_dir(bucket).join("configs");
        fs::create_dir_all(&configs_dir)?;
        fs::write(configs_dir.join(format!("{}.xml", kind.as_str())), raw)
    }

    /// Remove a configuration document.
    ///
    /// # Errors
    ///
    /// I/O errors removing the file.
    pub fn remove_config(&self, bucket: &str, kind: ConfigKind) -> io::Result<()> {
        let path = self
            .bucket_dir(bucket)
            .join("configs")
            .join(format!("{}.xml", kind.as_str()));
        match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Delete everything under the root (the `reset_on_close` teardown).
    ///
    /// # Errors
    ///
    /// I/O errors removing entries.
    pub fn reset(&self) -> io::Result<()> {
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn bucket_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Encode an object key into a single safe file name.
#[must_use]
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

/// Decode a file name back into an object key.
#[must_use]
pub fn decode_key(file_name: &str) -> Option<String> {
    percent_decode_str(file_name)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}
