//! The sorted key store and the paged listing engine.
//!
//! Keys live in a `BTreeMap`, so iteration is always in lexicographic byte
//! order — the order the listing protocol is defined over. The listing
//! walk applies, in order: the exclusive starting point (marker /
//! start-after / decoded continuation token), the prefix filter, delimiter
//! grouping into common prefixes (each emitted at most once), and the
//! effective page cap. Both `Contents` and `CommonPrefixes` count against
//! the cap.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::ops::Bound;
use std::sync::Arc;

use super::object::StoredObject;

/// One page of a listing walk.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Matched objects, in key order.
    pub objects: Vec<Arc<StoredObject>>,
    /// Collapsed common prefixes, in first-occurrence (key) order.
    pub common_prefixes: Vec<String>,
    /// Whether candidates remain past the cap.
    pub is_truncated: bool,
    /// The last emitted item — object key or common prefix, whichever came
    /// last. Feeds v1 `NextMarker` and v2 continuation tokens.
    pub last_emitted: Option<String>,
}

/// The per-bucket object map.
#[derive(Debug, Default)]
pub struct KeyStore {
    objects: BTreeMap<String, Arc<StoredObject>>,
}

impl KeyStore {
    /// Insert or replace an object. Returns the previous object if any.
    pub fn put(&mut self, object: StoredObject) -> Option<Arc<StoredObject>> {
        self.objects.insert(object.key.clone(), Arc::new(object))
    }

    /// Get an object by exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<StoredObject>> {
        self.objects.get(key).cloned()
    }

    /// Whether the exact key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Remove an object by key. Returns the removed object if any.
    pub fn delete(&mut self, key: &str) -> Option<Arc<StoredObject>> {
        self.objects.remove(key)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects. Immediately true after the last
    /// object is deleted, whatever `/` separators its key contained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate all objects in key order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<StoredObject>> {
        self.objects.values()
    }

    /// Walk one listing page.
    ///
    /// `start_after` is exclusive: the walk begins at the first key
    /// strictly greater. `max_keys` is the effective cap (already clamped
    /// by the caller); zero yields an empty, non-truncated page.
    #[must_use]
    pub fn list(
        &self,
        prefix: &str,
        delimiter: &str,
        start_after: &str,
        max_keys: usize,
    ) -> ListPage {
        let mut page = ListPage::default();
        if max_keys == 0 {
            return page;
        }

        let mut seen_prefixes: HashSet<String> = HashSet::new();
        let mut emitted = 0usize;

        let range = if start_after.is_empty() {
            self.objects.range::<String, _>(..)
        } else {
            self.objects
                .range::<str, _>((Bound::Excluded(start_after), Bound::Unbounded))
        };

        for (key, object) in range {
            if !key.starts_with(prefix) {
                // Keys sort byte-wise; once past every key carrying the
                // prefix there is nothing left to find.
                if key.as_str() > prefix && !prefix.is_empty() {
                    break;
                }
                continue;
            }

            if !delimiter.is_empty() {
                let rest = &key[prefix.len()..];
                if let Some(pos) = rest.find(delimiter) {
                    let common = format!("{prefix}{}", &rest[..pos + delimiter.len()]);
                    if seen_prefixes.contains(&common) {
                        // Already collapsed into an emitted prefix.
                        continue;
                    }
                    if emitted >= max_keys {
                        page.is_truncated = true;
                        break;
                    }
                    seen_prefixes.insert(common.clone());
                    page.common_prefixes.push(common.clone());
                    page.last_emitted = Some(common);
                    emitted += 1;
                    continue;
                }
            }

            if emitted >= max_keys {
                page.is_truncated = true;
                break;
            }
            page.last_emitted = Some(key.clone());
            page.objects.push(Arc::clone(object));
            emitted += 1;
        }

        page
    }
}
