//! Plain data types shared across the server.
//!
//! These are deliberately small hand-written structs (not a generated DTO
//! surface): the store, the configuration engines, the XML codec, and the
//! HTTP layer all exchange these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// The canonical owner echoed on every resource.
///
/// This server has a single fixed owner; ACLs are stored but never enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Canonical user ID.
    pub id: String,
    /// Display name.
    pub display_name: String,
}

impl Default for Owner {
    fn default() -> Self {
        Self {
            id: "123456789000".to_owned(),
            display_name: "S3rver".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Buckets and objects
// ---------------------------------------------------------------------------

/// A bucket entry in a `ListBuckets` response.
#[derive(Debug, Clone)]
pub struct BucketSummary {
    /// The bucket name.
    pub name: String,
    /// When the bucket was created.
    pub creation_date: DateTime<Utc>,
}

/// An object entry in a listing response.
#[derive(Debug, Clone)]
pub struct ObjectSummary {
    /// The object key.
    pub key: String,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// The quoted ETag.
    pub etag: String,
    /// Object size in bytes.
    pub size: u64,
    /// The object owner.
    pub owner: Owner,
}

/// A single `{Key, Value}` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// The tag key.
    pub key: String,
    /// The tag value.
    pub value: String,
}

/// A tag set as carried by `?tagging` requests and responses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tagging {
    /// The ordered tag list.
    pub tag_set: Vec<Tag>,
}

/// The `MetadataDirective` of a CopyObject request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataDirective {
    /// Carry source metadata over (the default).
    #[default]
    Copy,
    /// Substitute the metadata supplied on the copy request.
    Replace,
}

impl MetadataDirective {
    /// Parse the `x-amz-metadata-directive` header value.
    ///
    /// Unknown values are invalid arguments per the S3 API.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COPY" => Some(Self::Copy),
            "REPLACE" => Some(Self::Replace),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Listing inputs and outputs
// ---------------------------------------------------------------------------

/// Parameters of a `ListObjects` (v1) request.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsInput {
    /// Restrict keys to this byte-prefix.
    pub prefix: Option<String>,
    /// Group keys sharing the same prefix up to this delimiter.
    pub delimiter: Option<String>,
    /// Start listing strictly after this key.
    pub marker: Option<String>,
    /// Requested page size (clamped to 1000; echoed verbatim).
    pub max_keys: Option<i64>,
}

/// Parameters of a `ListObjectsV2` request.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsV2Input {
    /// Restrict keys to this byte-prefix.
    pub prefix: Option<String>,
    /// Group keys sharing the same prefix up to this delimiter.
    pub delimiter: Option<String>,
    /// Opaque cursor from a previous truncated response.
    pub continuation_token: Option<String>,
    /// Start listing strictly after this key (ignored when a token is given).
    pub start_after: Option<String>,
    /// Requested page size (clamped to 1000; echoed verbatim).
    pub max_keys: Option<i64>,
}

/// A `ListObjects` (v1) response document.
#[derive(Debug, Clone)]
pub struct ListObjectsOutput {
    /// The bucket name.
    pub name: String,
    /// The prefix echoed back.
    pub prefix: Option<String>,
    /// The delimiter echoed back.
    pub delimiter: Option<String>,
    /// The marker echoed back.
    pub marker: Option<String>,
    /// The `MaxKeys` value as supplied (or the 1000 default).
    pub max_keys: i64,
    /// Whether more keys remain past the cap.
    pub is_truncated: bool,
    /// Emitted only when a delimiter was supplied and the result is
    /// truncated: the last emitted key or common prefix.
    pub next_marker: Option<String>,
    /// The matched objects.
    pub contents: Vec<ObjectSummary>,
    /// The collapsed common prefixes, each emitted once.
    pub common_prefixes: Vec<String>,
}

/// A `ListObjectsV2` response document.
#[derive(Debug, Clone)]
pub struct ListObjectsV2Output {
    /// The bucket name.
    pub name: String,
    /// The prefix echoed back.
    pub prefix: Option<String>,
    /// The delimiter echoed back.
    pub delimiter: Option<String>,
    /// The continuation token echoed back.
    pub continuation_token: Option<String>,
    /// The `start-after` value echoed back.
    pub start_after: Option<String>,
    /// The `MaxKeys` value as supplied (or the 1000 default).
    pub max_keys: i64,
    /// Count of `Contents` plus `CommonPrefixes`.
    pub key_count: i64,
    /// Whether more keys remain past the cap.
    pub is_truncated: bool,
    /// Cursor for the next page; present whenever truncated.
    pub next_continuation_token: Option<String>,
    /// The matched objects.
    pub contents: Vec<ObjectSummary>,
    /// The collapsed common prefixes, each emitted once.
    pub common_prefixes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

/// One part of a completed multipart upload, as listed by the client in the
/// `CompleteMultipartUpload` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    /// The part number (1..=10000).
    pub part_number: u32,
    /// The part's ETag as returned by `UploadPart`.
    pub etag: String,
}

/// The parsed body of a `CompleteMultipartUpload` request.
#[derive(Debug, Clone, Default)]
pub struct CompletedMultipartUpload {
    /// The parts in the order the client listed them.
    pub parts: Vec<CompletedPart>,
}

/// An in-progress upload in a `ListMultipartUploads` response.
#[derive(Debug, Clone)]
pub struct MultipartUploadSummary {
    /// The upload ID.
    pub upload_id: String,
    /// The target key.
    pub key: String,
    /// When the upload was initiated.
    pub initiated: DateTime<Utc>,
    /// The initiating owner.
    pub owner: Owner,
}

/// A `ListMultipartUploads` response document.
#[derive(Debug, Clone)]
pub struct ListMultipartUploadsOutput {
    /// The bucket name.
    pub bucket: String,
    /// The key marker echoed back.
    pub key_marker: Option<String>,
    /// The upload-id marker echoed back.
    pub upload_id_marker: Option<String>,
    /// The `max-uploads` value as supplied (or the 1000 default).
    pub max_uploads: i64,
    /// Whether more uploads remain past the cap.
    pub is_truncated: bool,
    /// Key marker for the next page.
    pub next_key_marker: Option<String>,
    /// Upload-id marker for the next page.
    pub next_upload_id_marker: Option<String>,
    /// The prefix echoed back.
    pub prefix: Option<String>,
    /// The in-progress uploads.
    pub uploads: Vec<MultipartUploadSummary>,
}

/// One uploaded part in a `ListParts` response.
#[derive(Debug, Clone)]
pub struct PartSummary {
    /// The part number.
    pub part_number: u32,
    /// The part's quoted ETag.
    pub etag: String,
    /// Part size in bytes.
    pub size: u64,
    /// When the part was uploaded.
    pub last_modified: DateTime<Utc>,
}

/// A `ListParts` response document.
#[derive(Debug, Clone)]
pub struct ListPartsOutput {
    /// The bucket name.
    pub bucket: String,
    /// The target key.
    pub key: String,
    /// The upload ID.
    pub upload_id: String,
    /// The part-number marker echoed back.
    pub part_number_marker: Option<u32>,
    /// Part-number marker for the next page.
    pub next_part_number_marker: Option<u32>,
    /// The `max-parts` value as supplied (or the 1000 default).
    pub max_parts: i64,
    /// Whether more parts remain past the cap.
    pub is_truncated: bool,
    /// The uploaded parts in ascending part-number order.
    pub parts: Vec<PartSummary>,
    /// The initiating owner.
    pub owner: Owner,
}

// ---------------------------------------------------------------------------
// DeleteObjects
// ---------------------------------------------------------------------------

/// One key named in a `DeleteObjects` request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentifier {
    /// The key to delete.
    pub key: String,
}

/// The parsed body of a `DeleteObjects` request.
#[derive(Debug, Clone, Default)]
pub struct DeleteRequest {
    /// The keys to delete.
    pub objects: Vec<ObjectIdentifier>,
    /// Whether to suppress the `<Deleted>` entries in the response.
    pub quiet: bool,
}

/// One entry of a `DeleteObjects` response.
#[derive(Debug, Clone)]
pub struct DeletedObject {
    /// The deleted (or already absent) key.
    pub key: String,
}

/// A failed deletion in a `DeleteObjects` response.
#[derive(Debug, Clone)]
pub struct DeleteErrorEntry {
    /// The key that failed.
    pub key: String,
    /// The error code.
    pub code: String,
    /// The error message.
    pub message: String,
}

/// A `DeleteObjects` response document.
#[derive(Debug, Clone, Default)]
pub struct DeleteResult {
    /// Every requested key, including keys that did not exist.
    pub deleted: Vec<DeletedObject>,
    /// Per-key failures.
    pub errors: Vec<DeleteErrorEntry>,
}

// ---------------------------------------------------------------------------
// CORS configuration
// ---------------------------------------------------------------------------

/// A single CORS rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsRule {
    /// Allowed HTTP methods; each must be one of GET/PUT/POST/DELETE/HEAD.
    pub allowed_methods: Vec<String>,
    /// Allowed origins; each may contain at most one `*`.
    pub allowed_origins: Vec<String>,
    /// Allowed request headers; each may contain at most one `*`.
    pub allowed_headers: Vec<String>,
    /// Response headers the browser may access.
    pub expose_headers: Vec<String>,
    /// How long the browser may cache a preflight result.
    pub max_age_seconds: Option<i64>,
}

/// An ordered CORS configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsConfiguration {
    /// The rules, evaluated first-match-wins.
    pub rules: Vec<CorsRule>,
}

// ---------------------------------------------------------------------------
// Website configuration
// ---------------------------------------------------------------------------

/// A redirect protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Plain HTTP.
    Http,
    /// HTTPS.
    Https,
}

impl Protocol {
    /// The scheme string (`http` / `https`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Parse a `<Protocol>` element value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

/// The condition under which a routing rule fires.
///
/// At least one of the two fields is present in a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingCondition {
    /// Fires when the requested key has this prefix.
    pub key_prefix_equals: Option<String>,
    /// Fires when the would-be error status equals this code.
    pub http_error_code_returned_equals: Option<u16>,
}

/// The redirect a routing rule produces.
///
/// `replace_key_with` and `replace_key_prefix_with` are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingRedirect {
    /// Redirect scheme; defaults to the request's.
    pub protocol: Option<Protocol>,
    /// Redirect host; defaults to the request's.
    pub host_name: Option<String>,
    /// Replace the matched prefix with this string.
    pub replace_key_prefix_with: Option<String>,
    /// Replace the whole key with this string.
    pub replace_key_with: Option<String>,
    /// Redirect status code; defaults to 301.
    pub http_redirect_code: Option<u16>,
}

/// One website routing rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingRule {
    /// When absent, the rule always matches.
    pub condition: Option<RoutingCondition>,
    /// The redirect to produce on match.
    pub redirect: RoutingRedirect,
}

/// Redirect every request to another host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAllRequestsTo {
    /// The target host.
    pub host_name: String,
    /// The target scheme; defaults to the request's.
    pub protocol: Option<Protocol>,
}

/// A bucket's static-website configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebsiteConfiguration {
    /// The index-document suffix appended to directory-style keys.
    pub index_document_suffix: Option<String>,
    /// The key served (with the original error status) when a request fails.
    pub error_document_key: Option<String>,
    /// When set, every request redirects and all other fields are ignored.
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    /// Conditional redirects, evaluated first-match-wins.
    pub routing_rules: Vec<RoutingRule>,
}
