//! Request routing: addressing resolution and operation identification.
//!
//! The [`S3Router`] maps an incoming HTTP request to `(bucket, key,
//! operation)` under four addressing conventions:
//!
//! - **Path-style**: `Host` is the service endpoint (or an IP); the bucket
//!   is the first path segment, the key the remainder.
//! - **Virtual-hosted-style**: `Host` = `<bucket>.<serviceEndpoint>`; the
//!   key is the full path.
//! - **CNAME / bucket-host**: `Host` literally names an existing bucket.
//! - **Website endpoint**: `Host` carries an `s3-website-` label; requests
//!   resolved here are shaped by the website engine instead of the XML API.
//!
//! Sub-resource query parameters (`?uploads`, `?uploadId`, `?tagging`,
//! `?cors`, `?website`, `?location`, `?policy`, …) then select the concrete
//! operation.

use http::Method;
use percent_encoding::percent_decode_str;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::operations::S3Operation;

/// How the request addressed its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressingStyle {
    /// Bucket in the first path segment.
    #[default]
    Path,
    /// Bucket as a subdomain of the service endpoint.
    VirtualHost,
    /// Host header literally names a bucket.
    BucketCname,
}

/// Configuration for request routing.
#[derive(Debug, Clone)]
pub struct S3Router {
    /// The host suffix used for virtual-hosted addressing
    /// (e.g. `s3.amazonaws.com`).
    pub service_endpoint: String,
    /// Whether virtual-hosted-style and CNAME bucket addressing are enabled.
    pub vhost_buckets: bool,
    /// Optional mount prefix stripped from every path before routing.
    pub base_path: Option<String>,
}

/// The result of routing a request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    /// The resolved bucket name, if any.
    pub bucket: Option<String>,
    /// The resolved object key, if any.
    pub key: Option<String>,
    /// The identified operation.
    pub operation: S3Operation,
    /// Parsed, percent-decoded query parameters.
    pub query_params: Vec<(String, String)>,
    /// How the bucket was addressed.
    pub addressing: AddressingStyle,
    /// Whether the request arrived via the website endpoint.
    pub website: bool,
    /// Whether the request carried a valid signature. Filled in by the
    /// service after authentication.
    pub signed: bool,
}

impl S3Router {
    /// Create a new router.
    #[must_use]
    pub fn new(service_endpoint: impl Into<String>, vhost_buckets: bool) -> Self {
        Self {
            service_endpoint: service_endpoint.into(),
            vhost_buckets,
            base_path: None,
        }
    }

    /// Set a mount prefix stripped from request paths.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base = base_path.into();
        self.base_path = (!base.is_empty() && base != "/").then(|| {
            let trimmed = base.trim_end_matches('/');
            if trimmed.starts_with('/') {
                trimmed.to_owned()
            } else {
                format!("/{trimmed}")
            }
        });
        self
    }

    /// Resolve an HTTP request into a [`RoutingContext`].
    ///
    /// `bucket_exists` backs CNAME addressing: a Host header that literally
    /// names a known bucket selects that bucket.
    ///
    /// # Errors
    ///
    /// Returns an `S3Error` when the request falls outside the mount prefix
    /// or uses an unsupported method.
    pub fn resolve<B>(
        &self,
        req: &http::Request<B>,
        bucket_exists: &dyn Fn(&str) -> bool,
    ) -> Result<RoutingContext, S3Error> {
        let method = req.method();
        let uri = req.uri();
        let headers = req.headers();

        let mut path = uri.path();
        if let Some(base) = &self.base_path {
            match strip_base_path(path, base) {
                Some(rest) => path = rest,
                None => {
                    return Err(S3Error::with_message(
                        S3ErrorCode::NoSuchBucket,
                        "The specified bucket does not exist",
                    )
                    .with_resource(path));
                }
            }
        }

        let query_params = parse_query_params(uri.query().unwrap_or(""));

        let host = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(|h| h.split(':').next().unwrap_or(h).to_owned())
            .unwrap_or_default();

        let (bucket, key, addressing, website) =
            self.resolve_addressing(&host, path, bucket_exists);

        let operation = if *method == Method::OPTIONS {
            S3Operation::Preflight
        } else {
            identify_operation(method, bucket.as_ref(), key.as_ref(), &query_params, headers)?
        };

        Ok(RoutingContext {
            bucket,
            key,
            operation,
            query_params,
            addressing,
            website,
            signed: false,
        })
    }

    /// Resolve the bucket/key from Host and path.
    fn resolve_addressing(
        &self,
        host: &str,
        path: &str,
        bucket_exists: &dyn Fn(&str) -> bool,
    ) -> (Option<String>, Option<String>, AddressingStyle, bool) {
        // Website endpoint, virtual-hosted form: <bucket>.s3-website-….
        if let Some(dot) = host.find(".s3-website") {
            let bucket = &host[..dot];
            if !bucket.is_empty() {
                let key = key_from_full_path(path);
                return (
                    Some(bucket.to_owned()),
                    key,
                    AddressingStyle::VirtualHost,
                    true,
                );
            }
        }
        // Website endpoint, path-style: s3-website-<region>… host.
        if host.starts_with("s3-website") {
            let (bucket, key) = parse_path(path);
            return (bucket, key, AddressingStyle::Path, true);
        }

        if self.vhost_buckets {
            // Virtual-hosted-style: <bucket>.<serviceEndpoint>.
            let suffix = format!(".{}", self.service_endpoint);
            if host.len() > suffix.len() && host.ends_with(&suffix) {
                let bucket = &host[..host.len() - suffix.len()];
                if !bucket.is_empty() && !bucket.contains('.') {
                    let key = key_from_full_path(path);
                    return (
                        Some(bucket.to_owned()),
                        key,
                        AddressingStyle::VirtualHost,
                        false,
                    );
                }
            }

            // CNAME: Host literally names an existing bucket.
            if !host.is_empty()
                && host != self.service_endpoint
                && !is_ip_like(host)
                && host != "localhost"
                && bucket_exists(host)
            {
                let key = key_from_full_path(path);
                return (
                    Some(host.to_owned()),
                    key,
                    AddressingStyle::BucketCname,
                    false,
                );
            }
        }

        // Path-style.
        let (bucket, key) = parse_path(path);
        (bucket, key, AddressingStyle::Path, false)
    }
}

/// Strip the mount prefix, keeping the leading slash of the remainder.
fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        Some("/")
    } else if rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Extract a key from the full path of a vhost/CNAME/website request.
fn key_from_full_path(path: &str) -> Option<String> {
    let raw = path.strip_prefix('/').unwrap_or(path);
    if raw.is_empty() {
        None
    } else {
        Some(decode_uri_component(raw))
    }
}

/// Parse a path-style path into `(bucket, key)`.
fn parse_path(path: &str) -> (Option<String>, Option<String>) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return (None, None);
    }

    if let Some(pos) = trimmed.find('/') {
        let bucket = decode_uri_component(&trimmed[..pos]);
        let key_raw = &trimmed[pos + 1..];
        let key = if key_raw.is_empty() {
            None
        } else {
            Some(decode_uri_component(key_raw))
        };
        (Some(bucket), key)
    } else {
        (Some(decode_uri_component(trimmed)), None)
    }
}

/// Whether the host looks like an IPv4 address.
fn is_ip_like(host: &str) -> bool {
    !host.is_empty()
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_digit()))
}

/// Decode a percent-encoded URI component.
fn decode_uri_component(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Parse a query string into percent-decoded key-value pairs.
pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }

    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            if let Some(pos) = pair.find('=') {
                (
                    decode_uri_component(&pair[..pos]),
                    decode_uri_component(&pair[pos + 1..].replace('+', " ")),
                )
            } else {
                (decode_uri_component(pair), String::new())
            }
        })
        .collect()
}

fn query_has_key(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Identify the operation from method, path structure, query, and headers.
fn identify_operation(
    method: &Method,
    bucket: Option<&String>,
    key: Option<&String>,
    query_params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    match (method, bucket.is_some(), key.is_some()) {
        (&Method::GET, false, false) => Ok(S3Operation::ListBuckets),

        (method, true, false) => identify_bucket_operation(method, query_params),
        (method, true, true) => identify_object_operation(method, query_params, headers),

        (_, false, true) => Err(S3Error::with_message(
            S3ErrorCode::InvalidRequest,
            "Object key specified without bucket",
        )),
        (_, false, false) => Err(S3Error::with_message(
            S3ErrorCode::MethodNotAllowed,
            "Only GET is allowed at the service level",
        )),
    }
}

fn identify_bucket_operation(
    method: &Method,
    params: &[(String, String)],
) -> Result<S3Operation, S3Error> {
    match *method {
        Method::GET => Ok(identify_bucket_get(params)),
        Method::PUT => Ok(identify_bucket_put(params)),
        Method::DELETE => Ok(identify_bucket_delete(params)),
        Method::HEAD => Ok(S3Operation::HeadBucket),
        Method::POST => {
            if query_has_key(params, "delete") {
                Ok(S3Operation::DeleteObjects)
            } else {
                // POST to a bucket without ?delete is a browser form upload.
                Ok(S3Operation::PostObject)
            }
        }
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}

fn identify_bucket_get(params: &[(String, String)]) -> S3Operation {
    if query_value(params, "list-type") == Some("2") {
        return S3Operation::ListObjectsV2;
    }
    if query_has_key(params, "location") {
        return S3Operation::GetBucketLocation;
    }
    if query_has_key(params, "cors") {
        return S3Operation::GetBucketCors;
    }
    if query_has_key(params, "website") {
        return S3Operation::GetBucketWebsite;
    }
    if query_has_key(params, "policy") {
        return S3Operation::GetBucketPolicy;
    }
    if query_has_key(params, "lifecycle") {
        return S3Operation::GetBucketLifecycle;
    }
    if query_has_key(params, "tagging") {
        return S3Operation::GetBucketTagging;
    }
    if query_has_key(params, "acl") {
        return S3Operation::GetBucketAcl;
    }
    if query_has_key(params, "uploads") {
        return S3Operation::ListMultipartUploads;
    }
    S3Operation::ListObjects
}

fn identify_bucket_put(params: &[(String, String)]) -> S3Operation {
    if query_has_key(params, "cors") {
        return S3Operation::PutBucketCors;
    }
    if query_has_key(params, "website") {
        return S3Operation::PutBucketWebsite;
    }
    if query_has_key(params, "policy") {
        return S3Operation::PutBucketPolicy;
    }
    if query_has_key(params, "lifecycle") {
        return S3Operation::PutBucketLifecycle;
    }
    if query_has_key(params, "tagging") {
        return S3Operation::PutBucketTagging;
    }
    if query_has_key(params, "acl") {
        return S3Operation::PutBucketAcl;
    }
    S3Operation::CreateBucket
}

fn identify_bucket_delete(params: &[(String, String)]) -> S3Operation {
    if query_has_key(params, "cors") {
        return S3Operation::DeleteBucketCors;
    }
    if query_has_key(params, "website") {
        return S3Operation::DeleteBucketWebsite;
    }
    if query_has_key(params, "policy") {
        return S3Operation::DeleteBucketPolicy;
    }
    if query_has_key(params, "lifecycle") {
        return S3Operation::DeleteBucketLifecycle;
    }
    if query_has_key(params, "tagging") {
        return S3Operation::DeleteBucketTagging;
    }
    S3Operation::DeleteBucket
}

fn identify_object_operation(
    method: &Method,
    params: &[(String, String)],
    headers: &http::HeaderMap,
) -> Result<S3Operation, S3Error> {
    let has_copy_source = headers.contains_key("x-amz-copy-source");

    match *method {
        Method::GET => {
            if query_has_key(params, "tagging") {
                return Ok(S3Operation::GetObjectTagging);
            }
            if query_has_key(params, "acl") {
                return Ok(S3Operation::GetObjectAcl);
            }
            if query_has_key(params, "uploadId") {
                return Ok(S3Operation::ListParts);
            }
            Ok(S3Operation::GetObject)
        }
        Method::PUT => {
            if query_has_key(params, "tagging") {
                return Ok(S3Operation::PutObjectTagging);
            }
            if query_has_key(params, "acl") {
                return Ok(S3Operation::PutObjectAcl);
            }
            if query_has_key(params, "partNumber") && query_has_key(params, "uploadId") {
                return Ok(if has_copy_source {
                    S3Operation::UploadPartCopy
                } else {
                    S3Operation::UploadPart
                });
            }
            if has_copy_source {
                return Ok(S3Operation::CopyObject);
            }
            Ok(S3Operation::PutObject)
        }
        Method::DELETE => {
            if query_has_key(params, "tagging") {
                return Ok(S3Operation::DeleteObjectTagging);
            }
            if query_has_key(params, "uploadId") {
                return Ok(S3Operation::AbortMultipartUpload);
            }
            Ok(S3Operation::DeleteObject)
        }
        Method::HEAD => Ok(S3Operation::HeadObject),
        Method::POST => {
            if query_has_key(params, "uploads") {
                return Ok(S3Operation::CreateMultipartUpload);
            }
            if query_has_key(params, "uploadId") {
                return Ok(S3Operation::CompleteMultipartUpload);
            }
            Err(S3Error::with_message(
                S3ErrorCode::MethodNotAllowed,
                "The specified method is not allowed against this resource",
            ))
        }
        _ => Err(S3Error::method_not_allowed(method.as_str())),
    }
}
