//! Typed extraction from raw request parts.
//!
//! Handlers work with the routed context plus these helpers instead of
//! poking at headers and query strings directly: listing inputs, user
//! metadata headers, copy-source references, and the signed-only
//! response-header overrides.

use std::collections::HashMap;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{ListObjectsInput, ListObjectsV2Input};

/// The query parameters that override response headers on signed GETs.
///
/// Listed as `(query parameter, response header)`.
pub const RESPONSE_HEADER_OVERRIDES: &[(&str, &str)] = &[
    ("response-content-type", "Content-Type"),
    ("response-content-language", "Content-Language"),
    ("response-expires", "Expires"),
    ("response-cache-control", "Cache-Control"),
    ("response-content-disposition", "Content-Disposition"),
    ("response-content-encoding", "Content-Encoding"),
];

/// Look up a query parameter by name.
#[must_use]
pub fn query_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Whether a query parameter is present (with or without a value).
#[must_use]
pub fn query_has(params: &[(String, String)], key: &str) -> bool {
    params.iter().any(|(k, _)| k == key)
}

/// Parse an integer query parameter.
///
/// # Errors
///
/// `InvalidArgument` when present but not a number.
pub fn query_int(params: &[(String, String)], key: &str) -> Result<Option<i64>, S3Error> {
    match query_value(params, key) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| {
            S3Error::invalid_argument(format!("Provided {key} not an integer or within integer range"))
        }),
    }
}

/// Extract the parameters of a `ListObjects` (v1) request.
///
/// # Errors
///
/// `InvalidArgument` on a non-numeric `max-keys`.
pub fn list_objects_input(params: &[(String, String)]) -> Result<ListObjectsInput, S3Error> {
    Ok(ListObjectsInput {
        prefix: query_value(params, "prefix").map(ToOwned::to_owned),
        delimiter: query_value(params, "delimiter").map(ToOwned::to_owned),
        marker: query_value(params, "marker").map(ToOwned::to_owned),
        max_keys: query_int(params, "max-keys")?,
    })
}

/// Extract the parameters of a `ListObjectsV2` request.
///
/// # Errors
///
/// `InvalidArgument` on a non-numeric `max-keys`.
pub fn list_objects_v2_input(params: &[(String, String)]) -> Result<ListObjectsV2Input, S3Error> {
    Ok(ListObjectsV2Input {
        prefix: query_value(params, "prefix").map(ToOwned::to_owned),
        delimiter: query_value(params, "delimiter").map(ToOwned::to_owned),
        continuation_token: query_value(params, "continuation-token").map(ToOwned::to_owned),
        start_after: query_value(params, "start-after").map(ToOwned::to_owned),
        max_keys: query_int(params, "max-keys")?,
    })
}

/// Collect `x-amz-meta-*` headers into a lowercased metadata map.
#[must_use]
pub fn metadata_from_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    for (name, value) in headers {
        let name = name.as_str().to_lowercase();
        if let Some(meta_key) = name.strip_prefix("x-amz-meta-") {
            if let Ok(value) = value.to_str() {
                metadata.insert(meta_key.to_owned(), value.to_owned());
            }
        }
    }
    metadata
}

/// The request's `Content-Type`, if present.
#[must_use]
pub fn content_type(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// The request's `Content-MD5` header (base64), if present.
#[must_use]
pub fn content_md5(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get("content-md5")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// The declared `Content-Length`, if present and numeric.
#[must_use]
pub fn declared_content_length(headers: &http::HeaderMap) -> Option<u64> {
    headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// The `x-amz-website-redirect-location` header, if present.
#[must_use]
pub fn website_redirect_location(headers: &http::HeaderMap) -> Option<String> {
    headers
        .get("x-amz-website-redirect-location")
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned)
}

/// Parse an `x-amz-copy-source` header into `(bucket, key)`.
///
/// The value is a URL-encoded `/bucket/key` (the leading slash is optional
/// in practice) and must be percent-decoded. A `?versionId=…` suffix is
/// ignored: this server does not keep versions.
///
/// # Errors
///
/// `InvalidArgument` when the value does not name a bucket and key.
pub fn parse_copy_source(value: &str) -> Result<(String, String), S3Error> {
    let value = value.split('?').next().unwrap_or(value);
    let decoded = percent_decode_str(value).decode_utf8_lossy().into_owned();
    let trimmed = decoded.strip_prefix('/').unwrap_or(&decoded);
    let (bucket, key) = trimmed.split_once('/').ok_or_else(|| {
        S3Error::with_message(
            S3ErrorCode::InvalidArgument,
            "Invalid copy source object key",
        )
    })?;
    if bucket.is_empty() || key.is_empty() {
        return Err(S3Error::with_message(
            S3ErrorCode::InvalidArgument,
            "Invalid copy source object key",
        ));
    }
    Ok((bucket.to_owned(), key.to_owned()))
}

/// Collect the response-header overrides present in the query.
#[must_use]
pub fn response_header_overrides(params: &[(String, String)]) -> Vec<(&'static str, String)> {
    RESPONSE_HEADER_OVERRIDES
        .iter()
        .filter_map(|(param, header)| {
            query_value(params, param).map(|v| (*header, v.to_owned()))
        })
        .collect()
}

/// Whether the body uses the AWS streaming (`aws-chunked`) framing.
///
/// SDK managed uploads send PUT bodies framed into signed or trailer-
/// terminated chunks, flagged by `Content-Encoding: aws-chunked` and/or a
/// `STREAMING-*` payload hash.
#[must_use]
pub fn is_aws_chunked(headers: &http::HeaderMap) -> bool {
    let chunked_encoding = headers
        .get(http::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|e| e.trim() == "aws-chunked"));
    let streaming_payload = headers
        .get("x-amz-content-sha256")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("STREAMING-"));
    chunked_encoding || streaming_payload
}

/// The `x-amz-decoded-content-length` header, if present and numeric.
#[must_use]
pub fn decoded_content_length(headers: &http::HeaderMap) -> Option<u64> {
    headers
        .get("x-amz-decoded-content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

/// Strip the aws-chunked framing from a collected body.
///
/// Each chunk is `<hex-size>[;chunk-signature=…]\r\n<data>\r\n`; a
/// zero-size chunk ends the stream, optionally followed by trailer
/// headers, which are discarded.
///
/// # Errors
///
/// `IncompleteBody` when the framing is truncated or malformed.
pub fn decode_aws_chunked(body: &[u8]) -> Result<Bytes, S3Error> {
    fn framing_error() -> S3Error {
        S3Error::new(S3ErrorCode::IncompleteBody)
    }

    let mut decoded = Vec::with_capacity(body.len());
    let mut rest = body;

    loop {
        let line_end = rest
            .windows(2)
            .position(|w| w == b"\r\n")
            .ok_or_else(framing_error)?;
        let header = std::str::from_utf8(&rest[..line_end]).map_err(|_| framing_error())?;
        let size_hex = header.split(';').next().unwrap_or(header).trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| framing_error())?;
        rest = &rest[line_end + 2..];

        if size == 0 {
            // Trailer headers (if any) follow the final chunk; nothing in
            // them affects the stored object.
            break;
        }
        if rest.len() < size {
            return Err(framing_error());
        }
        decoded.extend_from_slice(&rest[..size]);
        rest = &rest[size..];
        // The CRLF after the chunk data.
        if rest.starts_with(b"\r\n") {
            rest = &rest[2..];
        }
    }

    Ok(Bytes::from(decoded))
}
