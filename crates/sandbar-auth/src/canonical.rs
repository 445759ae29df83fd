//! Request canonicalization for both signature schemes.
//!
//! SigV4 signs a canonical request:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! SigV2 signs the legacy string-to-sign:
//!
//! ```text
//! HTTP-Verb\n
//! Content-MD5\n
//! Content-Type\n
//! Date\n
//! CanonicalizedAmzHeaders
//! CanonicalizedResource
//! ```
//!
//! This module also normalizes request timestamps (`x-amz-date` /
//! `Date`) and enforces the clock-skew window.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::AuthError;

/// Maximum tolerated difference between the request time and the server
/// clock, in seconds.
pub const MAX_CLOCK_SKEW_SECS: i64 = 15 * 60;

/// Characters that must be percent-encoded in URI path segments: everything
/// except RFC 3986 unreserved characters. Slashes are handled per segment.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// ---------------------------------------------------------------------------
// SigV4 canonical request
// ---------------------------------------------------------------------------

/// Build the full SigV4 canonical request string.
#[must_use]
pub fn canonical_request(
    method: &str,
    path: &str,
    query_string: &str,
    headers: &[(String, String)],
    signed_headers: &[String],
    payload_hash: &str,
) -> String {
    let uri = canonical_uri(path);
    let query = canonical_query_string(query_string, &[]);
    let canon_headers = canonical_headers(headers, signed_headers);
    let signed = signed_headers_string(signed_headers);

    format!("{method}\n{uri}\n{query}\n{canon_headers}\n\n{signed}\n{payload_hash}")
}

/// Canonicalize a URI path: decode each segment, then re-encode with the
/// SigV4 character set. Prevents double-encoding of already-encoded paths.
#[must_use]
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_owned();
    }

    path.split('/')
        .map(|segment| {
            let decoded = percent_decode_str(segment).decode_utf8_lossy();
            utf8_percent_encode(&decoded, URI_ENCODE_SET).to_string()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonicalize a query string: split, drop excluded parameter names, sort
/// by key then value. Raw encodings are preserved because clients sign
/// whatever encoding they actually sent.
#[must_use]
pub fn canonical_query_string(query: &str, exclude: &[&str]) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|param| param.split_once('=').unwrap_or((param, "")))
        .filter(|(k, _)| !exclude.contains(k))
        .collect();

    params.sort_unstable();

    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers block: lowercased names, trimmed and
/// whitespace-collapsed values, sorted by name, restricted to the signed set.
#[must_use]
pub fn canonical_headers(headers: &[(String, String)], signed_headers: &[String]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower = name.to_lowercase();
        let trimmed = collapse_whitespace(value.trim());
        header_map
            .entry(lower)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed);
            })
            .or_insert(trimmed);
    }

    let mut sorted: Vec<&String> = signed_headers.iter().collect();
    sorted.sort_unstable();

    sorted
        .iter()
        .filter_map(|name| {
            header_map
                .get(name.as_str())
                .map(|value| format!("{name}:{value}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `SignedHeaders` component: sorted, semicolon-joined lowercase names.
#[must_use]
pub fn signed_headers_string(signed_headers: &[String]) -> String {
    let mut sorted: Vec<&str> = signed_headers.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(";")
}

fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}

// ---------------------------------------------------------------------------
// SigV2 canonicalization
// ---------------------------------------------------------------------------

/// Sub-resources that participate in the SigV2 canonicalized resource.
const SIGV2_SUB_RESOURCES: &[&str] = &[
    "acl",
    "cors",
    "delete",
    "lifecycle",
    "location",
    "logging",
    "notification",
    "partNumber",
    "policy",
    "requestPayment",
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
    "restore",
    "tagging",
    "torrent",
    "uploadId",
    "uploads",
    "versionId",
    "versioning",
    "versions",
    "website",
];

/// Build the `CanonicalizedAmzHeaders` block: every `x-amz-*` header,
/// lowercased, sorted, `name:value\n`.
#[must_use]
pub fn canonicalized_amz_headers(headers: &[(String, String)]) -> String {
    let mut amz: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        let lower = name.to_lowercase();
        if lower.starts_with("x-amz-") {
            amz.entry(lower).or_default().push(value.trim().to_owned());
        }
    }

    let mut result = String::new();
    for (name, values) in &amz {
        result.push_str(name);
        result.push(':');
        result.push_str(&values.join(","));
        result.push('\n');
    }
    result
}

/// Build the `CanonicalizedResource`: the URI path plus the sorted
/// sub-resource parameters from the whitelist.
#[must_use]
pub fn canonicalized_resource(path: &str, query: &str) -> String {
    let mut sub_params: Vec<(String, Option<String>)> = Vec::new();

    for param in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = param.split_once('=').map_or((param, None), |(k, v)| {
            let decoded = percent_decode_str(v).decode_utf8_lossy().into_owned();
            let value = if decoded.is_empty() { None } else { Some(decoded) };
            (k, value)
        });
        if SIGV2_SUB_RESOURCES.contains(&key) {
            sub_params.push((key.to_owned(), value));
        }
    }

    sub_params.sort_by(|a, b| a.0.cmp(&b.0));

    if sub_params.is_empty() {
        path.to_owned()
    } else {
        let rendered: Vec<String> = sub_params
            .iter()
            .map(|(k, v)| match v {
                Some(val) => format!("{k}={val}"),
                None => k.clone(),
            })
            .collect();
        format!("{path}?{}", rendered.join("&"))
    }
}

// ---------------------------------------------------------------------------
// Request time handling
// ---------------------------------------------------------------------------

/// Parse an `x-amz-date` timestamp (`YYYYMMDDTHHMMSSZ`).
#[must_use]
pub fn parse_amz_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse an HTTP `Date` header (RFC 1123 / RFC 2822).
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extract the request time from `x-amz-date` (preferred) or `Date`.
#[must_use]
pub fn request_time(parts: &http::request::Parts) -> Option<DateTime<Utc>> {
    if let Some(value) = parts.headers.get("x-amz-date").and_then(|v| v.to_str().ok()) {
        return parse_amz_date(value).or_else(|| parse_http_date(value));
    }
    parts
        .headers
        .get(http::header::DATE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
}

/// Enforce the clock-skew window on a header-signed request.
///
/// # Errors
///
/// [`AuthError::MissingDate`] when no usable timestamp is present,
/// [`AuthError::RequestTimeTooSkewed`] when it is outside the window.
pub fn check_clock_skew(parts: &http::request::Parts, now: DateTime<Utc>) -> Result<(), AuthError> {
    let request_time = request_time(parts).ok_or(AuthError::MissingDate)?;
    let skew = (now - request_time).num_seconds().abs();
    if skew > MAX_CLOCK_SKEW_SECS {
        return Err(AuthError::RequestTimeTooSkewed);
    }
    Ok(())
}

/// Collect the request headers as owned `(name, value)` pairs.
#[must_use]
pub fn collect_headers(parts: &http::request::Parts) -> Vec<(String, String)> {
    parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                value.to_str().unwrap_or("").to_owned(),
            )
        })
        .collect()
}
