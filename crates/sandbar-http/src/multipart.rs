//! `multipart/form-data` parsing for browser-based POST object uploads.
//!
//! Works on the already-collected body bytes. Per the S3 POST contract the
//! `file` field comes last; every other field is treated as a form field
//! (`key`, `success_action_status`, `x-amz-meta-*`, …). The uploaded file's
//! `filename` is kept for `${filename}` substitution in the `key` field.

use std::collections::HashMap;

use bytes::Bytes;
use sandbar_model::error::{S3Error, S3ErrorCode};

/// A parsed form upload.
#[derive(Debug)]
pub struct FormUpload {
    /// Non-file form fields (name → value).
    pub fields: HashMap<String, String>,
    /// The uploaded file content.
    pub file_data: Bytes,
    /// The `filename` attribute of the file part, if supplied.
    pub filename: Option<String>,
    /// The `Content-Type` of the file part, if supplied.
    pub file_content_type: Option<String>,
}

impl FormUpload {
    /// Resolve the target key: the `key` field with `${filename}` replaced
    /// by the uploaded file's name.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when the form has no `key` field.
    pub fn resolve_key(&self) -> Result<String, S3Error> {
        let template = self.fields.get("key").ok_or_else(|| {
            S3Error::with_message(
                S3ErrorCode::InvalidArgument,
                "Bucket POST must contain a field named 'key'.",
            )
        })?;
        let filename = self.filename.as_deref().unwrap_or("");
        Ok(template.replace("${filename}", filename))
    }
}

/// Extract the boundary from a `multipart/form-data; boundary=…` value.
///
/// # Errors
///
/// `InvalidRequest` when the content type is not multipart form data or
/// carries no boundary.
pub fn extract_boundary(content_type: &str) -> Result<String, S3Error> {
    if !content_type
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return Err(S3Error::with_message(
            S3ErrorCode::InvalidRequest,
            format!("POST requires Content-Type multipart/form-data, got: {content_type}"),
        ));
    }

    for part in content_type.split(';') {
        let trimmed = part.trim();
        if let Some(value) = trimmed.strip_prefix("boundary=") {
            let boundary = value.trim_matches('"');
            if boundary.is_empty() {
                return Err(S3Error::with_message(
                    S3ErrorCode::InvalidRequest,
                    "Empty boundary in Content-Type",
                ));
            }
            return Ok(boundary.to_owned());
        }
    }

    Err(S3Error::with_message(
        S3ErrorCode::InvalidRequest,
        "Missing boundary in Content-Type",
    ))
}

/// Parse a multipart body into form fields and the file payload.
///
/// # Errors
///
/// `InvalidRequest` when no file part is present.
pub fn parse_form(body: &[u8], boundary: &str) -> Result<FormUpload, S3Error> {
    let delimiter = format!("--{boundary}");

    let mut fields = HashMap::new();
    let mut file_data = None;
    let mut filename = None;
    let mut file_content_type = None;

    for part in split_parts(body, delimiter.as_bytes()) {
        let Some((header_block, part_body)) = split_headers_body(part) else {
            continue;
        };
        let disposition = parse_content_disposition(header_block);
        let Some(name) = disposition.name else {
            continue;
        };

        if name == "file" || disposition.filename.is_some() {
            filename = disposition.filename;
            file_content_type = parse_part_content_type(header_block);
            file_data = Some(Bytes::copy_from_slice(part_body));
        } else {
            fields.insert(name, String::from_utf8_lossy(part_body).into_owned());
        }
    }

    let file_data = file_data.ok_or_else(|| {
        S3Error::with_message(
            S3ErrorCode::InvalidRequest,
            "POST requires exactly one file upload per request.",
        )
    })?;

    Ok(FormUpload {
        fields,
        file_data,
        filename,
        file_content_type,
    })
}

/// Split the body into parts between boundary delimiters.
fn split_parts<'a>(body: &'a [u8], delimiter: &[u8]) -> Vec<&'a [u8]> {
    let mut parts = Vec::new();
    let mut rest = body;

    while let Some(start) = find(rest, delimiter) {
        rest = &rest[start + delimiter.len()..];
        // The closing delimiter is "--boundary--".
        if rest.starts_with(b"--") {
            break;
        }
        // Skip the CRLF after the delimiter.
        let rest_after_crlf = rest.strip_prefix(b"\r\n").unwrap_or(rest);
        let end = find(rest_after_crlf, delimiter).unwrap_or(rest_after_crlf.len());
        let mut part = &rest_after_crlf[..end];
        // Trim the trailing CRLF that precedes the next delimiter.
        if part.ends_with(b"\r\n") {
            part = &part[..part.len() - 2];
        }
        if !part.is_empty() {
            parts.push(part);
        }
        rest = &rest_after_crlf[end.min(rest_after_crlf.len())..];
    }

    parts
}

/// Split a part into its header block and body at the `\r\n\r\n` boundary.
fn split_headers_body(part: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = find(part, b"\r\n\r\n")?;
    Some((&part[..pos], &part[pos + 4..]))
}

/// Naive subsequence search.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[derive(Debug, Default)]
struct ContentDisposition {
    name: Option<String>,
    filename: Option<String>,
}

/// Parse the `Content-Disposition` header of a part.
fn parse_content_disposition(header_block: &[u8]) -> ContentDisposition {
    let mut result = ContentDisposition::default();
    let text = String::from_utf8_lossy(header_block);

    for line in text.split("\r\n") {
        let lower = line.to_ascii_lowercase();
        if !lower.starts_with("content-disposition:") {
            continue;
        }
        for attr in line.split(';') {
            let attr = attr.trim();
            if let Some(value) = attr.strip_prefix("name=") {
                result.name = Some(value.trim_matches('"').to_owned());
            } else if let Some(value) = attr.strip_prefix("filename=") {
                result.filename = Some(value.trim_matches('"').to_owned());
            }
        }
    }

    result
}

/// Parse the `Content-Type` header of a part, preserving the value's case.
fn parse_part_content_type(header_block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(header_block);
    for line in text.split("\r\n") {
        let lower = line.to_ascii_lowercase();
        if lower.starts_with("content-type:") {
            let raw = &line[line.find(':').unwrap_or(0) + 1..];
            return Some(raw.trim().to_owned());
        }
    }
    None
}
