//! Response builders and the error envelope assembler.
//!
//! All handler responses funnel through these helpers so status codes,
//! `Content-Type`, and the `<Error>` envelope stay uniform.

use http::header::HeaderValue;
use sandbar_model::error::S3Error;
use sandbar_xml::error_to_xml;

use crate::body::S3ResponseBody;

/// Build an XML response with the given status.
///
/// # Errors
///
/// `S3Error` if the response cannot be constructed.
pub fn xml_response(
    status: http::StatusCode,
    xml: Vec<u8>,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    build(
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/xml"),
        S3ResponseBody::from_xml(xml),
    )
}

/// Build an empty response with the given status.
///
/// # Errors
///
/// `S3Error` if the response cannot be constructed.
pub fn empty_response(
    status: http::StatusCode,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    build(http::Response::builder().status(status), S3ResponseBody::empty())
}

/// Finish a builder, converting build errors to `S3Error`.
///
/// # Errors
///
/// `S3Error` if the response cannot be constructed (invalid header value).
pub fn build(
    builder: http::response::Builder,
    body: S3ResponseBody,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    builder
        .body(body)
        .map_err(|e| S3Error::internal_error(format!("failed to build HTTP response: {e}")))
}

/// Set a header when the value is `Some` and valid.
#[must_use]
pub fn set_optional_header(
    builder: http::response::Builder,
    name: &str,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Set `x-amz-meta-*` headers from a metadata map.
#[must_use]
pub fn set_metadata_headers(
    mut builder: http::response::Builder,
    metadata: &std::collections::HashMap<String, String>,
) -> http::response::Builder {
    for (key, value) in metadata {
        if let Ok(hv) = HeaderValue::from_str(value) {
            builder = builder.header(format!("x-amz-meta-{key}"), hv);
        }
    }
    builder
}

/// Format a timestamp as an RFC 1123 HTTP date.
#[must_use]
pub fn http_date(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Convert an [`S3Error`] into the XML `<Error>` response.
#[must_use]
pub fn error_to_response(err: &S3Error, request_id: &str) -> http::Response<S3ResponseBody> {
    let request_id = err.request_id.as_deref().unwrap_or(request_id);
    let xml = error_to_xml(
        err.code.as_str(),
        &err.message,
        err.resource.as_deref(),
        request_id,
    );

    http::Response::builder()
        .status(err.status_code)
        .header(http::header::CONTENT_TYPE, "application/xml")
        .body(S3ResponseBody::from_xml(xml))
        .unwrap_or_else(|_| {
            let mut fallback = http::Response::new(S3ResponseBody::empty());
            *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}
