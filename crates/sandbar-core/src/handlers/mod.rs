//! Per-operation handlers.
//!
//! Each module implements a family of operations as methods on
//! [`crate::SandbarS3`]; the provider's dispatch table routes to them.
//! Handlers are synchronous: every data-plane operation works on in-memory
//! state (plus quick write-through file I/O), so there is nothing to await
//! once the body has been collected.

pub mod bucket;
pub mod bucket_config;
pub mod list;
pub mod multipart;
pub mod object;
pub mod website;

use sandbar_http::RoutingContext;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_xml::XmlError;

/// The routed bucket name, which the router guarantees for bucket- and
/// object-scoped operations.
pub(crate) fn bucket_of(ctx: &RoutingContext) -> Result<&str, S3Error> {
    ctx.bucket
        .as_deref()
        .ok_or_else(|| S3Error::invalid_request("Missing bucket name"))
}

/// The routed object key.
pub(crate) fn key_of(ctx: &RoutingContext) -> Result<&str, S3Error> {
    ctx.key
        .as_deref()
        .ok_or_else(|| S3Error::invalid_request("Missing object key"))
}

/// Map an XML parse failure onto the wire registry: shape errors are
/// `MalformedXML`, domain-value errors carry their own message as
/// `InvalidRequest`.
pub(crate) fn xml_error_to_s3(err: XmlError) -> S3Error {
    match err {
        XmlError::InvalidValue(message) => {
            S3Error::with_message(S3ErrorCode::InvalidRequest, message)
        }
        _ => S3Error::malformed_xml(),
    }
}
