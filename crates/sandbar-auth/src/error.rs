//! Authentication failure kinds.
//!
//! These are scheme-level failures; the HTTP layer maps them onto the S3
//! error registry (`AuthorizationHeaderMalformed`, `SignatureDoesNotMatch`,
//! `RequestTimeTooSkewed`, …).

/// Errors produced while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Both an `Authorization` header and presigned query parameters were
    /// presented.
    #[error("Only one auth mechanism allowed; only the X-Amz-Algorithm query parameter, \
             Signature query string parameter or the Authorization header should be specified")]
    MixedAuthentication,

    /// The `Authorization` header is structurally invalid or missing a
    /// required component.
    #[error("authorization header is malformed: {0}")]
    HeaderMalformed(String),

    /// A presigned query string is missing a required component.
    #[error("query-string authentication is malformed: {0}")]
    QueryParametersError(String),

    /// The presented access key is not the configured one.
    #[error("the AWS access key Id you provided does not exist in our records: {0}")]
    UnknownAccessKey(String),

    /// A header named in `SignedHeaders` is absent from the request.
    #[error("signed header is missing from the request: {0}")]
    MissingSignedHeader(String),

    /// The request carries no usable `Date` / `x-amz-date`.
    #[error("authentication requires a valid Date or x-amz-date header")]
    MissingDate,

    /// The request time differs from the server clock by more than the
    /// allowed skew.
    #[error("the difference between the request time and the server's time is too large")]
    RequestTimeTooSkewed,

    /// A presigned URL has expired.
    #[error("request has expired")]
    Expired,

    /// The computed signature does not match the presented one.
    #[error("the request signature we calculated does not match the signature you provided")]
    SignatureDoesNotMatch,
}
