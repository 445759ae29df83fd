//! The S3 error registry and wire error type.
//!
//! [`S3ErrorCode`] is the stable registry mapping each error kind to its
//! HTTP status and default human message; [`S3Error`] is the value handlers
//! raise and the response assembler turns into the XML `<Error>` envelope
//! (or an HTML page on the website endpoint).

use std::fmt;

/// Well-known S3 error codes produced by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum S3ErrorCode {
    /// AccessDenied error.
    #[default]
    AccessDenied,
    /// AuthorizationHeaderMalformed error.
    AuthorizationHeaderMalformed,
    /// AuthorizationQueryParametersError error.
    AuthorizationQueryParametersError,
    /// BadDigest error.
    BadDigest,
    /// BucketAlreadyExists error.
    BucketAlreadyExists,
    /// BucketAlreadyOwnedByYou error.
    BucketAlreadyOwnedByYou,
    /// BucketNotEmpty error.
    BucketNotEmpty,
    /// IncompleteBody error.
    IncompleteBody,
    /// InternalError error.
    InternalError,
    /// InvalidArgument error.
    InvalidArgument,
    /// InvalidBucketName error.
    InvalidBucketName,
    /// InvalidDigest error.
    InvalidDigest,
    /// InvalidPart error.
    InvalidPart,
    /// InvalidPartOrder error.
    InvalidPartOrder,
    /// InvalidRange error.
    InvalidRange,
    /// InvalidRequest error.
    InvalidRequest,
    /// MalformedXML error.
    MalformedXML,
    /// MethodNotAllowed error.
    MethodNotAllowed,
    /// MissingContentLength error.
    MissingContentLength,
    /// NoSuchBucket error.
    NoSuchBucket,
    /// NoSuchBucketPolicy error.
    NoSuchBucketPolicy,
    /// NoSuchCORSConfiguration error.
    NoSuchCORSConfiguration,
    /// NoSuchKey error.
    NoSuchKey,
    /// NoSuchLifecycleConfiguration error.
    NoSuchLifecycleConfiguration,
    /// NoSuchTagSet error.
    NoSuchTagSet,
    /// NoSuchUpload error.
    NoSuchUpload,
    /// NoSuchWebsiteConfiguration error.
    NoSuchWebsiteConfiguration,
    /// NotImplemented error.
    NotImplemented,
    /// RequestTimeTooSkewed error.
    RequestTimeTooSkewed,
    /// SignatureDoesNotMatch error.
    SignatureDoesNotMatch,
}

impl S3ErrorCode {
    /// Returns the error code as the string used in the `<Code>` element.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::AuthorizationHeaderMalformed => "AuthorizationHeaderMalformed",
            Self::AuthorizationQueryParametersError => "AuthorizationQueryParametersError",
            Self::BadDigest => "BadDigest",
            Self::BucketAlreadyExists => "BucketAlreadyExists",
            Self::BucketAlreadyOwnedByYou => "BucketAlreadyOwnedByYou",
            Self::BucketNotEmpty => "BucketNotEmpty",
            Self::IncompleteBody => "IncompleteBody",
            Self::InternalError => "InternalError",
            Self::InvalidArgument => "InvalidArgument",
            Self::InvalidBucketName => "InvalidBucketName",
            Self::InvalidDigest => "InvalidDigest",
            Self::InvalidPart => "InvalidPart",
            Self::InvalidPartOrder => "InvalidPartOrder",
            Self::InvalidRange => "InvalidRange",
            Self::InvalidRequest => "InvalidRequest",
            Self::MalformedXML => "MalformedXML",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::MissingContentLength => "MissingContentLength",
            Self::NoSuchBucket => "NoSuchBucket",
            Self::NoSuchBucketPolicy => "NoSuchBucketPolicy",
            Self::NoSuchCORSConfiguration => "NoSuchCORSConfiguration",
            Self::NoSuchKey => "NoSuchKey",
            Self::NoSuchLifecycleConfiguration => "NoSuchLifecycleConfiguration",
            Self::NoSuchTagSet => "NoSuchTagSet",
            Self::NoSuchUpload => "NoSuchUpload",
            Self::NoSuchWebsiteConfiguration => "NoSuchWebsiteConfiguration",
            Self::NotImplemented => "NotImplemented",
            Self::RequestTimeTooSkewed => "RequestTimeTooSkewed",
            Self::SignatureDoesNotMatch => "SignatureDoesNotMatch",
        }
    }

    /// Returns the HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::AuthorizationHeaderMalformed
            | Self::AuthorizationQueryParametersError
            | Self::BadDigest
            | Self::IncompleteBody
            | Self::InvalidArgument
            | Self::InvalidBucketName
            | Self::InvalidDigest
            | Self::InvalidPart
            | Self::InvalidPartOrder
            | Self::InvalidRequest
            | Self::MalformedXML => http::StatusCode::BAD_REQUEST,
            Self::AccessDenied | Self::RequestTimeTooSkewed | Self::SignatureDoesNotMatch => {
                http::StatusCode::FORBIDDEN
            }
            Self::NoSuchBucket
            | Self::NoSuchBucketPolicy
            | Self::NoSuchCORSConfiguration
            | Self::NoSuchKey
            | Self::NoSuchLifecycleConfiguration
            | Self::NoSuchTagSet
            | Self::NoSuchUpload
            | Self::NoSuchWebsiteConfiguration => http::StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => http::StatusCode::METHOD_NOT_ALLOWED,
            Self::BucketAlreadyExists | Self::BucketAlreadyOwnedByYou | Self::BucketNotEmpty => {
                http::StatusCode::CONFLICT
            }
            Self::MissingContentLength => http::StatusCode::LENGTH_REQUIRED,
            Self::InvalidRange => http::StatusCode::RANGE_NOT_SATISFIABLE,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => http::StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// Returns the default human-readable message for this error.
    #[must_use]
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access Denied",
            Self::AuthorizationHeaderMalformed => "The authorization header is malformed",
            Self::AuthorizationQueryParametersError => {
                "Error parsing the X-Amz-Credential parameter"
            }
            Self::BadDigest => "The Content-MD5 you specified did not match what we received",
            Self::BucketAlreadyExists => "The requested bucket name is not available",
            Self::BucketAlreadyOwnedByYou => {
                "Your previous request to create the named bucket succeeded and you already own it"
            }
            Self::BucketNotEmpty => "The bucket you tried to delete is not empty",
            Self::IncompleteBody => {
                "You did not provide the number of bytes specified by the Content-Length HTTP header"
            }
            Self::InternalError => "We encountered an internal error. Please try again.",
            Self::InvalidArgument => "Invalid Argument",
            Self::InvalidBucketName => "The specified bucket is not valid",
            Self::InvalidDigest => "The Content-MD5 you specified is not valid",
            Self::InvalidPart => {
                "One or more of the specified parts could not be found. The part might not have \
                 been uploaded, or the specified entity tag might not have matched the part's \
                 entity tag."
            }
            Self::InvalidPartOrder => {
                "The list of parts was not in ascending order. Parts must be ordered by part number."
            }
            Self::InvalidRange => "The requested range is not satisfiable",
            Self::InvalidRequest => "Invalid Request",
            Self::MalformedXML => {
                "The XML you provided was not well-formed or did not validate against our \
                 published schema"
            }
            Self::MethodNotAllowed => "The specified method is not allowed against this resource",
            Self::MissingContentLength => "You must provide the Content-Length HTTP header",
            Self::NoSuchBucket => "The specified bucket does not exist",
            Self::NoSuchBucketPolicy => "The bucket policy does not exist",
            Self::NoSuchCORSConfiguration => "The CORS configuration does not exist",
            Self::NoSuchKey => "The specified key does not exist.",
            Self::NoSuchLifecycleConfiguration => "The lifecycle configuration does not exist",
            Self::NoSuchTagSet => "The TagSet does not exist",
            Self::NoSuchUpload => {
                "The specified upload does not exist. The upload ID may be invalid, or the upload \
                 may have been aborted or completed."
            }
            Self::NoSuchWebsiteConfiguration => {
                "The specified bucket does not have a website configuration"
            }
            Self::NotImplemented => {
                "A header you provided implies functionality that is not implemented"
            }
            Self::RequestTimeTooSkewed => {
                "The difference between the request time and the server's time is too large."
            }
            Self::SignatureDoesNotMatch => {
                "The request signature we calculated does not match the signature you provided. \
                 Check your key and signing method."
            }
        }
    }
}

impl fmt::Display for S3ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An S3 error as it appears on the wire.
#[derive(Debug)]
pub struct S3Error {
    /// The error code.
    pub code: S3ErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The resource that caused the error (`<Resource>` element).
    pub resource: Option<String>,
    /// The request ID, filled in by the response assembler.
    pub request_id: Option<String>,
    /// The HTTP status code.
    pub status_code: http::StatusCode,
}

impl fmt::Display for S3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for S3Error {}

impl S3Error {
    /// Create a new error with the code's default message and status.
    #[must_use]
    pub fn new(code: S3ErrorCode) -> Self {
        Self {
            message: code.default_message().to_owned(),
            status_code: code.status_code(),
            code,
            resource: None,
            request_id: None,
        }
    }

    /// Create a new error with a custom message.
    #[must_use]
    pub fn with_message(code: S3ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status_code: code.status_code(),
            message: message.into(),
            code,
            resource: None,
            request_id: None,
        }
    }

    /// Set the resource that caused this error.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Create a NoSuchBucket error naming the bucket.
    #[must_use]
    pub fn no_such_bucket(bucket: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchBucket).with_resource(bucket)
    }

    /// Create a NoSuchKey error naming the key.
    #[must_use]
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchKey).with_resource(key)
    }

    /// Create a NoSuchUpload error naming the upload ID.
    #[must_use]
    pub fn no_such_upload(upload_id: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::NoSuchUpload).with_resource(upload_id)
    }

    /// Create an InvalidArgument error with a message.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::with_message(S3ErrorCode::InvalidArgument, message)
    }

    /// Create an InvalidRequest error with a message.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::with_message(S3ErrorCode::InvalidRequest, message)
    }

    /// Create a MalformedXML error.
    #[must_use]
    pub fn malformed_xml() -> Self {
        Self::new(S3ErrorCode::MalformedXML)
    }

    /// Create a MethodNotAllowed error naming the method.
    #[must_use]
    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        Self::new(S3ErrorCode::MethodNotAllowed).with_resource(method)
    }

    /// Create an InternalError with a message.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(S3ErrorCode::InternalError, message)
    }
}

/// Create an [`S3Error`] from an error code, optionally with a message.
///
/// # Examples
///
/// ```
/// use sandbar_model::s3_error;
/// use sandbar_model::error::S3ErrorCode;
///
/// let err = s3_error!(NoSuchBucket);
/// assert_eq!(err.code, S3ErrorCode::NoSuchBucket);
///
/// let err = s3_error!(InvalidArgument, "Mixing query and header signatures");
/// assert_eq!(err.message, "Mixing query and header signatures");
/// ```
#[macro_export]
macro_rules! s3_error {
    ($code:ident) => {
        $crate::error::S3Error::new($crate::error::S3ErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::S3Error::with_message($crate::error::S3ErrorCode::$code, $msg)
    };
}

/// Convenience result type for S3 operations.
pub type S3Result<T> = Result<T, S3Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_taxonomy_to_status_codes() {
        let cases = [
            (S3ErrorCode::InvalidBucketName, 400),
            (S3ErrorCode::NoSuchBucket, 404),
            (S3ErrorCode::BucketAlreadyExists, 409),
            (S3ErrorCode::BucketNotEmpty, 409),
            (S3ErrorCode::NoSuchKey, 404),
            (S3ErrorCode::NoSuchCORSConfiguration, 404),
            (S3ErrorCode::NoSuchWebsiteConfiguration, 404),
            (S3ErrorCode::NoSuchBucketPolicy, 404),
            (S3ErrorCode::NoSuchTagSet, 404),
            (S3ErrorCode::InvalidArgument, 400),
            (S3ErrorCode::AuthorizationHeaderMalformed, 400),
            (S3ErrorCode::AuthorizationQueryParametersError, 400),
            (S3ErrorCode::SignatureDoesNotMatch, 403),
            (S3ErrorCode::AccessDenied, 403),
            (S3ErrorCode::RequestTimeTooSkewed, 403),
            (S3ErrorCode::BadDigest, 400),
            (S3ErrorCode::MalformedXML, 400),
            (S3ErrorCode::InvalidRequest, 400),
            (S3ErrorCode::InvalidRange, 416),
            (S3ErrorCode::InternalError, 500),
        ];
        for (code, status) in cases {
            assert_eq!(code.status_code().as_u16(), status, "code {code}");
        }
    }

    #[test]
    fn test_should_build_error_with_default_message() {
        let err = S3Error::new(S3ErrorCode::NoSuchKey);
        assert_eq!(err.message, "The specified key does not exist.");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_should_attach_resource_and_request_id() {
        let err = S3Error::no_such_bucket("bucket1").with_request_id("req-1");
        assert_eq!(err.resource.as_deref(), Some("bucket1"));
        assert_eq!(err.request_id.as_deref(), Some("req-1"));
    }

    #[test]
    fn test_should_expand_error_macro() {
        let err = s3_error!(RequestTimeTooSkewed);
        assert_eq!(err.code, S3ErrorCode::RequestTimeTooSkewed);
        let err = s3_error!(AccessDenied, "Request has expired");
        assert_eq!(err.message, "Request has expired");
    }
}
