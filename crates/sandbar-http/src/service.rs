//! The hyper `Service` tying the HTTP layer together.
//!
//! Pipeline per request: health-check interception → routing → body
//! collection → SigV2/SigV4 authentication → signed-only parameter checks →
//! dispatch → common response headers.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use sandbar_auth::credentials::StaticCredentialProvider;
use sandbar_auth::error::AuthError;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::operations::S3Operation;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::body::S3ResponseBody;
use crate::dispatch::{S3Handler, dispatch_operation};
use crate::request::RESPONSE_HEADER_OVERRIDES;
use crate::response::{error_to_response, http_date};
use crate::router::S3Router;

/// Configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct S3HttpConfig {
    /// Host suffix for virtual-hosted addressing.
    pub service_endpoint: String,
    /// Whether vhost/CNAME bucket addressing is enabled.
    pub vhost_buckets: bool,
    /// Optional mount prefix stripped from request paths.
    pub base_path: Option<String>,
    /// The known access key ID.
    pub access_key_id: String,
    /// The known secret access key.
    pub secret_access_key: String,
    /// Accept requests whose signature digest does not match (still parsed
    /// and structurally validated).
    pub allow_mismatched_signatures: bool,
}

impl Default for S3HttpConfig {
    fn default() -> Self {
        Self {
            service_endpoint: "s3.amazonaws.com".to_owned(),
            vhost_buckets: true,
            base_path: None,
            access_key_id: "S3RVER".to_owned(),
            secret_access_key: "S3RVER".to_owned(),
            allow_mismatched_signatures: false,
        }
    }
}

/// The S3 HTTP service. Cloned per connection; all state is shared.
#[derive(Debug)]
pub struct S3HttpService<H: S3Handler> {
    handler: Arc<H>,
    router: S3Router,
    credentials: Arc<StaticCredentialProvider>,
    config: Arc<S3HttpConfig>,
}

impl<H: S3Handler> S3HttpService<H> {
    /// Create a service over a shared handler.
    #[must_use]
    pub fn new(handler: Arc<H>, config: S3HttpConfig) -> Self {
        let mut router = S3Router::new(&config.service_endpoint, config.vhost_buckets);
        if let Some(base) = &config.base_path {
            router = router.with_base_path(base.clone());
        }
        let credentials = Arc::new(StaticCredentialProvider::single(
            &config.access_key_id,
            &config.secret_access_key,
        ));
        Self {
            handler,
            router,
            credentials,
            config: Arc::new(config),
        }
    }
}

impl<H: S3Handler> Clone for S3HttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            router: self.router.clone(),
            credentials: Arc::clone(&self.credentials),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: S3Handler> Service<http::Request<Incoming>> for S3HttpService<H> {
    type Response = http::Response<S3ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();

        Box::pin(async move {
            let request_id = Uuid::new_v4().simple().to_string();
            let response = service.process(req, &request_id).await;
            Ok(finish_response(response, &request_id))
        })
    }
}

impl<H: S3Handler> S3HttpService<H> {
    async fn process(
        &self,
        req: http::Request<Incoming>,
        request_id: &str,
    ) -> http::Response<S3ResponseBody> {
        let method = req.method().clone();
        let uri = req.uri().clone();
        debug!(%method, %uri, request_id, "processing request");

        if method == http::Method::GET && uri.path() == "/health" {
            return health_response();
        }

        let handler = self.handler.as_ref();
        let exists = |name: &str| handler.bucket_exists(name);
        let mut ctx = match self.router.resolve(&req, &exists) {
            Ok(ctx) => ctx,
            Err(err) => {
                warn!(%method, %uri, error = %err, request_id, "failed to route request");
                return error_to_response(&err, request_id);
            }
        };

        info!(
            operation = %ctx.operation,
            bucket = ?ctx.bucket,
            key = ?ctx.key,
            website = ctx.website,
            request_id,
            "routed request"
        );

        let (parts, incoming) = req.into_parts();
        let body = match incoming.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                error!(error = %err, request_id, "failed to collect request body");
                let s3_err = S3Error::internal_error("Failed to read request body");
                return error_to_response(&s3_err, request_id);
            }
        };

        // Authenticate. Website-endpoint requests are anonymous by nature.
        if !ctx.website {
            match sandbar_auth::authenticate(&parts, self.credentials.as_ref()) {
                Ok(auth) => ctx.signed = auth.is_signed(),
                Err(AuthError::SignatureDoesNotMatch) if self.config.allow_mismatched_signatures => {
                    warn!(request_id, "accepting request with mismatched signature");
                    ctx.signed = true;
                }
                Err(err) => {
                    let s3_err = auth_error_to_s3(&err);
                    debug!(error = %err, request_id, "authentication failed");
                    return error_to_response(&s3_err, request_id);
                }
            }
        }

        // Response-header overrides are a signed-URL-only feature.
        if matches!(ctx.operation, S3Operation::GetObject | S3Operation::HeadObject)
            && !ctx.signed
        {
            let has_override = RESPONSE_HEADER_OVERRIDES
                .iter()
                .any(|(param, _)| ctx.query_params.iter().any(|(k, _)| k == param));
            if has_override {
                let err = S3Error::with_message(
                    S3ErrorCode::InvalidRequest,
                    "Request specific response headers cannot be used for anonymous GET requests.",
                );
                return error_to_response(&err, request_id);
            }
        }

        match dispatch_operation(handler, parts, body, ctx).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, request_id, "operation returned error");
                error_to_response(&err, request_id)
            }
        }
    }
}

/// Map an authentication failure onto the S3 error registry.
fn auth_error_to_s3(err: &AuthError) -> S3Error {
    match err {
        AuthError::MixedAuthentication => {
            S3Error::with_message(S3ErrorCode::InvalidArgument, err.to_string())
        }
        AuthError::HeaderMalformed(detail) => {
            S3Error::with_message(S3ErrorCode::AuthorizationHeaderMalformed, detail.clone())
        }
        AuthError::QueryParametersError(detail) => S3Error::with_message(
            S3ErrorCode::AuthorizationQueryParametersError,
            detail.clone(),
        ),
        AuthError::UnknownAccessKey(key) => S3Error::with_message(
            S3ErrorCode::AccessDenied,
            format!("The AWS access key Id you provided does not exist in our records: {key}"),
        ),
        AuthError::MissingSignedHeader(_) | AuthError::SignatureDoesNotMatch => {
            S3Error::new(S3ErrorCode::SignatureDoesNotMatch)
        }
        AuthError::MissingDate => S3Error::with_message(
            S3ErrorCode::AccessDenied,
            "AWS authentication requires a valid Date or x-amz-date header",
        ),
        AuthError::RequestTimeTooSkewed => S3Error::new(S3ErrorCode::RequestTimeTooSkewed),
        AuthError::Expired => {
            S3Error::with_message(S3ErrorCode::AccessDenied, "Request has expired")
        }
    }
}

/// The JSON health probe response.
fn health_response() -> http::Response<S3ResponseBody> {
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(S3ResponseBody::from_string(
            r#"{"status":"running","service":"s3"}"#,
        ))
        .expect("static health response is valid")
}

/// Attach the common response headers every S3 response carries.
fn finish_response(
    mut response: http::Response<S3ResponseBody>,
    request_id: &str,
) -> http::Response<S3ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::header::HeaderValue::from_str(request_id) {
        headers.insert("x-amz-request-id", hv.clone());
        headers.insert("x-amz-id-2", hv);
    }
    if let Ok(hv) = http::header::HeaderValue::from_str(&http_date(&chrono::Utc::now())) {
        headers.entry(http::header::DATE).or_insert(hv);
    }
    headers.insert(
        http::header::SERVER,
        http::header::HeaderValue::from_static("Sandbar"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_map_auth_errors_to_registry() {
        let cases = [
            (AuthError::MixedAuthentication, S3ErrorCode::InvalidArgument),
            (
                AuthError::HeaderMalformed("x".to_owned()),
                S3ErrorCode::AuthorizationHeaderMalformed,
            ),
            (
                AuthError::QueryParametersError("x".to_owned()),
                S3ErrorCode::AuthorizationQueryParametersError,
            ),
            (
                AuthError::SignatureDoesNotMatch,
                S3ErrorCode::SignatureDoesNotMatch,
            ),
            (
                AuthError::RequestTimeTooSkewed,
                S3ErrorCode::RequestTimeTooSkewed,
            ),
            (AuthError::Expired, S3ErrorCode::AccessDenied),
            (
                AuthError::UnknownAccessKey("k".to_owned()),
                S3ErrorCode::AccessDenied,
            ),
        ];
        for (auth_err, expected) in cases {
            assert_eq!(auth_error_to_s3(&auth_err).code, expected);
        }
    }

    #[test]
    fn test_should_attach_common_headers() {
        let resp = http::Response::builder()
            .status(http::StatusCode::OK)
            .body(S3ResponseBody::empty())
            .expect("valid response");
        let resp = finish_response(resp, "req-123");

        assert_eq!(
            resp.headers()
                .get("x-amz-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("req-123"),
        );
        assert_eq!(
            resp.headers()
                .get(http::header::SERVER)
                .and_then(|v| v.to_str().ok()),
            Some("Sandbar"),
        );
        assert!(resp.headers().contains_key(http::header::DATE));
    }

    #[test]
    fn test_should_produce_health_response() {
        let resp = health_response();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(
            resp.headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/json"),
        );
    }

    #[test]
    fn test_should_default_config() {
        let config = S3HttpConfig::default();
        assert_eq!(config.service_endpoint, "s3.amazonaws.com");
        assert!(config.vhost_buckets);
        assert!(!config.allow_mismatched_signatures);
        assert_eq!(config.access_key_id, "S3RVER");
    }
}
