//! Browser-facing shaping: the website endpoint and CORS preflights.
//!
//! Website-endpoint requests get HTML responses (index/error documents,
//! redirects, routing rules) instead of the XML API; SDK requests against
//! the same buckets keep their XML envelopes. Preflights are routed here
//! rather than answered statically because matching needs the bucket's
//! CORS rules.

use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::response::{build, http_date};
use sandbar_http::router::{AddressingStyle, RoutingContext};
use sandbar_model::error::{S3Error, S3ErrorCode};
use tracing::debug;

use crate::cors;
use crate::handlers::bucket_of;
use crate::provider::SandbarS3;
use crate::website::{self, WebsiteOutcome, WebsiteRequest};

/// Content type of website HTML error pages.
const HTML_UTF8: &str = "text/html; charset=utf-8";

impl SandbarS3 {
    /// Serve a request that arrived via the website endpoint.
    pub(crate) fn handle_website_request(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let head = parts.method == http::Method::HEAD;
        if !head && parts.method != http::Method::GET {
            return html_error(
                StatusCode::METHOD_NOT_ALLOWED,
                "405 Method Not Allowed",
                "MethodNotAllowed",
                "The specified method is not allowed against this resource.",
                &[],
            );
        }

        let bucket_name = bucket_of(ctx)?;
        let Ok(bucket) = self.state.get_bucket(bucket_name) else {
            return html_error(
                StatusCode::NOT_FOUND,
                "404 Not Found",
                "NoSuchBucket",
                "The specified bucket does not exist",
                &[("BucketName", bucket_name)],
            );
        };

        let Some(config) = bucket.website() else {
            return html_error(
                StatusCode::NOT_FOUND,
                "404 Not Found",
                "NoSuchWebsiteConfiguration",
                "The specified bucket does not have a website configuration",
                &[("BucketName", bucket_name)],
            );
        };

        let key = ctx.key.as_deref().unwrap_or("");
        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(&self.config.service_endpoint);
        let request = WebsiteRequest {
            bucket: bucket_name,
            key,
            path_style: ctx.addressing == AddressingStyle::Path,
            protocol: "http",
            host,
        };

        let objects = bucket.objects.read();
        let outcome = website::evaluate(&config, &request, &objects);
        debug!(bucket = bucket_name, key, ?outcome, "website resolution");

        match outcome {
            WebsiteOutcome::Serve { key } => {
                let object = objects
                    .get(&key)
                    .ok_or_else(|| S3Error::no_such_key(&key))?;
                let builder = http::Response::builder()
                    .status(StatusCode::OK)
                    .header(http::header::CONTENT_TYPE, &object.content_type)
                    .header(http::header::CONTENT_LENGTH, object.size)
                    .header(http::header::ETAG, &object.etag)
                    .header(http::header::LAST_MODIFIED, http_date(&object.last_modified));
                let body = if head {
                    S3ResponseBody::empty()
                } else {
                    S3ResponseBody::from_bytes(object.data.clone())
                };
                build(builder, body)
            }
            WebsiteOutcome::Redirect { location, status } => build(
                http::Response::builder()
                    .status(StatusCode::from_u16(status).unwrap_or(StatusCode::MOVED_PERMANENTLY))
                    .header(http::header::LOCATION, location),
                S3ResponseBody::empty(),
            ),
            WebsiteOutcome::ErrorDocument { key, status } => {
                let document = objects
                    .get(&key)
                    .ok_or_else(|| S3Error::no_such_key(&key))?;
                build(
                    http::Response::builder()
                        .status(StatusCode::from_u16(status).unwrap_or(StatusCode::NOT_FOUND))
                        .header(http::header::CONTENT_TYPE, HTML_UTF8),
                    S3ResponseBody::from_bytes(document.data.clone()),
                )
            }
            WebsiteOutcome::ErrorPage { status, html } => build(
                http::Response::builder()
                    .status(StatusCode::from_u16(status).unwrap_or(StatusCode::NOT_FOUND))
                    .header(http::header::CONTENT_TYPE, HTML_UTF8),
                S3ResponseBody::from_string(html),
            ),
        }
    }

    /// Answer an OPTIONS preflight against a bucket's CORS rules.
    pub(crate) fn handle_preflight(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let origin = parts
            .headers
            .get("origin")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                S3Error::invalid_request("Insufficient information. Origin request header needed.")
            })?;
        let request_method = parts
            .headers
            .get("access-control-request-method")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                S3Error::invalid_request(
                    "Invalid Access-Control-Request-Method: null. This preflight request is \
                     missing the required Access-Control-Request-Method header.",
                )
            })?;
        let requested_headers: Vec<String> = parts
            .headers
            .get("access-control-request-headers")
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(|h| h.trim().to_lowercase())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let Some(config) = bucket.cors() else {
            return Err(S3Error::with_message(
                S3ErrorCode::AccessDenied,
                "CORSResponse: CORS is not enabled for this bucket.",
            ));
        };

        let Some(matched) = cors::find_match(&config, origin, request_method, &requested_headers)
        else {
            return Err(S3Error::with_message(
                S3ErrorCode::AccessDenied,
                "CORSResponse: This CORS request is not allowed. This is usually because the \
                 evaluation of Origin, request method / Access-Control-Request-Method or \
                 Access-Control-Request-Headers are not whitelisted by the resource's CORS spec.",
            ));
        };

        let mut builder = http::Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", matched.allow_origin(origin))
            .header(
                "Access-Control-Allow-Methods",
                matched.allowed_methods.join(", "),
            );
        if matched.allow_credentials() {
            builder = builder.header("Access-Control-Allow-Credentials", "true");
        }
        if !requested_headers.is_empty() {
            // Requested headers are echoed back, lowercased.
            builder = builder.header(
                "Access-Control-Allow-Headers",
                requested_headers.join(", "),
            );
        }
        if let Some(max_age) = matched.max_age_seconds {
            builder = builder.header("Access-Control-Max-Age", max_age);
        }

        build(builder, S3ResponseBody::empty())
    }
}

/// Build an HTML error page response for the website endpoint.
fn html_error(
    status: StatusCode,
    title: &str,
    code: &str,
    message: &str,
    items: &[(&str, &str)],
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let html = website::error_page(title, code, message, items);
    build(
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, HTML_UTF8),
        S3ResponseBody::from_string(html),
    )
}
