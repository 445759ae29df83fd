//! The provider: dispatch from routed operations to handlers, plus the
//! cross-cutting response shaping (CORS augmentation) that needs bucket
//! state.

use std::sync::Arc;

use bytes::Bytes;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::dispatch::{HandlerFuture, S3Handler};
use sandbar_http::router::RoutingContext;
use sandbar_model::error::S3Error;
use sandbar_model::operations::S3Operation;

use crate::config::ServerConfig;
use crate::cors;
use crate::events::EventBus;
use crate::state::ServiceState;

/// The S3 service: state, events, and configuration behind shared handles.
#[derive(Debug, Clone)]
pub struct SandbarS3 {
    /// The bucket/object state.
    pub state: Arc<ServiceState>,
    /// The notification bus.
    pub events: Arc<EventBus>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl SandbarS3 {
    /// Create a provider over existing state.
    #[must_use]
    pub fn new(state: Arc<ServiceState>, events: Arc<EventBus>, config: ServerConfig) -> Self {
        Self {
            state,
            events,
            config: Arc::new(config),
        }
    }

    /// Create the buckets named in `configure_buckets`, applying and
    /// validating their preloaded CORS/website documents.
    ///
    /// # Errors
    ///
    /// Any invalid preset (bad bucket name, unrecognized or malformed
    /// configuration XML) is a startup error; the caller is expected to
    /// exit non-zero.
    pub fn apply_bucket_presets(&self) -> Result<(), S3Error> {
        use crate::handlers::bucket_config::parse_config;
        use crate::state::bucket::ConfigKind;

        for preset in &self.config.configure_buckets {
            if !self.state.bucket_exists(&preset.name) {
                self.state.create_bucket(&preset.name)?;
            }
            for raw in &preset.configs {
                let document = String::from_utf8_lossy(raw);
                let kind = if document.contains("<CORSConfiguration") {
                    ConfigKind::Cors
                } else if document.contains("<WebsiteConfiguration") {
                    ConfigKind::Website
                } else {
                    return Err(S3Error::invalid_argument(format!(
                        "Unrecognized configuration document for bucket {}",
                        preset.name
                    )));
                };
                let config = parse_config(kind, Bytes::copy_from_slice(raw))?;
                self.state.put_config(&preset.name, kind, config)?;
            }
            tracing::info!(bucket = %preset.name, "preconfigured bucket");
        }
        Ok(())
    }

    /// Synchronous dispatch table.
    fn dispatch(
        &self,
        op: S3Operation,
        parts: &http::request::Parts,
        body: Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        if ctx.website {
            return self.handle_website_request(parts, ctx);
        }

        let result = match op {
            S3Operation::ListBuckets => self.handle_list_buckets(),
            S3Operation::CreateBucket => self.handle_create_bucket(ctx),
            S3Operation::DeleteBucket => self.handle_delete_bucket(ctx),
            S3Operation::HeadBucket => self.handle_head_bucket(ctx),
            S3Operation::GetBucketLocation => self.handle_get_bucket_location(ctx),

            S3Operation::GetBucketCors
            | S3Operation::GetBucketWebsite
            | S3Operation::GetBucketPolicy
            | S3Operation::GetBucketLifecycle
            | S3Operation::GetBucketTagging
            | S3Operation::GetBucketAcl => self.handle_get_bucket_config(op, ctx),
            S3Operation::PutBucketCors
            | S3Operation::PutBucketWebsite
            | S3Operation::PutBucketPolicy
            | S3Operation::PutBucketLifecycle
            | S3Operation::PutBucketTagging
            | S3Operation::PutBucketAcl => self.handle_put_bucket_config(op, &body, ctx),
            S3Operation::DeleteBucketCors
            | S3Operation::DeleteBucketWebsite
            | S3Operation::DeleteBucketPolicy
            | S3Operation::DeleteBucketLifecycle
            | S3Operation::DeleteBucketTagging => self.handle_delete_bucket_config(op, ctx),

            S3Operation::ListObjects => self.handle_list_objects(ctx),
            S3Operation::ListObjectsV2 => self.handle_list_objects_v2(ctx),
            S3Operation::ListMultipartUploads => self.handle_list_multipart_uploads(ctx),

            S3Operation::PutObject => self.handle_put_object(parts, body, ctx),
            S3Operation::GetObject => self.handle_get_object(parts, ctx, false),
            S3Operation::HeadObject => self.handle_get_object(parts, ctx, true),
            S3Operation::DeleteObject => self.handle_delete_object(ctx),
            S3Operation::DeleteObjects => self.handle_delete_objects(&body, ctx),
            S3Operation::CopyObject => self.handle_copy_object(parts, ctx),
            S3Operation::PostObject => self.handle_post_object(parts, &body, ctx),

            S3Operation::GetObjectTagging => self.handle_get_object_tagging(ctx),
            S3Operation::PutObjectTagging => self.handle_put_object_tagging(&body, ctx),
            S3Operation::DeleteObjectTagging => self.handle_delete_object_tagging(ctx),
            S3Operation::GetObjectAcl => self.handle_get_object_acl(ctx),
            S3Operation::PutObjectAcl => self.handle_put_object_acl(ctx),

            S3Operation::CreateMultipartUpload => self.handle_create_multipart_upload(parts, ctx),
            S3Operation::UploadPart => self.handle_upload_part(parts, body, ctx),
            S3Operation::CompleteMultipartUpload => {
                self.handle_complete_multipart_upload(&body, ctx)
            }
            S3Operation::AbortMultipartUpload => self.handle_abort_multipart_upload(ctx),
            S3Operation::ListParts => self.handle_list_parts(ctx),
            S3Operation::UploadPartCopy => Err(S3Error::new(
                sandbar_model::error::S3ErrorCode::NotImplemented,
            )
            .with_resource("UploadPartCopy")),

            S3Operation::Preflight => self.handle_preflight(parts, ctx),
        };

        match result {
            Ok(response) => Ok(self.augment_cors(response, parts, ctx)),
            Err(err) => Err(err),
        }
    }

    /// Augment a successful response with CORS headers when the request
    /// carried an `Origin` a bucket rule matches. No match, no headers.
    fn augment_cors(
        &self,
        mut response: http::Response<S3ResponseBody>,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> http::Response<S3ResponseBody> {
        if ctx.operation == S3Operation::Preflight {
            return response;
        }
        let Some(origin) = parts.headers.get("origin").and_then(|v| v.to_str().ok()) else {
            return response;
        };
        let Some(bucket_name) = ctx.bucket.as_deref() else {
            return response;
        };
        let Ok(bucket) = self.state.get_bucket(bucket_name) else {
            return response;
        };
        let Some(config) = bucket.cors() else {
            return response;
        };
        let Some(matched) = cors::find_match(&config, origin, parts.method.as_str(), &[]) else {
            return response;
        };

        let is_partial_content = response.status() == http::StatusCode::PARTIAL_CONTENT;
        let headers = response.headers_mut();
        if let Ok(hv) = http::HeaderValue::from_str(&matched.allow_origin(origin)) {
            headers.insert("Access-Control-Allow-Origin", hv);
        }
        if matched.allow_credentials() {
            headers.insert(
                "Access-Control-Allow-Credentials",
                http::HeaderValue::from_static("true"),
            );
        }
        let mut expose = matched.expose_headers.clone();
        if is_partial_content {
            expose.push("Accept-Ranges".to_owned());
            expose.push("Content-Range".to_owned());
        }
        if !expose.is_empty() {
            if let Ok(hv) = http::HeaderValue::from_str(&expose.join(", ")) {
                headers.insert("Access-Control-Expose-Headers", hv);
            }
        }

        response
    }
}

impl S3Handler for SandbarS3 {
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture {
        let this = self.clone();
        Box::pin(async move { this.dispatch(op, &parts, body, &ctx) })
    }

    fn bucket_exists(&self, name: &str) -> bool {
        self.state.bucket_exists(name)
    }
}
