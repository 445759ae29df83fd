//! Object-level handlers: PUT/GET/HEAD/DELETE, multi-delete, copy, the
//! browser form upload, tagging, and the echoed ACL.

use bytes::Bytes;
use chrono::Utc;
use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::multipart::{extract_boundary, parse_form};
use sandbar_http::request::{
    content_md5, content_type, decode_aws_chunked, decoded_content_length,
    declared_content_length, is_aws_chunked, metadata_from_headers, parse_copy_source,
    response_header_overrides, website_redirect_location,
};
use sandbar_http::response::{
    build, empty_response, http_date, set_metadata_headers, set_optional_header, xml_response,
};
use sandbar_http::router::RoutingContext;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{
    DeleteRequest, DeleteResult, DeletedObject, MetadataDirective, Tagging,
};
use sandbar_model::s3_error;
use sandbar_xml::serialize::{AccessControlPolicy, CopyObjectResult, PostResponse};
use tracing::debug;

use crate::events::{EventName, EventRecord};
use crate::handlers::{bucket_of, key_of, xml_error_to_s3};
use crate::provider::SandbarS3;
use crate::state::object::{DEFAULT_CONTENT_TYPE, StoredObject};
use crate::utils::{ByteRange, generate_request_id, md5_digest, parse_range, verify_content_md5};

/// Content type substituted on REPLACE copies that name none.
const COPY_REPLACE_CONTENT_TYPE: &str = "application/octet-stream";

impl SandbarS3 {
    /// `PUT /:bucket/:key` — store an object.
    pub(crate) fn handle_put_object(
        &self,
        parts: &http::request::Parts,
        body: Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        self.state.get_bucket(bucket)?;

        let (body, declared) = unwrap_body(parts, body)?;
        if let Some(declared) = declared {
            if declared != body.len() as u64 {
                return Err(S3Error::new(S3ErrorCode::IncompleteBody).with_resource(key));
            }
        }

        let digest = md5_digest(&body);
        if let Some(header) = content_md5(&parts.headers) {
            verify_content_md5(&header, &digest)?;
        }

        let mut object = StoredObject::new(key, body, content_type(&parts.headers));
        object.metadata = metadata_from_headers(&parts.headers);
        object.website_redirect_location = website_redirect_location(&parts.headers);

        let etag = object.etag.clone();
        let size = object.size;
        self.state.put_object(bucket, object)?;
        self.events.publish(EventRecord::new(
            EventName::CreatedPut,
            bucket,
            key,
            size,
            &etag,
            Utc::now(),
        ));
        debug!(bucket, key, size, "stored object");

        build(
            http::Response::builder()
                .status(StatusCode::OK)
                .header(http::header::ETAG, &etag),
            S3ResponseBody::empty(),
        )
    }

    /// `GET`/`HEAD /:bucket/:key` — stream an object, honoring ranges and
    /// signed response-header overrides.
    pub(crate) fn handle_get_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
        head: bool,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let object = bucket
            .objects
            .read()
            .get(key)
            .ok_or_else(|| S3Error::no_such_key(format!("/{bucket_name}/{key}")))?;

        let range = parts
            .headers
            .get(http::header::RANGE)
            .and_then(|v| v.to_str().ok())
            .map_or(ByteRange::Full, |header| parse_range(header, object.size));

        if range == ByteRange::Unsatisfiable {
            return range_not_satisfiable(object.size);
        }

        let mut builder = http::Response::builder()
            .header(http::header::ETAG, &object.etag)
            .header(http::header::CONTENT_TYPE, &object.content_type)
            .header(http::header::LAST_MODIFIED, http_date(&object.last_modified))
            .header(http::header::ACCEPT_RANGES, "bytes");
        builder = set_metadata_headers(builder, &object.metadata);
        builder = set_optional_header(
            builder,
            "x-amz-website-redirect-location",
            object.website_redirect_location.as_deref(),
        );

        // Overrides were gated on a valid signature by the service layer.
        if ctx.signed {
            for (header, value) in response_header_overrides(&ctx.query_params) {
                builder = set_optional_header(builder, header, Some(&value));
            }
        }

        let (status, slice) = match range {
            ByteRange::Partial { start, end } => {
                builder = builder.header(
                    http::header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{}", object.size),
                );
                let start_idx = usize::try_from(start).unwrap_or(usize::MAX);
                let end_idx = usize::try_from(end).unwrap_or(usize::MAX).saturating_add(1);
                (
                    StatusCode::PARTIAL_CONTENT,
                    object.data.slice(start_idx..end_idx),
                )
            }
            _ => (StatusCode::OK, object.data.clone()),
        };
        builder = builder
            .status(status)
            .header(http::header::CONTENT_LENGTH, slice.len());

        let body = if head {
            S3ResponseBody::empty()
        } else {
            S3ResponseBody::from_bytes(slice)
        };
        build(builder, body)
    }

    /// `DELETE /:bucket/:key` — idempotent delete.
    pub(crate) fn handle_delete_object(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        self.state.delete_object(bucket, key)?;
        self.events.publish(EventRecord::new(
            EventName::RemovedDelete,
            bucket,
            key,
            0,
            "",
            Utc::now(),
        ));
        empty_response(StatusCode::NO_CONTENT)
    }

    /// `POST /:bucket?delete` — delete several keys in one request.
    pub(crate) fn handle_delete_objects(
        &self,
        body: &Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.get_bucket(bucket)?;

        let request: DeleteRequest = sandbar_xml::from_xml(body).map_err(xml_error_to_s3)?;

        let mut result = DeleteResult::default();
        for object in &request.objects {
            // Missing keys still count as deleted; per-key failures other
            // than storage faults cannot occur here.
            self.state.delete_object(bucket, &object.key)?;
            self.events.publish(EventRecord::new(
                EventName::RemovedDelete,
                bucket,
                &object.key,
                0,
                "",
                Utc::now(),
            ));
            if !request.quiet {
                result.deleted.push(DeletedObject {
                    key: object.key.clone(),
                });
            }
        }

        let xml = sandbar_xml::to_xml("DeleteResult", &result)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `PUT /:bucket/:key` with `x-amz-copy-source`.
    pub(crate) fn handle_copy_object(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let dest_bucket = bucket_of(ctx)?;
        let dest_key = key_of(ctx)?;
        self.state.get_bucket(dest_bucket)?;

        let source_header = parts
            .headers
            .get("x-amz-copy-source")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| S3Error::invalid_argument("Missing x-amz-copy-source header"))?;
        let (src_bucket, src_key) = parse_copy_source(source_header)?;

        let directive = match parts
            .headers
            .get("x-amz-metadata-directive")
            .and_then(|v| v.to_str().ok())
        {
            None => MetadataDirective::Copy,
            Some(raw) => MetadataDirective::parse(raw).ok_or_else(|| {
                S3Error::invalid_argument(format!(
                    "Unknown metadata directive: {raw}. Valid values are COPY and REPLACE."
                ))
            })?,
        };

        if src_bucket == dest_bucket && src_key == dest_key && directive == MetadataDirective::Copy
        {
            return Err(S3Error::invalid_request(
                "This copy request is illegal because it is trying to copy an object to itself \
                 without changing the object's metadata, storage class, website redirect location \
                 or encryption attributes.",
            ));
        }

        let source = {
            let bucket = self.state.get_bucket(&src_bucket)?;
            let store = bucket.objects.read();
            store
                .get(&src_key)
                .ok_or_else(|| S3Error::no_such_key(format!("/{src_bucket}/{src_key}")))?
        };

        let mut object = StoredObject::new(dest_key, source.data.clone(), None);
        match directive {
            MetadataDirective::Copy => {
                object.content_type = source.content_type.clone();
                object.metadata = source.metadata.clone();
                object.website_redirect_location = source.website_redirect_location.clone();
                object.tags = source.tags.clone();
            }
            MetadataDirective::Replace => {
                object.content_type = content_type(&parts.headers)
                    .unwrap_or_else(|| COPY_REPLACE_CONTENT_TYPE.to_owned());
                object.metadata = metadata_from_headers(&parts.headers);
                object.website_redirect_location = website_redirect_location(&parts.headers);
            }
        }

        let etag = object.etag.clone();
        let last_modified = object.last_modified;
        let size = object.size;
        self.state.put_object(dest_bucket, object)?;
        self.events.publish(EventRecord::new(
            EventName::CreatedCopy,
            dest_bucket,
            dest_key,
            size,
            &etag,
            Utc::now(),
        ));
        debug!(
            src = %format!("{src_bucket}/{src_key}"),
            dest = %format!("{dest_bucket}/{dest_key}"),
            "copied object"
        );

        let xml = sandbar_xml::to_xml(
            "CopyObjectResult",
            &CopyObjectResult {
                etag,
                last_modified,
            },
        )
        .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `POST /:bucket` — browser-based form upload.
    pub(crate) fn handle_post_object(
        &self,
        parts: &http::request::Parts,
        body: &Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.get_bucket(bucket)?;

        let request_content_type = content_type(&parts.headers).unwrap_or_default();
        let boundary = extract_boundary(&request_content_type)?;
        let form = parse_form(body, &boundary)?;
        let key = form.resolve_key()?;

        let mut object = StoredObject::new(
            &key,
            form.file_data.clone(),
            Some(
                form.file_content_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            ),
        );
        for (name, value) in &form.fields {
            let lower = name.to_lowercase();
            if let Some(meta_key) = lower.strip_prefix("x-amz-meta-") {
                object.metadata.insert(meta_key.to_owned(), value.clone());
            }
        }

        let etag = object.etag.clone();
        let size = object.size;
        self.state.put_object(bucket, object)?;
        self.events.publish(EventRecord::new(
            EventName::CreatedPost,
            bucket,
            &key,
            size,
            &etag,
            Utc::now(),
        ));

        let location = format!("/{bucket}/{key}");
        let status = match form.fields.get("success_action_status").map(String::as_str) {
            Some("200") => StatusCode::OK,
            Some("204") => StatusCode::NO_CONTENT,
            // 201 is both the explicit option and the default.
            _ => StatusCode::CREATED,
        };

        if status == StatusCode::CREATED {
            let xml = sandbar_xml::to_xml(
                "PostResponse",
                &PostResponse {
                    location: location.clone(),
                    bucket: bucket.to_owned(),
                    key,
                    etag: etag.clone(),
                },
            )
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
            build(
                http::Response::builder()
                    .status(status)
                    .header(http::header::CONTENT_TYPE, "application/xml")
                    .header(http::header::LOCATION, &location)
                    .header(http::header::ETAG, &etag),
                S3ResponseBody::from_xml(xml),
            )
        } else {
            build(
                http::Response::builder()
                    .status(status)
                    .header(http::header::LOCATION, &location)
                    .header(http::header::ETAG, &etag),
                S3ResponseBody::empty(),
            )
        }
    }

    // -----------------------------------------------------------------------
    // Tagging
    // -----------------------------------------------------------------------

    /// `GET /:bucket/:key?tagging`.
    pub(crate) fn handle_get_object_tagging(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let (_, object) = self.lookup_object(ctx)?;
        let tagging = Tagging {
            tag_set: object.tags.clone(),
        };
        let xml = sandbar_xml::to_xml("Tagging", &tagging)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `PUT /:bucket/:key?tagging` — replaces the tag set; the ETag is
    /// untouched.
    pub(crate) fn handle_put_object_tagging(
        &self,
        body: &Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let tagging: Tagging = sandbar_xml::from_xml(body).map_err(xml_error_to_s3)?;
        let (bucket, object) = self.lookup_object(ctx)?;

        let mut updated = (*object).clone();
        updated.tags = tagging.tag_set;
        self.state.put_object(&bucket, updated)?;

        empty_response(StatusCode::OK)
    }

    /// `DELETE /:bucket/:key?tagging`.
    pub(crate) fn handle_delete_object_tagging(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let (bucket, object) = self.lookup_object(ctx)?;
        let mut updated = (*object).clone();
        updated.tags = Vec::new();
        self.state.put_object(&bucket, updated)?;
        empty_response(StatusCode::NO_CONTENT)
    }

    // -----------------------------------------------------------------------
    // ACL (echoed, never enforced)
    // -----------------------------------------------------------------------

    /// `GET /:bucket/:key?acl`.
    pub(crate) fn handle_get_object_acl(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        self.lookup_object(ctx)?;
        let doc = AccessControlPolicy {
            owner: self.state.owner().clone(),
        };
        let xml = sandbar_xml::to_xml("AccessControlPolicy", &doc)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `PUT /:bucket/:key?acl` — accepted and ignored.
    pub(crate) fn handle_put_object_acl(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        self.lookup_object(ctx)?;
        empty_response(StatusCode::OK)
    }

    /// Fetch the routed object or fail `NoSuchKey`.
    fn lookup_object(
        &self,
        ctx: &RoutingContext,
    ) -> Result<(String, std::sync::Arc<StoredObject>), S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;
        let object = bucket
            .objects
            .read()
            .get(key)
            .ok_or_else(|| S3Error::no_such_key(format!("/{bucket_name}/{key}")))?;
        Ok((bucket_name.to_owned(), object))
    }
}

/// Strip AWS streaming framing (when present) and pick the declared
/// length the body must match: the decoded length for chunked uploads,
/// plain `Content-Length` otherwise.
pub(crate) fn unwrap_body(
    parts: &http::request::Parts,
    body: Bytes,
) -> Result<(Bytes, Option<u64>), S3Error> {
    if is_aws_chunked(&parts.headers) {
        let decoded = decode_aws_chunked(&body)?;
        Ok((decoded, decoded_content_length(&parts.headers)))
    } else {
        Ok((body, declared_content_length(&parts.headers)))
    }
}

/// Build the 416 response: the XML envelope plus the `Content-Range:
/// bytes */<size>` header clients use to learn the object size.
fn range_not_satisfiable(size: u64) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let err = s3_error!(InvalidRange);
    let xml = sandbar_xml::error_to_xml(
        err.code.as_str(),
        &err.message,
        None,
        &generate_request_id(),
    );
    build(
        http::Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(http::header::CONTENT_TYPE, "application/xml")
            .header(http::header::CONTENT_RANGE, format!("bytes */{size}")),
        S3ResponseBody::from_xml(xml),
    )
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use sandbar_model::operations::S3Operation;

    use super::*;
    use crate::provider::tests::{ctx_for, test_provider};

    fn put_parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder()
            .method(http::Method::PUT)
            .uri("http://localhost:4568/bucket1/text");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).expect("valid request").into_parts();
        parts
    }

    fn get_parts(headers: &[(&str, &str)]) -> http::request::Parts {
        let mut builder = http::Request::builder()
            .method(http::Method::GET)
            .uri("http://localhost:4568/bucket1/text");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, ()) = builder.body(()).expect("valid request").into_parts();
        parts
    }

    async fn body_bytes(response: http::Response<S3ResponseBody>) -> Bytes {
        response.into_body().collect().await.expect("body").to_bytes()
    }

    fn provider_with_object(key: &str, body: &'static [u8]) -> SandbarS3 {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some(key));
        provider
            .handle_put_object(&put_parts(&[]), Bytes::from_static(body), &ctx)
            .expect("put");
        provider
    }

    #[tokio::test]
    async fn test_should_round_trip_put_and_get() {
        let provider = provider_with_object("text", b"Hello!");

        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("text"));
        let response = provider
            .handle_get_object(&get_parts(&[]), &ctx, false)
            .expect("get");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(http::header::ETAG)
                .and_then(|v| v.to_str().ok()),
            Some("\"952d2c56d0485958336747bcdd98590d\""),
        );
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("binary/octet-stream"),
        );
        assert_eq!(&body_bytes(response).await[..], b"Hello!");
    }

    #[tokio::test]
    async fn test_should_publish_put_event() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let mut rx = provider.events.subscribe("bucket1");

        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text"));
        provider
            .handle_put_object(&put_parts(&[]), Bytes::from_static(b"Hello!"), &ctx)
            .expect("put");

        let event = rx.recv().await.expect("event");
        assert_eq!(event.event_name, "ObjectCreated:Put");
        assert_eq!(event.object.key, "text");
        assert_eq!(event.object.size, 6);
    }

    #[tokio::test]
    async fn test_should_overwrite_on_second_put() {
        let provider = provider_with_object("text", b"first");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text"));
        provider
            .handle_put_object(&put_parts(&[]), Bytes::from_static(b"second"), &ctx)
            .expect("put");

        let response = provider
            .handle_get_object(&get_parts(&[]), &ctx, false)
            .expect("get");
        assert_eq!(&body_bytes(response).await[..], b"second");
    }

    #[tokio::test]
    async fn test_should_keep_trailing_slash_objects_distinct() {
        let provider = provider_with_object("text", b"A");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text/"));
        provider
            .handle_put_object(&put_parts(&[]), Bytes::from_static(b"B"), &ctx)
            .expect("put");

        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("text"));
        let response = provider.handle_get_object(&get_parts(&[]), &ctx, false).expect("get");
        assert_eq!(&body_bytes(response).await[..], b"A");

        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("text/"));
        let response = provider.handle_get_object(&get_parts(&[]), &ctx, false).expect("get");
        assert_eq!(&body_bytes(response).await[..], b"B");
    }

    #[tokio::test]
    async fn test_should_reject_bad_content_md5() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text"));

        let parts = put_parts(&[("content-md5", "rL0Y20zC+Fzt72VPzMSk2A==")]);
        let err = provider
            .handle_put_object(&parts, Bytes::from_static(b"Hello!"), &ctx)
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::BadDigest);
    }

    #[tokio::test]
    async fn test_should_reject_short_body_as_incomplete() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text"));

        let parts = put_parts(&[("content-length", "100")]);
        let err = provider
            .handle_put_object(&parts, Bytes::from_static(b"short"), &ctx)
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::IncompleteBody);
    }

    #[tokio::test]
    async fn test_should_store_lowercased_metadata() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("text"));

        let parts = put_parts(&[("X-Amz-Meta-OWNER", "alice")]);
        provider
            .handle_put_object(&parts, Bytes::from_static(b"x"), &ctx)
            .expect("put");

        let response = provider
            .handle_get_object(&get_parts(&[]), &ctx, false)
            .expect("get");
        assert_eq!(
            response
                .headers()
                .get("x-amz-meta-owner")
                .and_then(|v| v.to_str().ok()),
            Some("alice"),
        );
    }

    #[tokio::test]
    async fn test_should_serve_range_requests() {
        let provider = provider_with_object("blob", b"0123456789");

        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("blob"));
        let parts = get_parts(&[("range", "bytes=2-5")]);
        let response = provider.handle_get_object(&parts, &ctx, false).expect("get");

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok()),
            Some("bytes 2-5/10"),
        );
        assert_eq!(&body_bytes(response).await[..], b"2345");
    }

    #[tokio::test]
    async fn test_should_clamp_range_end_past_eof() {
        let provider = provider_with_object("blob", b"0123456789");
        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("blob"));
        let parts = get_parts(&[("range", "bytes=0-1000000")]);
        let response = provider.handle_get_object(&parts, &ctx, false).expect("get");

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok()),
            Some("10"),
        );
    }

    #[tokio::test]
    async fn test_should_return_416_for_start_past_eof() {
        let provider = provider_with_object("blob", b"0123456789");
        let ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("blob"));
        let parts = get_parts(&[("range", "bytes=100-")]);
        let response = provider.handle_get_object(&parts, &ctx, false).expect("get");

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok()),
            Some("bytes */10"),
        );
    }

    #[tokio::test]
    async fn test_should_apply_overrides_only_when_signed() {
        let provider = provider_with_object("text", b"Hello!");

        let mut ctx = ctx_for(S3Operation::GetObject, Some("bucket1"), Some("text"));
        ctx.query_params = vec![(
            "response-content-type".to_owned(),
            "text/plain".to_owned(),
        )];
        ctx.signed = true;

        let response = provider
            .handle_get_object(&get_parts(&[]), &ctx, false)
            .expect("get");
        assert_eq!(
            response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("text/plain"),
        );
    }

    #[tokio::test]
    async fn test_should_delete_idempotently() {
        let provider = provider_with_object("text", b"x");
        let ctx = ctx_for(S3Operation::DeleteObject, Some("bucket1"), Some("text"));

        let response = provider.handle_delete_object(&ctx).expect("delete");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // A second delete of the now-missing key still succeeds.
        let response = provider.handle_delete_object(&ctx).expect("delete again");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_should_delete_multiple_objects_reporting_all_keys() {
        let provider = provider_with_object("key1", b"x");
        let ctx = ctx_for(S3Operation::DeleteObjects, Some("bucket1"), None);

        let body = Bytes::from_static(
            br"<Delete><Object><Key>key1</Key></Object><Object><Key>missing</Key></Object></Delete>",
        );
        let response = provider.handle_delete_objects(&body, &ctx).expect("delete");
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf8");
        assert!(text.contains("<Deleted><Key>key1</Key></Deleted>"));
        assert!(text.contains("<Deleted><Key>missing</Key></Deleted>"));
    }

    #[tokio::test]
    async fn test_should_reject_empty_delete_request() {
        let provider = provider_with_object("key1", b"x");
        let ctx = ctx_for(S3Operation::DeleteObjects, Some("bucket1"), None);

        let body = Bytes::from_static(br"<Delete><Quiet>false</Quiet></Delete>");
        let err = provider.handle_delete_objects(&body, &ctx).unwrap_err();
        assert_eq!(err.code, S3ErrorCode::MalformedXML);
    }

    #[tokio::test]
    async fn test_should_copy_object_carrying_metadata() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("src"));
        let parts = put_parts(&[
            ("content-type", "text/plain"),
            ("x-amz-meta-owner", "alice"),
        ]);
        provider
            .handle_put_object(&parts, Bytes::from_static(b"Hello!"), &ctx)
            .expect("put");

        let ctx = ctx_for(S3Operation::CopyObject, Some("bucket1"), Some("dest"));
        let parts = put_parts(&[("x-amz-copy-source", "/bucket1/src")]);
        let response = provider.handle_copy_object(&parts, &ctx).expect("copy");
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf8");
        assert!(text.contains("<CopyObjectResult"));
        assert!(text.contains("952d2c56d0485958336747bcdd98590d"));

        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let copied = bucket.objects.read().get("dest").expect("dest");
        assert_eq!(copied.content_type, "text/plain");
        assert_eq!(copied.metadata.get("owner").map(String::as_str), Some("alice"));
    }

    #[tokio::test]
    async fn test_should_replace_metadata_on_replace_directive() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::PutObject, Some("bucket1"), Some("src"));
        let parts = put_parts(&[("content-type", "text/plain"), ("x-amz-meta-a", "1")]);
        provider
            .handle_put_object(&parts, Bytes::from_static(b"data"), &ctx)
            .expect("put");

        let ctx = ctx_for(S3Operation::CopyObject, Some("bucket1"), Some("dest"));
        let parts = put_parts(&[
            ("x-amz-copy-source", "/bucket1/src"),
            ("x-amz-metadata-directive", "REPLACE"),
            ("x-amz-meta-b", "2"),
        ]);
        provider.handle_copy_object(&parts, &ctx).expect("copy");

        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let copied = bucket.objects.read().get("dest").expect("dest");
        // REPLACE with no Content-Type falls back to the copy default.
        assert_eq!(copied.content_type, "application/octet-stream");
        assert!(copied.metadata.contains_key("b"));
        assert!(!copied.metadata.contains_key("a"));
        assert_eq!(&copied.data[..], b"data");
    }

    #[tokio::test]
    async fn test_should_reject_self_copy_without_changes() {
        let provider = provider_with_object("src", b"x");
        let ctx = ctx_for(S3Operation::CopyObject, Some("bucket1"), Some("src"));
        let parts = put_parts(&[("x-amz-copy-source", "/bucket1/src")]);
        let err = provider.handle_copy_object(&parts, &ctx).unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidRequest);

        // With REPLACE the same copy is legal.
        let parts = put_parts(&[
            ("x-amz-copy-source", "/bucket1/src"),
            ("x-amz-metadata-directive", "REPLACE"),
        ]);
        assert!(provider.handle_copy_object(&parts, &ctx).is_ok());
    }

    #[tokio::test]
    async fn test_should_round_trip_object_tagging() {
        let provider = provider_with_object("text", b"Hello!");
        let etag_before = {
            let bucket = provider.state.get_bucket("bucket1").expect("bucket");
            let store = bucket.objects.read();
            store.get("text").expect("object").etag.clone()
        };

        let ctx = ctx_for(S3Operation::PutObjectTagging, Some("bucket1"), Some("text"));
        let body = Bytes::from_static(
            br"<Tagging><TagSet><Tag><Key>env</Key><Value>dev</Value></Tag></TagSet></Tagging>",
        );
        provider.handle_put_object_tagging(&body, &ctx).expect("put tags");

        let response = provider.handle_get_object_tagging(&ctx).expect("get tags");
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf8");
        assert!(text.contains("<Key>env</Key>"));

        // Replacing tags must not change the ETag.
        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let etag_after = bucket.objects.read().get("text").expect("object").etag.clone();
        assert_eq!(etag_before, etag_after);

        provider.handle_delete_object_tagging(&ctx).expect("delete tags");
        let response = provider.handle_get_object_tagging(&ctx).expect("get tags");
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf8");
        assert!(text.contains("<TagSet/>") || text.contains("<TagSet></TagSet>"));
    }

    #[tokio::test]
    async fn test_should_reject_tagging_of_missing_key() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let ctx = ctx_for(S3Operation::GetObjectTagging, Some("bucket1"), Some("nope"));
        let err = provider.handle_get_object_tagging(&ctx).unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchKey);
    }

    #[tokio::test]
    async fn test_should_upload_via_post_form() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");

        let boundary = "----sandbarform";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"key\"\r\n\r\nuploads/${{filename}}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"x-amz-meta-origin\"\r\n\r\nbrowser\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\n\
                 Content-Type: image/png\r\n\r\nPNGDATA\r\n--{boundary}--\r\n"
            )
            .as_bytes(),
        );

        let (parts, ()) = http::Request::builder()
            .method(http::Method::POST)
            .uri("http://localhost:4568/bucket1")
            .header(
                http::header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(())
            .expect("valid request")
            .into_parts();

        let ctx = ctx_for(S3Operation::PostObject, Some("bucket1"), None);
        let response = provider
            .handle_post_object(&parts, &Bytes::from(body), &ctx)
            .expect("post");

        assert_eq!(response.status(), StatusCode::CREATED);
        let text = String::from_utf8(body_bytes(response).await.to_vec()).expect("utf8");
        assert!(text.contains("<Key>uploads/photo.png</Key>"));

        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let object = bucket.objects.read().get("uploads/photo.png").expect("object");
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.metadata.get("origin").map(String::as_str), Some("browser"));
    }
}
