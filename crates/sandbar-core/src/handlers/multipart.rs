//! Multipart-upload handlers.
//!
//! Parts are staged per upload ID, possibly out of order; completion
//! validates the client's manifest, assembles the parts in ascending
//! part-number order, and derives the multipart ETag
//! (`md5(concat(part_md5s))-N`).

use bytes::{Bytes, BytesMut};
use chrono::Utc;
use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::request::{
    content_md5, content_type, metadata_from_headers, query_int, query_value,
    website_redirect_location,
};
use sandbar_http::response::{build, empty_response, xml_response};
use sandbar_http::router::RoutingContext;
use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{
    CompletedMultipartUpload, ListMultipartUploadsOutput, ListPartsOutput,
    MultipartUploadSummary, PartSummary,
};
use sandbar_xml::serialize::{CompleteMultipartUploadResult, InitiateMultipartUploadResult};
use tracing::debug;

use crate::events::{EventName, EventRecord};
use crate::handlers::{bucket_of, key_of, xml_error_to_s3};
use crate::provider::SandbarS3;
use crate::state::multipart::{MAX_PART_NUMBER, MultipartUpload, UploadPart};
use crate::state::object::StoredObject;
use crate::utils::{etag_digest, etag_of, md5_digest, multipart_etag, verify_content_md5};

/// Default and maximum page size for upload/part listings.
const LISTING_CAP: i64 = 1000;

impl SandbarS3 {
    /// `POST /:bucket/:key?uploads` — initiate a multipart upload.
    pub(crate) fn handle_create_multipart_upload(
        &self,
        parts: &http::request::Parts,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let upload_id = crate::utils::generate_upload_id();
        let mut upload = MultipartUpload::new(upload_id.clone(), key.to_owned());
        upload.content_type = content_type(&parts.headers);
        upload.metadata = metadata_from_headers(&parts.headers);
        upload.website_redirect_location = website_redirect_location(&parts.headers);
        bucket.uploads.write().insert(upload_id.clone(), upload);

        debug!(bucket = bucket_name, key, upload_id, "initiated multipart upload");

        let xml = sandbar_xml::to_xml(
            "InitiateMultipartUploadResult",
            &InitiateMultipartUploadResult {
                bucket: bucket_name.to_owned(),
                key: key.to_owned(),
                upload_id,
            },
        )
        .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `PUT /:bucket/:key?partNumber=N&uploadId=…` — stage one part.
    pub(crate) fn handle_upload_part(
        &self,
        parts: &http::request::Parts,
        body: Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let part_number = query_int(&ctx.query_params, "partNumber")?
            .ok_or_else(|| S3Error::invalid_argument("Missing partNumber parameter"))?;
        if !(1..=i64::from(MAX_PART_NUMBER)).contains(&part_number) {
            return Err(S3Error::invalid_argument(
                "Part number must be an integer between 1 and 10000, inclusive",
            ));
        }
        let part_number = u32::try_from(part_number).expect("range-checked part number");

        let upload_id = query_value(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("Missing uploadId parameter"))?
            .to_owned();

        let (body, declared) = crate::handlers::object::unwrap_body(parts, body)?;
        if let Some(declared) = declared {
            if declared != body.len() as u64 {
                return Err(S3Error::new(S3ErrorCode::IncompleteBody));
            }
        }

        let digest = md5_digest(&body);
        if let Some(header) = content_md5(&parts.headers) {
            verify_content_md5(&header, &digest)?;
        }

        let etag = etag_of(&body);
        let mut uploads = bucket.uploads.write();
        let upload = uploads
            .get_mut(&upload_id)
            .ok_or_else(|| S3Error::no_such_upload(&upload_id))?;
        upload.put_part(UploadPart {
            part_number,
            etag: etag.clone(),
            data: body,
            last_modified: Utc::now(),
        });
        drop(uploads);

        debug!(bucket = bucket_name, upload_id, part_number, "staged part");

        build(
            http::Response::builder()
                .status(StatusCode::OK)
                .header(http::header::ETAG, &etag),
            S3ResponseBody::empty(),
        )
    }

    /// `POST /:bucket/:key?uploadId=…` — assemble the staged parts.
    pub(crate) fn handle_complete_multipart_upload(
        &self,
        body: &Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let upload_id = query_value(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("Missing uploadId parameter"))?
            .to_owned();

        let manifest: CompletedMultipartUpload =
            sandbar_xml::from_xml(body).map_err(xml_error_to_s3)?;
        if manifest.parts.is_empty() {
            return Err(S3Error::malformed_xml());
        }

        // The manifest must list parts in strictly ascending order.
        for window in manifest.parts.windows(2) {
            if window[1].part_number <= window[0].part_number {
                return Err(S3Error::new(S3ErrorCode::InvalidPartOrder));
            }
        }

        let upload = {
            let uploads = bucket.uploads.read();
            uploads
                .get(&upload_id)
                .cloned()
                .ok_or_else(|| S3Error::no_such_upload(&upload_id))?
        };

        // Every listed part must exist with a matching ETag.
        let mut assembled = BytesMut::new();
        let mut digests = Vec::with_capacity(manifest.parts.len());
        for listed in &manifest.parts {
            let staged = upload
                .get_part(listed.part_number)
                .ok_or_else(|| S3Error::new(S3ErrorCode::InvalidPart))?;
            if staged.etag.trim_matches('"') != listed.etag.trim_matches('"') {
                return Err(S3Error::new(S3ErrorCode::InvalidPart));
            }
            let digest = etag_digest(&staged.etag)
                .ok_or_else(|| S3Error::internal_error("stored part carries a non-MD5 ETag"))?;
            digests.push(digest);
            assembled.extend_from_slice(&staged.data);
        }

        let etag = multipart_etag(&digests);
        let data = assembled.freeze();
        let size = data.len() as u64;

        let mut object = StoredObject::new(key, data, upload.content_type.clone());
        object.etag = etag.clone();
        object.metadata = upload.metadata.clone();
        object.website_redirect_location = upload.website_redirect_location.clone();

        self.state.put_object(bucket_name, object)?;
        bucket.uploads.write().remove(&upload_id);

        self.events.publish(EventRecord::new(
            EventName::CreatedCompleteMultipartUpload,
            bucket_name,
            key,
            size,
            &etag,
            Utc::now(),
        ));
        debug!(bucket = bucket_name, key, upload_id, size, "completed multipart upload");

        let xml = sandbar_xml::to_xml(
            "CompleteMultipartUploadResult",
            &CompleteMultipartUploadResult {
                location: format!("http://{}/{bucket_name}/{key}", self.config.service_endpoint),
                bucket: bucket_name.to_owned(),
                key: key.to_owned(),
                etag,
            },
        )
        .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `DELETE /:bucket/:key?uploadId=…` — discard the staged parts.
    pub(crate) fn handle_abort_multipart_upload(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let upload_id = query_value(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("Missing uploadId parameter"))?;
        bucket
            .uploads
            .write()
            .remove(upload_id)
            .ok_or_else(|| S3Error::no_such_upload(upload_id))?;

        empty_response(StatusCode::NO_CONTENT)
    }

    /// `GET /:bucket?uploads` — list in-progress uploads.
    pub(crate) fn handle_list_multipart_uploads(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let prefix = query_value(&ctx.query_params, "prefix").unwrap_or("");
        let key_marker = query_value(&ctx.query_params, "key-marker").unwrap_or("");
        let upload_id_marker = query_value(&ctx.query_params, "upload-id-marker").unwrap_or("");
        let max_uploads = query_int(&ctx.query_params, "max-uploads")?.unwrap_or(LISTING_CAP);
        let cap = usize::try_from(max_uploads.clamp(0, LISTING_CAP)).unwrap_or(0);

        // Uploads sort by (key, upload_id); the marker pair is exclusive.
        let mut entries: Vec<MultipartUploadSummary> = bucket
            .uploads
            .read()
            .values()
            .filter(|u| u.key.starts_with(prefix))
            .map(|u| MultipartUploadSummary {
                upload_id: u.upload_id.clone(),
                key: u.key.clone(),
                initiated: u.initiated,
                owner: self.state.owner().clone(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| a.upload_id.cmp(&b.upload_id))
        });

        let after_marker = |entry: &MultipartUploadSummary| {
            if key_marker.is_empty() {
                return true;
            }
            match entry.key.as_str().cmp(key_marker) {
                std::cmp::Ordering::Greater => true,
                std::cmp::Ordering::Equal => {
                    !upload_id_marker.is_empty() && entry.upload_id.as_str() > upload_id_marker
                }
                std::cmp::Ordering::Less => false,
            }
        };
        let mut remaining: Vec<MultipartUploadSummary> =
            entries.into_iter().filter(after_marker).collect();

        let is_truncated = remaining.len() > cap;
        remaining.truncate(cap);

        let (next_key_marker, next_upload_id_marker) = if is_truncated {
            remaining
                .last()
                .map(|u| (Some(u.key.clone()), Some(u.upload_id.clone())))
                .unwrap_or((None, None))
        } else {
            (None, None)
        };

        let output = ListMultipartUploadsOutput {
            bucket: bucket_name.to_owned(),
            key_marker: query_value(&ctx.query_params, "key-marker").map(ToOwned::to_owned),
            upload_id_marker: query_value(&ctx.query_params, "upload-id-marker")
                .map(ToOwned::to_owned),
            max_uploads,
            is_truncated,
            next_key_marker,
            next_upload_id_marker,
            prefix: query_value(&ctx.query_params, "prefix").map(ToOwned::to_owned),
            uploads: remaining,
        };

        let xml = sandbar_xml::to_xml("ListMultipartUploadsResult", &output)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `GET /:bucket/:key?uploadId=…` — list staged parts.
    pub(crate) fn handle_list_parts(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let key = key_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;

        let upload_id = query_value(&ctx.query_params, "uploadId")
            .ok_or_else(|| S3Error::invalid_argument("Missing uploadId parameter"))?
            .to_owned();
        let marker = query_int(&ctx.query_params, "part-number-marker")?.unwrap_or(0);
        let max_parts = query_int(&ctx.query_params, "max-parts")?.unwrap_or(LISTING_CAP);
        let cap = usize::try_from(max_parts.clamp(0, LISTING_CAP)).unwrap_or(0);

        let uploads = bucket.uploads.read();
        let upload = uploads
            .get(&upload_id)
            .ok_or_else(|| S3Error::no_such_upload(&upload_id))?;

        let mut parts: Vec<PartSummary> = upload
            .parts
            .values()
            .filter(|p| i64::from(p.part_number) > marker)
            .map(|p| PartSummary {
                part_number: p.part_number,
                etag: p.etag.clone(),
                size: p.size(),
                last_modified: p.last_modified,
            })
            .collect();
        drop(uploads);

        let is_truncated = parts.len() > cap;
        parts.truncate(cap);
        let next_part_number_marker = if is_truncated {
            parts.last().map(|p| p.part_number)
        } else {
            None
        };

        let output = ListPartsOutput {
            bucket: bucket_name.to_owned(),
            key: key.to_owned(),
            upload_id,
            part_number_marker: u32::try_from(marker).ok().filter(|m| *m > 0),
            next_part_number_marker,
            max_parts,
            is_truncated,
            parts,
            owner: self.state.owner().clone(),
        };

        let xml = sandbar_xml::to_xml("ListPartsResult", &output)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use sandbar_model::operations::S3Operation;

    use super::*;
    use crate::provider::tests::{ctx_for, test_provider};

    fn empty_parts() -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method(http::Method::POST)
            .uri("http://localhost:4568/bucket1/big")
            .body(())
            .expect("valid request")
            .into_parts();
        parts
    }

    async fn body_string(response: http::Response<S3ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf8")
    }

    fn extract(body: &str, open: &str, close: &str) -> String {
        let start = body.find(open).expect("open tag") + open.len();
        let end = body.find(close).expect("close tag");
        body[start..end].to_owned()
    }

    async fn initiate(provider: &SandbarS3) -> String {
        let ctx = ctx_for(S3Operation::CreateMultipartUpload, Some("bucket1"), Some("big"));
        let response = provider
            .handle_create_multipart_upload(&empty_parts(), &ctx)
            .expect("initiate");
        let body = body_string(response).await;
        extract(&body, "<UploadId>", "</UploadId>")
    }

    fn upload_part_ctx(upload_id: &str, number: u32) -> sandbar_http::RoutingContext {
        let mut ctx = ctx_for(S3Operation::UploadPart, Some("bucket1"), Some("big"));
        ctx.query_params = vec![
            ("partNumber".to_owned(), number.to_string()),
            ("uploadId".to_owned(), upload_id.to_owned()),
        ];
        ctx
    }

    fn upload_part(provider: &SandbarS3, upload_id: &str, number: u32, body: &'static [u8]) -> String {
        let ctx = upload_part_ctx(upload_id, number);
        let response = provider
            .handle_upload_part(&empty_parts(), Bytes::from_static(body), &ctx)
            .expect("upload part");
        response
            .headers()
            .get(http::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .expect("etag")
            .to_owned()
    }

    #[tokio::test]
    async fn test_should_complete_multipart_upload_with_composite_etag() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;

        let etag1 = upload_part(&provider, &upload_id, 1, b"first part data");
        let etag2 = upload_part(&provider, &upload_id, 2, b"second part data");

        let manifest = format!(
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>{etag1}</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>{etag2}</ETag></Part>\
             </CompleteMultipartUpload>"
        );
        let mut ctx = ctx_for(S3Operation::CompleteMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id.clone())];

        let response = provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .expect("complete");
        let body = body_string(response).await;

        let expected = multipart_etag(&[md5_digest(b"first part data"), md5_digest(b"second part data")]);
        assert!(body.contains(&expected.replace('"', "&quot;")));

        // The assembled object is the concatenation of the parts.
        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let object = bucket.objects.read().get("big").expect("object");
        assert_eq!(&object.data[..], b"first part datasecond part data");
        assert_eq!(object.etag, expected);
        assert!(object.etag.ends_with("-2\""));

        // The upload is gone after completion.
        assert!(bucket.uploads.read().get(&upload_id).is_none());
    }

    #[tokio::test]
    async fn test_should_accept_out_of_order_part_uploads() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;

        let etag2 = upload_part(&provider, &upload_id, 2, b"BBB");
        let etag1 = upload_part(&provider, &upload_id, 1, b"AAA");

        let manifest = format!(
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>{etag1}</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>{etag2}</ETag></Part>\
             </CompleteMultipartUpload>"
        );
        let mut ctx = ctx_for(S3Operation::CompleteMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id)];
        provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .expect("complete");

        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let object = bucket.objects.read().get("big").expect("object");
        assert_eq!(&object.data[..], b"AAABBB");
    }

    #[tokio::test]
    async fn test_should_reject_descending_manifest_order() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;
        let etag1 = upload_part(&provider, &upload_id, 1, b"AAA");
        let etag2 = upload_part(&provider, &upload_id, 2, b"BBB");

        let manifest = format!(
            "<CompleteMultipartUpload>\
             <Part><PartNumber>2</PartNumber><ETag>{etag2}</ETag></Part>\
             <Part><PartNumber>1</PartNumber><ETag>{etag1}</ETag></Part>\
             </CompleteMultipartUpload>"
        );
        let mut ctx = ctx_for(S3Operation::CompleteMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id)];
        let err = provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidPartOrder);
    }

    #[tokio::test]
    async fn test_should_reject_manifest_with_wrong_etag_or_missing_part() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;
        upload_part(&provider, &upload_id, 1, b"AAA");

        let manifest = "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>\"0000\"</ETag></Part>\
             </CompleteMultipartUpload>"
            .to_owned();
        let mut ctx = ctx_for(S3Operation::CompleteMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id.clone())];
        let err = provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidPart);

        let manifest = "<CompleteMultipartUpload>\
             <Part><PartNumber>7</PartNumber><ETag>\"0000\"</ETag></Part>\
             </CompleteMultipartUpload>"
            .to_owned();
        let err = provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .unwrap_err();
        assert_eq!(err.code, S3ErrorCode::InvalidPart);
    }

    #[tokio::test]
    async fn test_should_reject_out_of_range_part_numbers() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;

        for bad in [0u32, 10_001] {
            let ctx = upload_part_ctx(&upload_id, bad);
            let err = provider
                .handle_upload_part(&empty_parts(), Bytes::from_static(b"x"), &ctx)
                .unwrap_err();
            assert_eq!(err.code, S3ErrorCode::InvalidArgument, "part {bad}");
        }
    }

    #[tokio::test]
    async fn test_should_abort_upload_and_reject_unknown_ids() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;
        upload_part(&provider, &upload_id, 1, b"AAA");

        let mut ctx = ctx_for(S3Operation::AbortMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id.clone())];
        let response = provider.handle_abort_multipart_upload(&ctx).expect("abort");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let err = provider.handle_abort_multipart_upload(&ctx).unwrap_err();
        assert_eq!(err.code, S3ErrorCode::NoSuchUpload);
    }

    #[tokio::test]
    async fn test_should_list_parts_in_ascending_order() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;
        upload_part(&provider, &upload_id, 3, b"CCC");
        upload_part(&provider, &upload_id, 1, b"AAA");

        let mut ctx = ctx_for(S3Operation::ListParts, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id)];
        let response = provider.handle_list_parts(&ctx).expect("list parts");
        let body = body_string(response).await;

        let first = body.find("<PartNumber>1</PartNumber>").expect("part 1");
        let third = body.find("<PartNumber>3</PartNumber>").expect("part 3");
        assert!(first < third);
    }

    #[tokio::test]
    async fn test_should_list_uploads_for_bucket() {
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;

        let ctx = ctx_for(S3Operation::ListMultipartUploads, Some("bucket1"), None);
        let response = provider.handle_list_multipart_uploads(&ctx).expect("list");
        let body = body_string(response).await;
        assert!(body.contains(&format!("<UploadId>{upload_id}</UploadId>")));
        assert!(body.contains("<Key>big</Key>"));
    }

    #[tokio::test]
    async fn test_should_assemble_large_upload_with_spec_etag_scheme() {
        // A scaled-down version of the 20 MiB zero-buffer scenario: two
        // 5 MiB-shaped zero parts (sized down for test speed).
        let provider = test_provider();
        provider.state.create_bucket("bucket1").expect("create");
        let upload_id = initiate(&provider).await;

        static ZEROS: &[u8] = &[0u8; 64 * 1024];
        let etag1 = upload_part(&provider, &upload_id, 1, ZEROS);
        let etag2 = upload_part(&provider, &upload_id, 2, ZEROS);
        assert_eq!(etag1, etag2);

        let manifest = format!(
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>{etag1}</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>{etag2}</ETag></Part>\
             </CompleteMultipartUpload>"
        );
        let mut ctx = ctx_for(S3Operation::CompleteMultipartUpload, Some("bucket1"), Some("big"));
        ctx.query_params = vec![("uploadId".to_owned(), upload_id)];
        provider
            .handle_complete_multipart_upload(&Bytes::from(manifest), &ctx)
            .expect("complete");

        let bucket = provider.state.get_bucket("bucket1").expect("bucket");
        let object = bucket.objects.read().get("big").expect("object");
        assert_eq!(object.size, 2 * 64 * 1024);
        let expected = multipart_etag(&[md5_digest(ZEROS), md5_digest(ZEROS)]);
        assert_eq!(object.etag, expected);
    }
}
