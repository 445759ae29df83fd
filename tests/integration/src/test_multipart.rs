//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
    use md5::Digest;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    /// Minimum part size accepted by SDK-managed uploads.
    const PART_SIZE: usize = 5 * 1024 * 1024;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_assemble_20mib_upload_with_composite_etag() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu").await;

        let init = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("big")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = init.upload_id().expect("upload id").to_owned();

        // Four 5 MiB zero parts = the 20 MiB scenario.
        let part = vec![0u8; PART_SIZE];
        let mut completed_parts = Vec::new();
        let mut digests = Vec::new();
        for number in 1..=4 {
            let resp = client
                .upload_part()
                .bucket(&bucket)
                .key("big")
                .upload_id(&upload_id)
                .part_number(number)
                .body(ByteStream::from(part.clone()))
                .send()
                .await
                .expect("upload_part");
            let etag = resp.e_tag().expect("part etag").to_owned();
            digests.extend_from_slice(&md5::Md5::digest(&part));
            completed_parts.push(
                CompletedPart::builder()
                    .part_number(number)
                    .e_tag(etag)
                    .build(),
            );
        }

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();
        let resp = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("big")
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .expect("complete_multipart_upload");

        // ETag = md5(concat(part md5s)) + "-N".
        let expected = format!("\"{}-4\"", hex::encode(md5::Md5::digest(&digests)));
        assert_eq!(resp.e_tag(), Some(expected.as_str()));

        let head = client
            .head_object()
            .bucket(&bucket)
            .key("big")
            .send()
            .await
            .expect("head_object");
        assert_eq!(head.content_length(), Some(4 * PART_SIZE as i64));
        assert_eq!(head.e_tag(), Some(expected.as_str()));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_parts_and_uploads() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu-list").await;

        let init = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("staged")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = init.upload_id().expect("upload id").to_owned();

        client
            .upload_part()
            .bucket(&bucket)
            .key("staged")
            .upload_id(&upload_id)
            .part_number(2)
            .body(ByteStream::from_static(b"bbb"))
            .send()
            .await
            .expect("upload part 2");
        client
            .upload_part()
            .bucket(&bucket)
            .key("staged")
            .upload_id(&upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"aaa"))
            .send()
            .await
            .expect("upload part 1");

        let uploads = client
            .list_multipart_uploads()
            .bucket(&bucket)
            .send()
            .await
            .expect("list_multipart_uploads");
        assert_eq!(uploads.uploads().len(), 1);
        assert_eq!(uploads.uploads()[0].key(), Some("staged"));

        let parts = client
            .list_parts()
            .bucket(&bucket)
            .key("staged")
            .upload_id(&upload_id)
            .send()
            .await
            .expect("list_parts");
        let numbers: Vec<i32> = parts.parts().iter().filter_map(|p| p.part_number()).collect();
        assert_eq!(numbers, vec![1, 2], "parts listed in ascending order");

        client
            .abort_multipart_upload()
            .bucket(&bucket)
            .key("staged")
            .upload_id(&upload_id)
            .send()
            .await
            .expect("abort_multipart_upload");

        let uploads = client
            .list_multipart_uploads()
            .bucket(&bucket)
            .send()
            .await
            .expect("list after abort");
        assert!(uploads.uploads().is_empty());

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_completion_with_wrong_etag() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mpu-bad").await;

        let init = client
            .create_multipart_upload()
            .bucket(&bucket)
            .key("bad")
            .send()
            .await
            .expect("create_multipart_upload");
        let upload_id = init.upload_id().expect("upload id").to_owned();

        client
            .upload_part()
            .bucket(&bucket)
            .key("bad")
            .upload_id(&upload_id)
            .part_number(1)
            .body(ByteStream::from_static(b"data"))
            .send()
            .await
            .expect("upload part");

        let completed = CompletedMultipartUpload::builder()
            .parts(
                CompletedPart::builder()
                    .part_number(1)
                    .e_tag("\"00000000000000000000000000000000\"")
                    .build(),
            )
            .build();
        let err = client
            .complete_multipart_upload()
            .bucket(&bucket)
            .key("bad")
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .expect_err("mismatched etag must fail");
        assert!(
            err.into_service_error()
                .meta()
                .code()
                .is_some_and(|c| c == "InvalidPart"),
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
