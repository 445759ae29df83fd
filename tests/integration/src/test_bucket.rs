//! Bucket CRUD integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_create_list_and_delete_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "crud").await;

        let resp = client.list_buckets().send().await.expect("list_buckets");
        let names: Vec<&str> = resp.buckets().iter().filter_map(|b| b.name()).collect();
        assert!(names.contains(&bucket.as_str()), "bucket should be listed");

        client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket");

        let resp = client.list_buckets().send().await.expect("list_buckets");
        let names: Vec<&str> = resp.buckets().iter().filter_map(|b| b.name()).collect();
        assert!(!names.contains(&bucket.as_str()), "bucket should be gone");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_invalid_bucket_names() {
        let client = s3_client();

        for name in ["ab", "UPPERCASE", "my..bucket", "192.168.0.1", "-leading"] {
            let err = client
                .create_bucket()
                .bucket(name)
                .send()
                .await
                .expect_err("invalid name must be rejected");
            let service_err = err.into_service_error();
            assert!(
                service_err
                    .meta()
                    .code()
                    .is_some_and(|c| c == "InvalidBucketName"),
                "name {name}: {service_err:?}"
            );
        }
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_deleting_non_empty_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "nonempty").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("deeply/nested/key")
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        let err = client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("delete of non-empty bucket must fail");
        assert!(
            err.into_service_error()
                .meta()
                .code()
                .is_some_and(|c| c == "BucketNotEmpty"),
        );

        // Deleting the nested object empties the bucket immediately; no
        // ghost directory remains.
        client
            .delete_object()
            .bucket(&bucket)
            .key("deeply/nested/key")
            .send()
            .await
            .expect("delete_object");
        client
            .delete_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket after emptying");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_head_bucket() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "head").await;

        client
            .head_bucket()
            .bucket(&bucket)
            .send()
            .await
            .expect("head_bucket");

        let missing = test_bucket_name("never-created");
        assert!(client.head_bucket().bucket(&missing).send().await.is_err());

        cleanup_bucket(&client, &bucket).await;
    }
}
