//! Error envelope integration tests.

#[cfg(test)]
mod tests {
    use crate::{cleanup_bucket, create_test_bucket, s3_client, test_bucket_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_bucket() {
        let client = s3_client();
        let missing = test_bucket_name("never-created");

        let err = client
            .list_objects_v2()
            .bucket(&missing)
            .send()
            .await
            .expect_err("listing a missing bucket must fail");
        let service_err = err.into_service_error();
        assert!(
            service_err
                .meta()
                .code()
                .is_some_and(|c| c == "NoSuchBucket"),
            "{service_err:?}"
        );
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_no_such_key() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "err").await;

        let err = client
            .get_object()
            .bucket(&bucket)
            .key("missing")
            .send()
            .await
            .expect_err("missing key must fail");
        let service_err = err.into_service_error();
        assert!(service_err.is_no_such_key(), "{service_err:?}");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_empty_multi_delete() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mdel").await;

        let delete = aws_sdk_s3::types::Delete::builder()
            .build();
        // An empty Objects list is a client-side builder error in newer
        // SDKs; when it does reach the server the response is MalformedXML.
        match delete {
            Ok(delete) => {
                let err = client
                    .delete_objects()
                    .bucket(&bucket)
                    .delete(delete)
                    .send()
                    .await
                    .expect_err("empty delete must fail");
                assert!(
                    err.into_service_error()
                        .meta()
                        .code()
                        .is_some_and(|c| c == "MalformedXML"),
                );
            }
            Err(_) => {
                // Builder already refused the empty list.
            }
        }

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_all_keys_deleted_in_multi_delete() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "mdel-ok").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("key1")
            .body(aws_sdk_s3::primitives::ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        let delete = aws_sdk_s3::types::Delete::builder()
            .objects(
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key("key1")
                    .build()
                    .expect("id"),
            )
            .objects(
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key("never-existed")
                    .build()
                    .expect("id"),
            )
            .build()
            .expect("delete");

        let resp = client
            .delete_objects()
            .bucket(&bucket)
            .delete(delete)
            .send()
            .await
            .expect("delete_objects");

        // Every requested key is reported deleted, present or not.
        let deleted: Vec<&str> = resp.deleted().iter().filter_map(|d| d.key()).collect();
        assert!(deleted.contains(&"key1"));
        assert!(deleted.contains(&"never-existed"));
        assert!(resp.errors().is_empty());

        cleanup_bucket(&client, &bucket).await;
    }
}
