//! Object CRUD integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_put_and_get_object_with_known_etag() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "putget").await;

        let put = client
            .put_object()
            .bucket(&bucket)
            .key("text")
            .body(ByteStream::from_static(b"Hello!"))
            .send()
            .await
            .expect("put_object");
        assert_eq!(
            put.e_tag(),
            Some("\"952d2c56d0485958336747bcdd98590d\""),
            "ETag is the quoted hex MD5 of the body",
        );

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("text")
            .send()
            .await
            .expect("get_object");
        assert_eq!(resp.content_type(), Some("binary/octet-stream"));
        assert_eq!(resp.content_length(), Some(6));
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"Hello!");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_overwrite_and_reflect_latest_body() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "overwrite").await;

        for body in [&b"first"[..], &b"second"[..]] {
            client
                .put_object()
                .bucket(&bucket)
                .key("key")
                .body(ByteStream::from(body.to_vec()))
                .send()
                .await
                .expect("put_object");
        }

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("key")
            .send()
            .await
            .expect("get_object");
        let etag = resp.e_tag().map(ToOwned::to_owned);
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"second");

        let digest = hex::encode(<md5::Md5 as md5::Digest>::digest(b"second"));
        assert_eq!(etag.as_deref(), Some(format!("\"{digest}\"").as_str()));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_treat_trailing_slash_keys_as_distinct() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "slash").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("text")
            .body(ByteStream::from_static(b"A"))
            .send()
            .await
            .expect("put text");
        client
            .put_object()
            .bucket(&bucket)
            .key("text/")
            .body(ByteStream::from_static(b"B"))
            .send()
            .await
            .expect("put text/");

        let a = client
            .get_object()
            .bucket(&bucket)
            .key("text")
            .send()
            .await
            .expect("get text")
            .body
            .collect()
            .await
            .expect("collect")
            .into_bytes();
        assert_eq!(a.as_ref(), b"A");

        let b = client
            .get_object()
            .bucket(&bucket)
            .key("text/")
            .send()
            .await
            .expect("get text/")
            .body
            .collect()
            .await
            .expect("collect")
            .into_bytes();
        assert_eq!(b.as_ref(), b"B");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_missing_key_without_error() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "del").await;

        // Deleting a nonexistent key is a 204, not an error.
        client
            .delete_object()
            .bucket(&bucket)
            .key("never-existed")
            .send()
            .await
            .expect("idempotent delete");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_user_metadata() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "meta").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("key")
            .body(ByteStream::from_static(b"x"))
            .metadata("Owner", "alice")
            .send()
            .await
            .expect("put_object");

        let resp = client
            .head_object()
            .bucket(&bucket)
            .key("key")
            .send()
            .await
            .expect("head_object");
        // Metadata keys come back lowercased.
        assert_eq!(
            resp.metadata().and_then(|m| m.get("owner")).map(String::as_str),
            Some("alice"),
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_byte_ranges() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "range").await;

        let body: Vec<u8> = (0..=199).map(|i| (i % 256) as u8).collect();
        client
            .put_object()
            .bucket(&bucket)
            .key("blob")
            .body(ByteStream::from(body.clone()))
            .send()
            .await
            .expect("put_object");

        // bytes=0-99 -> 206 with exactly 100 bytes.
        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("blob")
            .range("bytes=0-99")
            .send()
            .await
            .expect("ranged get");
        assert_eq!(resp.content_length(), Some(100));
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), &body[0..100]);

        // End past EOF is clamped to the full body.
        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("blob")
            .range("bytes=0-1000000")
            .send()
            .await
            .expect("clamped get");
        assert_eq!(resp.content_length(), Some(200));

        // Start past EOF -> 416.
        let err = client
            .get_object()
            .bucket(&bucket)
            .key("blob")
            .range("bytes=500-600")
            .send()
            .await
            .expect_err("unsatisfiable range");
        assert!(
            err.into_service_error()
                .meta()
                .code()
                .is_some_and(|c| c == "InvalidRange"),
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_copy_object_between_keys() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "copy").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("src")
            .body(ByteStream::from_static(b"copy me"))
            .content_type("text/plain")
            .send()
            .await
            .expect("put src");

        client
            .copy_object()
            .bucket(&bucket)
            .key("dest")
            .copy_source(format!("{bucket}/src"))
            .send()
            .await
            .expect("copy_object");

        let resp = client
            .get_object()
            .bucket(&bucket)
            .key("dest")
            .send()
            .await
            .expect("get dest");
        assert_eq!(resp.content_type(), Some("text/plain"));
        let data = resp.body.collect().await.expect("collect").into_bytes();
        assert_eq!(data.as_ref(), b"copy me");

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_object_tagging() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "tags").await;

        client
            .put_object()
            .bucket(&bucket)
            .key("key")
            .body(ByteStream::from_static(b"x"))
            .send()
            .await
            .expect("put_object");

        // A tag-less object returns an empty tag set.
        let resp = client
            .get_object_tagging()
            .bucket(&bucket)
            .key("key")
            .send()
            .await
            .expect("get_object_tagging");
        assert!(resp.tag_set().is_empty());

        let tagging = aws_sdk_s3::types::Tagging::builder()
            .tag_set(
                aws_sdk_s3::types::Tag::builder()
                    .key("env")
                    .value("dev")
                    .build()
                    .expect("tag"),
            )
            .build()
            .expect("tagging");
        client
            .put_object_tagging()
            .bucket(&bucket)
            .key("key")
            .tagging(tagging)
            .send()
            .await
            .expect("put_object_tagging");

        let resp = client
            .get_object_tagging()
            .bucket(&bucket)
            .key("key")
            .send()
            .await
            .expect("get_object_tagging");
        assert_eq!(resp.tag_set().len(), 1);
        assert_eq!(resp.tag_set()[0].key(), "env");

        cleanup_bucket(&client, &bucket).await;
    }
}
