//! Listing integration tests (v1 and v2).

#[cfg(test)]
mod tests {
    use aws_sdk_s3::primitives::ByteStream;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    async fn put_keys(client: &aws_sdk_s3::Client, bucket: &str, keys: &[&str]) {
        for key in keys {
            client
                .put_object()
                .bucket(bucket)
                .key(*key)
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .unwrap_or_else(|e| panic!("put {key}: {e}"));
        }
    }

    const FIXTURE: &[&str] = &["akey1", "akey2", "akey3", "key/key1", "key1", "key2", "key3"];

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_filter_by_prefix() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "prefix").await;
        put_keys(&client, &bucket, FIXTURE).await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .prefix("key")
            .send()
            .await
            .expect("list_objects");

        assert_eq!(resp.contents().len(), 4);
        assert!(
            resp.contents()
                .iter()
                .all(|o| !o.key().unwrap_or_default().starts_with("akey")),
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_collapse_delimited_keys_into_common_prefixes() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "delim").await;
        put_keys(&client, &bucket, FIXTURE).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .delimiter("/")
            .send()
            .await
            .expect("list_objects_v2");

        assert_eq!(resp.contents().len(), 6);
        let prefixes: Vec<&str> = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .collect();
        assert_eq!(prefixes, vec!["key/"]);
        assert_eq!(resp.key_count(), Some(7));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_page_500_keys_through_continuation_tokens() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cont").await;

        for i in 0..500 {
            client
                .put_object()
                .bucket(&bucket)
                .key(format!("key{i:03}"))
                .body(ByteStream::from_static(b"x"))
                .send()
                .await
                .expect("put_object");
        }

        let first = client
            .list_objects_v2()
            .bucket(&bucket)
            .max_keys(400)
            .send()
            .await
            .expect("first page");
        assert_eq!(first.contents().len(), 400);
        assert_eq!(first.is_truncated(), Some(true));
        let token = first
            .next_continuation_token()
            .expect("continuation token")
            .to_owned();

        let second = client
            .list_objects_v2()
            .bucket(&bucket)
            .continuation_token(&token)
            .send()
            .await
            .expect("second page");
        assert_eq!(second.contents().len(), 100);
        assert_eq!(second.is_truncated(), Some(false));
        assert!(second.next_continuation_token().is_none());
        assert_eq!(second.continuation_token(), Some(token.as_str()));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_empty_page_for_zero_max_keys() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "zero").await;
        put_keys(&client, &bucket, &["key1", "key2"]).await;

        let resp = client
            .list_objects()
            .bucket(&bucket)
            .max_keys(0)
            .send()
            .await
            .expect("list_objects");
        assert!(resp.contents().is_empty());
        assert_eq!(resp.is_truncated(), Some(false));

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_surface_slash_prefix_after_dotted_start_after() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "sort").await;
        put_keys(&client, &bucket, &["prefix.foo", "prefix/foo"]).await;

        let resp = client
            .list_objects_v2()
            .bucket(&bucket)
            .prefix("prefix")
            .delimiter("/")
            .start_after("prefix.foo")
            .send()
            .await
            .expect("list_objects_v2");

        assert!(resp.contents().is_empty());
        let prefixes: Vec<&str> = resp
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix())
            .collect();
        assert_eq!(prefixes, vec!["prefix/"]);

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_paginate_v1_with_markers() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "marker").await;
        put_keys(&client, &bucket, &["key1", "key2", "key3", "key4"]).await;

        let first = client
            .list_objects()
            .bucket(&bucket)
            .max_keys(2)
            .send()
            .await
            .expect("first page");
        assert_eq!(first.contents().len(), 2);
        assert_eq!(first.is_truncated(), Some(true));
        // Without a delimiter v1 emits no NextMarker; clients continue
        // from the last key.
        assert!(first.next_marker().is_none());
        let last_key = first.contents()[1].key().expect("key").to_owned();

        let second = client
            .list_objects()
            .bucket(&bucket)
            .marker(&last_key)
            .send()
            .await
            .expect("second page");
        assert_eq!(second.contents().len(), 2);
        assert_eq!(second.is_truncated(), Some(false));

        cleanup_bucket(&client, &bucket).await;
    }
}
