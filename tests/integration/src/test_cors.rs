//! CORS configuration integration tests.

#[cfg(test)]
mod tests {
    use aws_sdk_s3::types::CorsConfiguration as SdkCorsConfiguration;
    use aws_sdk_s3::types::CorsRule as SdkCorsRule;

    use crate::{cleanup_bucket, create_test_bucket, s3_client};

    fn cors_config() -> SdkCorsConfiguration {
        let rule = SdkCorsRule::builder()
            .allowed_origins("https://app.example")
            .allowed_methods("GET")
            .allowed_methods("PUT")
            .allowed_headers("*")
            .expose_headers("ETag")
            .max_age_seconds(3000)
            .build()
            .expect("rule");
        SdkCorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .expect("config")
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_round_trip_cors_configuration() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cors").await;

        client
            .put_bucket_cors()
            .bucket(&bucket)
            .cors_configuration(cors_config())
            .send()
            .await
            .expect("put_bucket_cors");

        let resp = client
            .get_bucket_cors()
            .bucket(&bucket)
            .send()
            .await
            .expect("get_bucket_cors");
        assert_eq!(resp.cors_rules().len(), 1);
        let rule = &resp.cors_rules()[0];
        assert_eq!(rule.allowed_origins(), ["https://app.example"]);
        assert_eq!(rule.allowed_methods(), ["GET", "PUT"]);
        assert_eq!(rule.max_age_seconds(), Some(3000));

        client
            .delete_bucket_cors()
            .bucket(&bucket)
            .send()
            .await
            .expect("delete_bucket_cors");

        let err = client
            .get_bucket_cors()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("deleted config must be gone");
        assert!(
            err.into_service_error()
                .meta()
                .code()
                .is_some_and(|c| c == "NoSuchCORSConfiguration"),
        );

        cleanup_bucket(&client, &bucket).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_missing_cors_configuration() {
        let client = s3_client();
        let bucket = create_test_bucket(&client, "cors-missing").await;

        let err = client
            .get_bucket_cors()
            .bucket(&bucket)
            .send()
            .await
            .expect_err("no config stored");
        assert!(
            err.into_service_error()
                .meta()
                .code()
                .is_some_and(|c| c == "NoSuchCORSConfiguration"),
        );

        cleanup_bucket(&client, &bucket).await;
    }
}
