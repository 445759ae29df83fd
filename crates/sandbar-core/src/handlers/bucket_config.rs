//! Bucket-configuration handlers (`?cors`, `?website`, `?policy`,
//! `?lifecycle`, `?tagging`, `?acl`).
//!
//! CORS and website documents are parsed and validated on PUT and replace
//! the stored configuration atomically; GET returns the stored raw
//! document verbatim. Policies, lifecycles, tagging, and ACLs are stored
//! opaquely (ACL enforcement is out of scope; a canned FULL_CONTROL policy
//! is served when none was stored).

use bytes::Bytes;
use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::response::{build, empty_response, xml_response};
use sandbar_http::router::RoutingContext;
use sandbar_model::error::S3Error;
use sandbar_model::operations::S3Operation;
use sandbar_model::types::{CorsConfiguration, Tagging, WebsiteConfiguration};
use sandbar_xml::serialize::AccessControlPolicy;
use tracing::debug;

use crate::cors;
use crate::handlers::{bucket_of, xml_error_to_s3};
use crate::provider::SandbarS3;
use crate::state::bucket::{ConfigKind, StoredConfig};

/// The configuration kind a config operation addresses.
fn kind_of(op: S3Operation) -> ConfigKind {
    match op {
        S3Operation::GetBucketCors
        | S3Operation::PutBucketCors
        | S3Operation::DeleteBucketCors => ConfigKind::Cors,
        S3Operation::GetBucketWebsite
        | S3Operation::PutBucketWebsite
        | S3Operation::DeleteBucketWebsite => ConfigKind::Website,
        S3Operation::GetBucketPolicy
        | S3Operation::PutBucketPolicy
        | S3Operation::DeleteBucketPolicy => ConfigKind::Policy,
        S3Operation::GetBucketLifecycle
        | S3Operation::PutBucketLifecycle
        | S3Operation::DeleteBucketLifecycle => ConfigKind::Lifecycle,
        S3Operation::GetBucketTagging
        | S3Operation::PutBucketTagging
        | S3Operation::DeleteBucketTagging => ConfigKind::Tagging,
        _ => ConfigKind::Acl,
    }
}

/// Parse and validate a configuration document into its stored form.
///
/// # Errors
///
/// `MalformedXML` on shape errors; kind-specific `InvalidRequest` messages
/// on semantic violations (wildcards, methods, redirect fields).
pub(crate) fn parse_config(kind: ConfigKind, raw: Bytes) -> Result<StoredConfig, S3Error> {
    match kind {
        ConfigKind::Cors => {
            let parsed: CorsConfiguration = sandbar_xml::from_xml(&raw).map_err(xml_error_to_s3)?;
            cors::validate(&parsed)?;
            Ok(StoredConfig {
                raw,
                cors: Some(parsed),
                website: None,
            })
        }
        ConfigKind::Website => {
            let parsed: WebsiteConfiguration =
                sandbar_xml::from_xml(&raw).map_err(xml_error_to_s3)?;
            Ok(StoredConfig {
                raw,
                cors: None,
                website: Some(parsed),
            })
        }
        ConfigKind::Tagging => {
            // Validate the shape; the document itself is stored verbatim.
            let _: Tagging = sandbar_xml::from_xml(&raw).map_err(xml_error_to_s3)?;
            Ok(StoredConfig::opaque(raw))
        }
        ConfigKind::Policy | ConfigKind::Lifecycle | ConfigKind::Acl => {
            Ok(StoredConfig::opaque(raw))
        }
    }
}

impl SandbarS3 {
    /// `GET /:bucket?<kind>`.
    pub(crate) fn handle_get_bucket_config(
        &self,
        op: S3Operation,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        let kind = kind_of(op);

        if kind == ConfigKind::Acl {
            // ACLs always resolve; serve the canned owner policy when
            // nothing was stored.
            self.state.get_bucket(bucket)?;
            let doc = AccessControlPolicy {
                owner: self.state.owner().clone(),
            };
            let xml = sandbar_xml::to_xml("AccessControlPolicy", &doc)
                .map_err(|e| S3Error::internal_error(e.to_string()))?;
            return xml_response(StatusCode::OK, xml);
        }

        let raw = self.state.get_config(bucket, kind)?;
        let content_type = if kind == ConfigKind::Policy {
            // Policies are JSON documents, stored and returned verbatim.
            "application/json"
        } else {
            "application/xml"
        };
        build(
            http::Response::builder()
                .status(StatusCode::OK)
                .header(http::header::CONTENT_TYPE, content_type),
            S3ResponseBody::from_bytes(raw),
        )
    }

    /// `PUT /:bucket?<kind>`.
    pub(crate) fn handle_put_bucket_config(
        &self,
        op: S3Operation,
        body: &Bytes,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        let kind = kind_of(op);

        let config = parse_config(kind, body.clone())?;
        self.state.put_config(bucket, kind, config)?;
        debug!(bucket, kind = kind.as_str(), "stored bucket configuration");

        let status = match kind {
            ConfigKind::Policy | ConfigKind::Tagging => StatusCode::NO_CONTENT,
            _ => StatusCode::OK,
        };
        empty_response(status)
    }

    /// `DELETE /:bucket?<kind>`.
    pub(crate) fn handle_delete_bucket_config(
        &self,
        op: S3Operation,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.delete_config(bucket, kind_of(op))?;
        empty_response(StatusCode::NO_CONTENT)
    }
}
