//! Service- and bucket-level handlers.

use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::response::{build, empty_response, xml_response};
use sandbar_http::router::RoutingContext;
use sandbar_model::error::S3Error;
use sandbar_xml::serialize::{ListAllMyBucketsResult, LocationConstraint};
use tracing::debug;

use crate::handlers::bucket_of;
use crate::provider::SandbarS3;

impl SandbarS3 {
    /// `GET /` — list all buckets in creation order.
    pub(crate) fn handle_list_buckets(
        &self,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let doc = ListAllMyBucketsResult {
            owner: self.state.owner().clone(),
            buckets: self.state.list_buckets(),
        };
        let xml = sandbar_xml::to_xml("ListAllMyBucketsResult", &doc)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `PUT /:bucket` — create a bucket.
    pub(crate) fn handle_create_bucket(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.create_bucket(bucket)?;
        debug!(bucket, "created bucket");
        build(
            http::Response::builder()
                .status(StatusCode::OK)
                .header(http::header::LOCATION, format!("/{bucket}")),
            S3ResponseBody::empty(),
        )
    }

    /// `DELETE /:bucket` — delete an empty bucket.
    pub(crate) fn handle_delete_bucket(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.delete_bucket(bucket)?;
        empty_response(StatusCode::NO_CONTENT)
    }

    /// `HEAD /:bucket`.
    pub(crate) fn handle_head_bucket(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.get_bucket(bucket)?;
        empty_response(StatusCode::OK)
    }

    /// `GET /:bucket?location`.
    pub(crate) fn handle_get_bucket_location(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket = bucket_of(ctx)?;
        self.state.get_bucket(bucket)?;

        // us-east-1 is represented by an empty LocationConstraint.
        let constraint = if self.config.region == "us-east-1" {
            LocationConstraint(None)
        } else {
            LocationConstraint(Some(self.config.region.clone()))
        };
        let xml = sandbar_xml::to_xml("LocationConstraint", &constraint)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }
}
