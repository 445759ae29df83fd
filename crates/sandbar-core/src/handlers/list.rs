//! Object-listing handlers (v1 marker-based and v2 token-based).
//!
//! Both share the key-store walk; the differences live here: v1 emits
//! `NextMarker` only when a delimiter was supplied, v2 round-trips opaque
//! continuation tokens and reports `KeyCount`.

use http::StatusCode;
use sandbar_http::body::S3ResponseBody;
use sandbar_http::request::{list_objects_input, list_objects_v2_input};
use sandbar_http::response::xml_response;
use sandbar_http::router::RoutingContext;
use sandbar_model::error::S3Error;
use sandbar_model::types::{ListObjectsOutput, ListObjectsV2Output};
use tracing::debug;

use crate::handlers::bucket_of;
use crate::provider::SandbarS3;
use crate::utils::{decode_continuation_token, encode_continuation_token};

/// Default and maximum page size.
const MAX_KEYS_CAP: i64 = 1000;

/// Clamp a requested `max-keys` to the effective cap. The supplied value
/// is still echoed back verbatim in the response.
fn effective_max_keys(requested: Option<i64>) -> usize {
    let requested = requested.unwrap_or(MAX_KEYS_CAP);
    usize::try_from(requested.clamp(0, MAX_KEYS_CAP)).unwrap_or(0)
}

impl SandbarS3 {
    /// `GET /:bucket` — ListObjects (v1).
    pub(crate) fn handle_list_objects(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;
        let input = list_objects_input(&ctx.query_params)?;

        let prefix = input.prefix.clone().unwrap_or_default();
        let delimiter = input.delimiter.clone().unwrap_or_default();
        let marker = input.marker.clone().unwrap_or_default();
        let cap = effective_max_keys(input.max_keys);

        let page = bucket.objects.read().list(&prefix, &delimiter, &marker, cap);

        debug!(
            bucket = bucket_name,
            prefix = %prefix,
            contents = page.objects.len(),
            common_prefixes = page.common_prefixes.len(),
            is_truncated = page.is_truncated,
            "list_objects",
        );

        // NextMarker is a delimiter-only field in the v1 protocol.
        let next_marker = if input.delimiter.is_some() && page.is_truncated {
            page.last_emitted.clone()
        } else {
            None
        };

        let owner = self.state.owner();
        let output = ListObjectsOutput {
            name: bucket_name.to_owned(),
            prefix: input.prefix,
            delimiter: input.delimiter,
            marker: input.marker,
            max_keys: input.max_keys.unwrap_or(MAX_KEYS_CAP),
            is_truncated: page.is_truncated,
            next_marker,
            contents: page.objects.iter().map(|o| o.summary(owner)).collect(),
            common_prefixes: page.common_prefixes,
        };

        let xml = sandbar_xml::to_xml("ListBucketResult", &output)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }

    /// `GET /:bucket?list-type=2` — ListObjectsV2.
    pub(crate) fn handle_list_objects_v2(
        &self,
        ctx: &RoutingContext,
    ) -> Result<http::Response<S3ResponseBody>, S3Error> {
        let bucket_name = bucket_of(ctx)?;
        let bucket = self.state.get_bucket(bucket_name)?;
        let input = list_objects_v2_input(&ctx.query_params)?;

        let prefix = input.prefix.clone().unwrap_or_default();
        let delimiter = input.delimiter.clone().unwrap_or_default();
        let cap = effective_max_keys(input.max_keys);

        // The continuation token wins over start-after when both appear.
        let start_after = match &input.continuation_token {
            Some(token) => decode_continuation_token(token)?,
            None => input.start_after.clone().unwrap_or_default(),
        };

        let page = bucket
            .objects
            .read()
            .list(&prefix, &delimiter, &start_after, cap);

        debug!(
            bucket = bucket_name,
            prefix = %prefix,
            contents = page.objects.len(),
            common_prefixes = page.common_prefixes.len(),
            is_truncated = page.is_truncated,
            "list_objects_v2",
        );

        let next_continuation_token = if page.is_truncated {
            page.last_emitted.as_deref().map(encode_continuation_token)
        } else {
            None
        };

        let key_count = (page.objects.len() + page.common_prefixes.len()) as i64;
        let owner = self.state.owner();
        let output = ListObjectsV2Output {
            name: bucket_name.to_owned(),
            prefix: input.prefix,
            delimiter: input.delimiter,
            continuation_token: input.continuation_token,
            start_after: input.start_after,
            max_keys: input.max_keys.unwrap_or(MAX_KEYS_CAP),
            key_count,
            is_truncated: page.is_truncated,
            next_continuation_token,
            contents: page.objects.iter().map(|o| o.summary(owner)).collect(),
            common_prefixes: page.common_prefixes,
        };

        let xml = sandbar_xml::to_xml("ListBucketResult", &output)
            .map_err(|e| S3Error::internal_error(e.to_string()))?;
        xml_response(StatusCode::OK, xml)
    }
}
