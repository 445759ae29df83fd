//! AWS Signature Version 2 verification.
//!
//! SigV2 signs with HMAC-SHA1 over the legacy string-to-sign. Two carriers:
//!
//! - `Authorization: AWS <AWSAccessKeyId>:<Signature>` headers, where the
//!   `Date` position holds the request date (empty when `x-amz-date` is
//!   present), and
//! - presigned query strings (`AWSAccessKeyId`, `Signature`, `Expires`),
//!   where the `Date` position holds the absolute `Expires` epoch seconds.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::percent_decode_str;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::Authentication;
use crate::canonical::{
    canonicalized_amz_headers, canonicalized_resource, check_clock_skew, collect_headers,
};
use crate::credentials::CredentialProvider;
use crate::error::AuthError;

type HmacSha1 = Hmac<Sha1>;

/// Check whether an `Authorization` header uses the SigV2 form
/// (`AWS AKID:sig`, as opposed to `AWS4-…`).
#[must_use]
pub fn is_sigv2(auth_header: &str) -> bool {
    auth_header.starts_with("AWS ") && !auth_header.starts_with("AWS4-")
}

/// Verify a SigV2 `Authorization` header.
///
/// # Errors
///
/// [`AuthError::HeaderMalformed`] on a bad header shape,
/// [`AuthError::RequestTimeTooSkewed`] / [`AuthError::MissingDate`] on bad
/// request times, [`AuthError::SignatureDoesNotMatch`] on digest mismatch.
pub fn verify_header(
    parts: &http::request::Parts,
    header: &str,
    provider: &dyn CredentialProvider,
) -> Result<Authentication, AuthError> {
    let (access_key_id, presented) = parse_header(header)?;

    check_clock_skew(parts, Utc::now())?;

    let secret_key = provider.get_secret_key(&access_key_id)?;

    // When x-amz-date is present the Date position is left empty.
    let date = if parts.headers.contains_key("x-amz-date") {
        String::new()
    } else {
        header_value(parts, "date")
    };

    let sts = string_to_sign(parts, &date);
    debug!(string_to_sign = %sts, "built SigV2 string to sign");

    verify_signature(&secret_key, &sts, &presented)?;

    Ok(Authentication::SigV2 { access_key_id })
}

/// Verify a presigned SigV2 query string.
///
/// # Errors
///
/// [`AuthError::QueryParametersError`] when a required parameter is missing,
/// [`AuthError::Expired`] when `Expires` is in the past,
/// [`AuthError::SignatureDoesNotMatch`] on digest mismatch.
pub fn verify_presigned(
    parts: &http::request::Parts,
    provider: &dyn CredentialProvider,
) -> Result<Authentication, AuthError> {
    let query = parts.uri.query().unwrap_or("");

    let access_key_id = required_query_param(query, "AWSAccessKeyId")?;
    let presented = required_query_param(query, "Signature")?;
    let expires = required_query_param(query, "Expires")?;

    let expires_secs: i64 = expires.parse().map_err(|_| {
        AuthError::QueryParametersError(format!("Expires must be epoch seconds; got {expires}"))
    })?;
    if Utc::now().timestamp() > expires_secs {
        return Err(AuthError::Expired);
    }

    let secret_key = provider.get_secret_key(&access_key_id)?;

    // The Expires value takes the Date position in the string to sign.
    let sts = string_to_sign(parts, &expires);
    debug!(string_to_sign = %sts, "built presigned SigV2 string to sign");

    verify_signature(&secret_key, &sts, &presented)?;

    Ok(Authentication::SigV2 { access_key_id })
}

/// Parse `AWS AKID:Signature`.
fn parse_header(header: &str) -> Result<(String, String), AuthError> {
    let rest = header
        .strip_prefix("AWS ")
        .ok_or_else(|| AuthError::HeaderMalformed("expected `AWS <key>:<signature>`".to_owned()))?;

    let (access_key_id, signature) = rest
        .split_once(':')
        .ok_or_else(|| AuthError::HeaderMalformed("missing `:` separator".to_owned()))?;

    if access_key_id.is_empty() || signature.is_empty() {
        return Err(AuthError::HeaderMalformed(
            "empty access key or signature".to_owned(),
        ));
    }

    Ok((access_key_id.to_owned(), signature.to_owned()))
}

/// Build the SigV2 string to sign with the given value in the Date position.
fn string_to_sign(parts: &http::request::Parts, date: &str) -> String {
    let method = parts.method.as_str();
    let content_md5 = header_value(parts, "content-md5");
    let content_type = header_value(parts, "content-type");
    let headers = collect_headers(parts);
    let amz_headers = canonicalized_amz_headers(&headers);
    let resource = canonicalized_resource(parts.uri.path(), parts.uri.query().unwrap_or(""));

    format!("{method}\n{content_md5}\n{content_type}\n{date}\n{amz_headers}{resource}")
}

/// Base64(HMAC-SHA1(secret, string_to_sign)), compared in constant time.
fn verify_signature(secret_key: &str, sts: &str, presented: &str) -> Result<(), AuthError> {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(sts.as_bytes());
    let expected = BASE64.encode(mac.finalize().into_bytes());

    if expected.as_bytes().ct_eq(presented.as_bytes()).into() {
        Ok(())
    } else {
        debug!(%expected, %presented, "SigV2 signature mismatch");
        Err(AuthError::SignatureDoesNotMatch)
    }
}

fn header_value(parts: &http::request::Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_owned()
}

/// Extract and percent-decode a required query parameter.
fn required_query_param(query: &str, name: &str) -> Result<String, AuthError> {
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .find_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (k == name).then(|| percent_decode_str(v).decode_utf8_lossy().into_owned())
        })
        .ok_or_else(|| {
            AuthError::QueryParametersError(format!(
                "query-string authentication requires the {name} parameter"
            ))
        })
}
