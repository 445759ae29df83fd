//! The CORS engine: configuration validation, rule matching, and response
//! header synthesis.
//!
//! Rules are evaluated in configuration order, first match wins. Origin
//! and header patterns may carry a single `*` wildcard matching any
//! substring.

use sandbar_model::error::{S3Error, S3ErrorCode};
use sandbar_model::types::{CorsConfiguration, CorsRule};

/// The HTTP methods a CORS rule may allow.
const ALLOWED_METHODS: &[&str] = &["GET", "PUT", "POST", "DELETE", "HEAD"];

/// A successful rule match, carrying what the response headers need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsMatch {
    /// The origin pattern that matched (`*` or a concrete/glob pattern).
    pub matched_origin: String,
    /// The rule's allowed methods.
    pub allowed_methods: Vec<String>,
    /// The rule's exposable response headers.
    pub expose_headers: Vec<String>,
    /// Preflight cache lifetime.
    pub max_age_seconds: Option<i64>,
}

impl CorsMatch {
    /// The `Access-Control-Allow-Origin` value: the request origin echoed
    /// back, or `*` when the matching pattern was a bare wildcard.
    #[must_use]
    pub fn allow_origin(&self, request_origin: &str) -> String {
        if self.matched_origin == "*" {
            "*".to_owned()
        } else {
            request_origin.to_owned()
        }
    }

    /// Whether `Access-Control-Allow-Credentials: true` should be sent
    /// (only when the matched origin is not the bare wildcard).
    #[must_use]
    pub fn allow_credentials(&self) -> bool {
        self.matched_origin != "*"
    }
}

/// Validate a parsed CORS configuration.
///
/// # Errors
///
/// `MalformedXML` when a rule misses its required fields; `InvalidRequest`
/// for unsupported methods or patterns with more than one wildcard.
pub fn validate(config: &CorsConfiguration) -> Result<(), S3Error> {
    if config.rules.is_empty() {
        return Err(S3Error::malformed_xml());
    }

    for rule in &config.rules {
        if rule.allowed_methods.is_empty() || rule.allowed_origins.is_empty() {
            return Err(S3Error::malformed_xml());
        }
        for method in &rule.allowed_methods {
            if !ALLOWED_METHODS.contains(&method.as_str()) {
                return Err(S3Error::with_message(
                    S3ErrorCode::InvalidRequest,
                    "Found unsupported HTTP method in CORS config. Unsupported method is "
                        .to_owned()
                        + method,
                ));
            }
        }
        for origin in &rule.allowed_origins {
            if origin.matches('*').count() > 1 {
                return Err(S3Error::with_message(
                    S3ErrorCode::InvalidRequest,
                    format!("AllowedOrigin \"{origin}\" can not have more than one wildcard."),
                ));
            }
        }
        for header in &rule.allowed_headers {
            if header.matches('*').count() > 1 {
                return Err(S3Error::with_message(
                    S3ErrorCode::InvalidRequest,
                    format!("AllowedHeader \"{header}\" can not have more than one wildcard."),
                ));
            }
        }
    }

    Ok(())
}

/// Match a pattern containing at most one `*` against a value. The
/// wildcard matches any substring, including the empty one.
#[must_use]
pub fn wildcard_match(pattern: &str, value: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == value,
        Some((prefix, suffix)) => {
            value.len() >= prefix.len() + suffix.len()
                && value.starts_with(prefix)
                && value.ends_with(suffix)
        }
    }
}

/// Find the first rule matching an origin, a method, and (for preflights)
/// the requested headers.
#[must_use]
pub fn find_match(
    config: &CorsConfiguration,
    origin: &str,
    method: &str,
    request_headers: &[String],
) -> Option<CorsMatch> {
    for rule in &config.rules {
        let Some(matched_origin) = rule
            .allowed_origins
            .iter()
            .find(|pattern| wildcard_match(pattern, origin))
        else {
            continue;
        };
        if !rule.allowed_methods.iter().any(|m| m == method) {
            continue;
        }
        if !headers_allowed(rule, request_headers) {
            continue;
        }
        return Some(CorsMatch {
            matched_origin: matched_origin.clone(),
            allowed_methods: rule.allowed_methods.clone(),
            expose_headers: rule.expose_headers.clone(),
            max_age_seconds: rule.max_age_seconds,
        });
    }
    None
}

/// Every requested header must be matched by some `AllowedHeader` glob.
fn headers_allowed(rule: &CorsRule, requested: &[String]) -> bool {
    requested.iter().all(|req| {
        let req = req.trim().to_lowercase();
        rule.allowed_headers
            .iter()
            .any(|pattern| wildcard_match(&pattern.to_lowercase(), &req))
    })
}
