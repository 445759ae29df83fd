//! The static-website engine.
//!
//! Given a bucket's website configuration and its key store, resolve a
//! website-endpoint GET into an outcome: serve a key, redirect, serve the
//! error document, or render a default HTML error page. Routing rules are
//! evaluated only on the error path, before any error status is returned.

use sandbar_model::types::{RoutingRule, WebsiteConfiguration};

use crate::state::keystore::KeyStore;

/// A website-endpoint request, as seen by the engine.
#[derive(Debug, Clone)]
pub struct WebsiteRequest<'a> {
    /// The resolved bucket.
    pub bucket: &'a str,
    /// The decoded requested key; empty for the root.
    pub key: &'a str,
    /// Whether the bucket was addressed in the path (redirect locations
    /// must then keep the bucket segment).
    pub path_style: bool,
    /// The request scheme, used when a redirect names no protocol.
    pub protocol: &'a str,
    /// The request host (with port), used when a redirect names no host.
    pub host: &'a str,
}

/// What the website engine decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebsiteOutcome {
    /// Stream the object at this key with status 200.
    Serve {
        /// The resolved key.
        key: String,
    },
    /// Redirect with `Location` and the given status.
    Redirect {
        /// The `Location` header value.
        location: String,
        /// The redirect status code.
        status: u16,
    },
    /// Serve the configured error document with the original error status.
    ErrorDocument {
        /// The error document's key.
        key: String,
        /// The original error status.
        status: u16,
    },
    /// Render the default HTML error page.
    ErrorPage {
        /// The error status.
        status: u16,
        /// The rendered HTML body.
        html: String,
    },
}

/// Resolve a website-endpoint GET.
#[must_use]
pub fn evaluate(
    config: &WebsiteConfiguration,
    req: &WebsiteRequest<'_>,
    objects: &KeyStore,
) -> WebsiteOutcome {
    if let Some(redirect_all) = &config.redirect_all_requests_to {
        let protocol = redirect_all
            .protocol
            .map_or(req.protocol, |p| p.as_str());
        return WebsiteOutcome::Redirect {
            location: format!("{protocol}://{}/{}", redirect_all.host_name, req.key),
            status: 301,
        };
    }

    let suffix = config.index_document_suffix.as_deref().unwrap_or("index.html");

    if req.key.is_empty() || req.key.ends_with('/') {
        let candidate = format!("{}{suffix}", req.key);
        if objects.contains(&candidate) {
            return serve_or_redirect(objects, &candidate);
        }
        return error_path(config, req, objects, 404);
    }

    if objects.contains(req.key) {
        return serve_or_redirect(objects, req.key);
    }

    // A directory-like prefix: the index document exists below the bare
    // path, so send the browser to the slash-terminated form.
    let nested_index = format!("{}/{suffix}", req.key);
    if objects.contains(&nested_index) {
        let location = if req.path_style {
            format!("/{}/{}/", req.bucket, req.key)
        } else {
            format!("/{}/", req.key)
        };
        return WebsiteOutcome::Redirect {
            location,
            status: 302,
        };
    }

    error_path(config, req, objects, 404)
}

/// Serve the key, unless the object carries a website redirect metadatum.
fn serve_or_redirect(objects: &KeyStore, key: &str) -> WebsiteOutcome {
    if let Some(location) = objects.get(key).and_then(|o| o.website_redirect_location.clone()) {
        return WebsiteOutcome::Redirect {
            location,
            status: 301,
        };
    }
    WebsiteOutcome::Serve {
        key: key.to_owned(),
    }
}

/// The error path: routing rules first, then the error document, then the
/// default page.
fn error_path(
    config: &WebsiteConfiguration,
    req: &WebsiteRequest<'_>,
    objects: &KeyStore,
    status: u16,
) -> WebsiteOutcome {
    for rule in &config.routing_rules {
        if rule_matches(rule, req.key, status) {
            return apply_rule(rule, req);
        }
    }

    if let Some(error_key) = &config.error_document_key {
        if objects.contains(error_key) {
            if let Some(location) = objects
                .get(error_key)
                .and_then(|o| o.website_redirect_location.clone())
            {
                return WebsiteOutcome::Redirect {
                    location,
                    status: 301,
                };
            }
            return WebsiteOutcome::ErrorDocument {
                key: error_key.clone(),
                status,
            };
        }
    }

    WebsiteOutcome::ErrorPage {
        status,
        html: error_page(
            "404 Not Found",
            "NoSuchKey",
            "The specified key does not exist.",
            &[("Key", req.key)],
        ),
    }
}

/// Whether a routing rule's condition holds. An absent condition always
/// matches; when both fields are present, both must hold.
fn rule_matches(rule: &RoutingRule, key: &str, status: u16) -> bool {
    let Some(condition) = &rule.condition else {
        return true;
    };
    if let Some(prefix) = &condition.key_prefix_equals {
        if !key.starts_with(prefix.as_str()) {
            return false;
        }
    }
    if let Some(code) = condition.http_error_code_returned_equals {
        if code != status {
            return false;
        }
    }
    true
}

/// Build the redirect a matched rule produces.
fn apply_rule(rule: &RoutingRule, req: &WebsiteRequest<'_>) -> WebsiteOutcome {
    let redirect = &rule.redirect;
    let protocol = redirect.protocol.map_or(req.protocol, |p| p.as_str());
    let host = redirect.host_name.as_deref().unwrap_or(req.host);

    let key = if let Some(replacement) = &redirect.replace_key_with {
        replacement.clone()
    } else if let Some(replacement) = &redirect.replace_key_prefix_with {
        let matched_prefix = rule
            .condition
            .as_ref()
            .and_then(|c| c.key_prefix_equals.as_deref())
            .unwrap_or("");
        format!(
            "{replacement}{}",
            req.key.strip_prefix(matched_prefix).unwrap_or(req.key)
        )
    } else {
        req.key.to_owned()
    };

    let path = if req.path_style {
        format!("/{}/{key}", req.bucket)
    } else {
        format!("/{key}")
    };

    WebsiteOutcome::Redirect {
        location: format!("{protocol}://{host}{path}"),
        status: redirect.http_redirect_code.unwrap_or(301),
    }
}

/// Render the default HTML error page used by the website endpoint.
#[must_use]
pub fn error_page(title: &str, code: &str, message: &str, items: &[(&str, &str)]) -> String {
    let mut extra = String::new();
    for (name, value) in items {
        if !value.is_empty() {
            extra.push_str(&format!("<li>{name}: {value}</li>\n"));
        }
    }
    format!(
        "<html>\n<head><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n<ul>\n\
         <li>Code: {code}</li>\n<li>Message: {message}</li>\n{extra}</ul>\n<hr/>\n</body>\n</html>\n"
    )
}
