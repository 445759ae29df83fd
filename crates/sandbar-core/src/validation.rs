//! Bucket-name validation.
//!
//! Names must be 3-63 characters of lowercase letters, digits, hyphens,
//! and dots; start and end with a letter or digit; every dotted label must
//! itself be valid; no consecutive dots; and nothing resembling an IPv4
//! address.

use sandbar_model::error::{S3Error, S3ErrorCode};

/// Validate a bucket name against the S3 naming rules.
///
/// # Errors
///
/// `InvalidBucketName` (400) describing the violated rule.
pub fn validate_bucket_name(name: &str) -> Result<(), S3Error> {
    let invalid = |reason: &str| {
        Err(S3Error::with_message(
            S3ErrorCode::InvalidBucketName,
            format!("The specified bucket is not valid: {reason}"),
        )
        .with_resource(name))
    };

    if name.len() < 3 || name.len() > 63 {
        return invalid("bucket names must be between 3 and 63 characters long");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return invalid("bucket names can consist only of lowercase letters, numbers, dots, and hyphens");
    }

    if name.contains("..") {
        return invalid("bucket names must not contain two adjacent periods");
    }

    for label in name.split('.') {
        if label.is_empty() {
            return invalid("bucket names must not contain empty labels");
        }
        let first = label.chars().next().unwrap_or('-');
        let last = label.chars().last().unwrap_or('-');
        if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
            return invalid("bucket names must begin and end with a letter or number");
        }
    }

    if looks_like_ip(name) {
        return invalid("bucket names must not be formatted as an IP address");
    }

    Ok(())
}

/// Whether the name is four dotted all-digit labels.
fn looks_like_ip(name: &str) -> bool {
    let labels: Vec<&str> = name.split('.').collect();
    labels.len() == 4
        && labels
            .iter()
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_digit()))
}
