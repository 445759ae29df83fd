//! Shared helpers: ETags, range parsing, continuation tokens, IDs.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, URL_SAFE_NO_PAD};
use md5::{Digest, Md5};
use rand::Rng;
use sandbar_model::error::{S3Error, S3ErrorCode};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ETags
// ---------------------------------------------------------------------------

/// The raw MD5 digest of a body.
#[must_use]
pub fn md5_digest(data: &[u8]) -> [u8; 16] {
    Md5::digest(data).into()
}

/// The unquoted lowercase hex MD5 of a body.
#[must_use]
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(md5_digest(data))
}

/// The quoted ETag of a simple object: `"<hex md5>"`.
#[must_use]
pub fn etag_of(data: &[u8]) -> String {
    format!("\"{}\"", md5_hex(data))
}

/// The quoted multipart ETag: MD5 over the concatenated raw part digests,
/// suffixed with `-N` where `N` is the part count.
#[must_use]
pub fn multipart_etag(part_digests: &[[u8; 16]]) -> String {
    let mut hasher = Md5::new();
    for digest in part_digests {
        hasher.update(digest);
    }
    format!("\"{}-{}\"", hex::encode(hasher.finalize()), part_digests.len())
}

/// Decode the hex digest inside a quoted ETag.
#[must_use]
pub fn etag_digest(etag: &str) -> Option<[u8; 16]> {
    let hex_str = etag.trim_matches('"');
    let bytes = hex::decode(hex_str).ok()?;
    bytes.try_into().ok()
}

/// Verify a client-supplied `Content-MD5` (base64 of the raw digest)
/// against the computed digest.
///
/// # Errors
///
/// `InvalidDigest` when the header is not valid base64 of a 16-byte
/// digest; `BadDigest` when it does not match the body.
pub fn verify_content_md5(header: &str, computed: &[u8; 16]) -> Result<(), S3Error> {
    let decoded = BASE64_STANDARD
        .decode(header)
        .map_err(|_| S3Error::new(S3ErrorCode::InvalidDigest))?;
    if decoded.len() != 16 {
        return Err(S3Error::new(S3ErrorCode::InvalidDigest));
    }
    if decoded != computed {
        return Err(S3Error::new(S3ErrorCode::BadDigest));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Range parsing
// ---------------------------------------------------------------------------

/// The outcome of applying a `Range` header to an object of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// No (or unusable) range; serve the whole body.
    Full,
    /// Serve the inclusive byte range.
    Partial {
        /// First byte offset.
        start: u64,
        /// Last byte offset (inclusive, clamped to `size - 1`).
        end: u64,
    },
    /// The range cannot be satisfied (416 with `Content-Range: bytes */size`).
    Unsatisfiable,
}

/// Parse a `bytes=start-end` range header against a body size.
///
/// Either endpoint may be missing: `-N` means the last `N` bytes, `N-`
/// means from `N` to the end. `end` past EOF is clamped; `start` past EOF
/// is unsatisfiable. Malformed values fall back to the full body, matching
/// the lenient behavior of the real service.
#[must_use]
pub fn parse_range(header: &str, size: u64) -> ByteRange {
    let Some(spec) = header.strip_prefix("bytes=") else {
        return ByteRange::Full;
    };
    // Only the first range of a multi-range request is honored.
    let spec = spec.split(',').next().unwrap_or(spec).trim();

    if size == 0 {
        return ByteRange::Unsatisfiable;
    }

    if let Some(suffix) = spec.strip_prefix('-') {
        // bytes=-N: the last N bytes.
        let Ok(n) = suffix.parse::<u64>() else {
            return ByteRange::Full;
        };
        if n == 0 {
            return ByteRange::Unsatisfiable;
        }
        let start = size.saturating_sub(n);
        return ByteRange::Partial {
            start,
            end: size - 1,
        };
    }

    let (start_str, end_str) = match spec.split_once('-') {
        Some(parts) => parts,
        None => return ByteRange::Full,
    };
    let Ok(start) = start_str.parse::<u64>() else {
        return ByteRange::Full;
    };
    if start > size - 1 {
        return ByteRange::Unsatisfiable;
    }

    let end = if end_str.is_empty() {
        size - 1
    } else {
        match end_str.parse::<u64>() {
            // Clamp an end past EOF to the last byte.
            Ok(end) => end.min(size - 1),
            Err(_) => return ByteRange::Full,
        }
    };

    if end < start {
        return ByteRange::Full;
    }

    ByteRange::Partial { start, end }
}

// ---------------------------------------------------------------------------
// Continuation tokens
// ---------------------------------------------------------------------------

/// Encode a listing cursor as an opaque, URL-safe continuation token.
#[must_use]
pub fn encode_continuation_token(last_emitted: &str) -> String {
    URL_SAFE_NO_PAD.encode(last_emitted.as_bytes())
}

/// Decode a continuation token back into the listing cursor.
///
/// # Errors
///
/// `InvalidArgument` when the token is not one this server minted.
pub fn decode_continuation_token(token: &str) -> Result<String, S3Error> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| S3Error::invalid_argument("The continuation token provided is incorrect"))?;
    String::from_utf8(bytes)
        .map_err(|_| S3Error::invalid_argument("The continuation token provided is incorrect"))
}

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Generate an opaque multipart upload ID (48 hex chars).
#[must_use]
pub fn generate_upload_id() -> String {
    let mut rng = rand::rng();
    let mut buf = [0u8; 24];
    rng.fill(&mut buf);
    hex::encode(buf)
}

/// Generate a request ID (UUID v4 without dashes).
#[must_use]
pub fn generate_request_id() -> String {
    Uuid::new_v4().simple().to_string()
}
