//! S3 response-document serialization.
//!
//! Provides the [`S3Serialize`] trait and implementations for every XML
//! document this server returns. Conventions follow the AWS RestXml protocol:
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - Booleans: lowercase `true`/`false`
//! - Timestamps: ISO 8601 with milliseconds (`2006-03-01T12:00:00.000Z`)
//! - XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesText, Event};

use sandbar_model::types::{
    BucketSummary, DeleteResult, ListMultipartUploadsOutput, ListObjectsOutput,
    ListObjectsV2Output, ListPartsOutput, ObjectSummary, Owner, Tagging,
};

use crate::error::XmlError;

/// The S3 XML namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

/// Trait for serializing S3 types to XML.
///
/// Implementors write their content as child elements inside the current
/// context; the root element and namespace are handled by [`to_xml`].
///
/// Uses `io::Result` because `quick_xml::Writer` inner-content closures do.
pub trait S3Serialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete S3 XML document.
///
/// # Errors
///
/// Returns `XmlError` if serialization fails.
pub fn to_xml<T: S3Serialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(quick_xml::events::BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        None,
    )))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", S3_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Writer helpers
// ---------------------------------------------------------------------------

/// Write a simple `<tag>text</tag>` element.
fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

/// Write `<tag>text</tag>` only if the value is `Some`.
fn write_optional_text<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: Option<&str>,
) -> io::Result<()> {
    if let Some(v) = value {
        write_text_element(writer, tag, v)?;
    }
    Ok(())
}

/// Write `<tag>true|false</tag>`.
fn write_bool_element<W: Write>(writer: &mut Writer<W>, tag: &str, value: bool) -> io::Result<()> {
    write_text_element(writer, tag, if value { "true" } else { "false" })
}

/// Write `<tag>iso8601</tag>` for a timestamp.
fn write_timestamp<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &DateTime<Utc>,
) -> io::Result<()> {
    write_text_element(writer, tag, &format_timestamp(value))
}

/// Format a `DateTime<Utc>` as ISO 8601 with milliseconds and `Z` suffix.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Write an `<Owner>` element.
fn write_owner<W: Write>(writer: &mut Writer<W>, tag: &str, owner: &Owner) -> io::Result<()> {
    writer.create_element(tag).write_inner_content(|w| {
        write_text_element(w, "ID", &owner.id)?;
        write_text_element(w, "DisplayName", &owner.display_name)?;
        Ok(())
    })?;
    Ok(())
}

/// Write a `<Contents>` entry for one object.
fn write_contents<W: Write>(writer: &mut Writer<W>, obj: &ObjectSummary) -> io::Result<()> {
    writer.create_element("Contents").write_inner_content(|w| {
        write_text_element(w, "Key", &obj.key)?;
        write_timestamp(w, "LastModified", &obj.last_modified)?;
        write_text_element(w, "ETag", &obj.etag)?;
        write_text_element(w, "Size", &obj.size.to_string())?;
        write_text_element(w, "StorageClass", "STANDARD")?;
        write_owner(w, "Owner", &obj.owner)?;
        Ok(())
    })?;
    Ok(())
}

/// Write the `<CommonPrefixes>` entries.
fn write_common_prefixes<W: Write>(writer: &mut Writer<W>, prefixes: &[String]) -> io::Result<()> {
    for prefix in prefixes {
        writer
            .create_element("CommonPrefixes")
            .write_inner_content(|w| write_text_element(w, "Prefix", prefix))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Service documents
// ---------------------------------------------------------------------------

/// The `ListAllMyBucketsResult` document.
#[derive(Debug, Clone)]
pub struct ListAllMyBucketsResult {
    /// The fixed owner.
    pub owner: Owner,
    /// Buckets in creation order.
    pub buckets: Vec<BucketSummary>,
}

impl S3Serialize for ListAllMyBucketsResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_owner(writer, "Owner", &self.owner)?;
        writer.create_element("Buckets").write_inner_content(|w| {
            for bucket in &self.buckets {
                w.create_element("Bucket").write_inner_content(|b| {
                    write_text_element(b, "Name", &bucket.name)?;
                    write_timestamp(b, "CreationDate", &bucket.creation_date)?;
                    Ok(())
                })?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

/// The `LocationConstraint` document. `None` renders an empty element, the
/// form S3 uses for us-east-1.
#[derive(Debug, Clone, Default)]
pub struct LocationConstraint(pub Option<String>);

impl S3Serialize for LocationConstraint {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        if let Some(region) = &self.0 {
            writer.write_event(Event::Text(BytesText::new(region)))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Listing documents
// ---------------------------------------------------------------------------

impl S3Serialize for ListObjectsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_text_element(writer, "Prefix", self.prefix.as_deref().unwrap_or(""))?;
        write_text_element(writer, "Marker", self.marker.as_deref().unwrap_or(""))?;
        write_optional_text(writer, "NextMarker", self.next_marker.as_deref())?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_text_element(writer, "MaxKeys", &self.max_keys.to_string())?;
        write_bool_element(writer, "IsTruncated", self.is_truncated)?;
        for obj in &self.contents {
            write_contents(writer, obj)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)?;
        Ok(())
    }
}

impl S3Serialize for ListObjectsV2Output {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Name", &self.name)?;
        write_text_element(writer, "Prefix", self.prefix.as_deref().unwrap_or(""))?;
        write_optional_text(writer, "StartAfter", self.start_after.as_deref())?;
        write_optional_text(
            writer,
            "ContinuationToken",
            self.continuation_token.as_deref(),
        )?;
        write_optional_text(
            writer,
            "NextContinuationToken",
            self.next_continuation_token.as_deref(),
        )?;
        write_text_element(writer, "KeyCount", &self.key_count.to_string())?;
        write_optional_text(writer, "Delimiter", self.delimiter.as_deref())?;
        write_text_element(writer, "MaxKeys", &self.max_keys.to_string())?;
        write_bool_element(writer, "IsTruncated", self.is_truncated)?;
        for obj in &self.contents {
            write_contents(writer, obj)?;
        }
        write_common_prefixes(writer, &self.common_prefixes)?;
        Ok(())
    }
}

impl S3Serialize for ListMultipartUploadsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "KeyMarker", self.key_marker.as_deref().unwrap_or(""))?;
        write_text_element(
            writer,
            "UploadIdMarker",
            self.upload_id_marker.as_deref().unwrap_or(""),
        )?;
        write_optional_text(writer, "NextKeyMarker", self.next_key_marker.as_deref())?;
        write_optional_text(
            writer,
            "NextUploadIdMarker",
            self.next_upload_id_marker.as_deref(),
        )?;
        write_optional_text(writer, "Prefix", self.prefix.as_deref())?;
        write_text_element(writer, "MaxUploads", &self.max_uploads.to_string())?;
        write_bool_element(writer, "IsTruncated", self.is_truncated)?;
        for upload in &self.uploads {
            writer.create_element("Upload").write_inner_content(|w| {
                write_text_element(w, "Key", &upload.key)?;
                write_text_element(w, "UploadId", &upload.upload_id)?;
                write_owner(w, "Initiator", &upload.owner)?;
                write_owner(w, "Owner", &upload.owner)?;
                write_text_element(w, "StorageClass", "STANDARD")?;
                write_timestamp(w, "Initiated", &upload.initiated)?;
                Ok(())
            })?;
        }
        Ok(())
    }
}

impl S3Serialize for ListPartsOutput {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "UploadId", &self.upload_id)?;
        if let Some(marker) = self.part_number_marker {
            write_text_element(writer, "PartNumberMarker", &marker.to_string())?;
        }
        if let Some(marker) = self.next_part_number_marker {
            write_text_element(writer, "NextPartNumberMarker", &marker.to_string())?;
        }
        write_text_element(writer, "MaxParts", &self.max_parts.to_string())?;
        write_bool_element(writer, "IsTruncated", self.is_truncated)?;
        for part in &self.parts {
            writer.create_element("Part").write_inner_content(|w| {
                write_text_element(w, "PartNumber", &part.part_number.to_string())?;
                write_timestamp(w, "LastModified", &part.last_modified)?;
                write_text_element(w, "ETag", &part.etag)?;
                write_text_element(w, "Size", &part.size.to_string())?;
                Ok(())
            })?;
        }
        write_owner(writer, "Initiator", &self.owner)?;
        write_owner(writer, "Owner", &self.owner)?;
        write_text_element(writer, "StorageClass", "STANDARD")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object documents
// ---------------------------------------------------------------------------

impl S3Serialize for Tagging {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer.create_element("TagSet").write_inner_content(|w| {
            for tag in &self.tag_set {
                w.create_element("Tag").write_inner_content(|t| {
                    write_text_element(t, "Key", &tag.key)?;
                    write_text_element(t, "Value", &tag.value)?;
                    Ok(())
                })?;
            }
            Ok(())
        })?;
        Ok(())
    }
}

/// The `CopyObjectResult` document.
#[derive(Debug, Clone)]
pub struct CopyObjectResult {
    /// The destination object's quoted ETag.
    pub etag: String,
    /// The destination object's modification time.
    pub last_modified: DateTime<Utc>,
}

impl S3Serialize for CopyObjectResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_timestamp(writer, "LastModified", &self.last_modified)?;
        write_text_element(writer, "ETag", &self.etag)?;
        Ok(())
    }
}

impl S3Serialize for DeleteResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for deleted in &self.deleted {
            writer
                .create_element("Deleted")
                .write_inner_content(|w| write_text_element(w, "Key", &deleted.key))?;
        }
        for error in &self.errors {
            writer.create_element("Error").write_inner_content(|w| {
                write_text_element(w, "Key", &error.key)?;
                write_text_element(w, "Code", &error.code)?;
                write_text_element(w, "Message", &error.message)?;
                Ok(())
            })?;
        }
        Ok(())
    }
}

/// The `PostResponse` document returned by a 201 form upload.
#[derive(Debug, Clone)]
pub struct PostResponse {
    /// The URL of the created object.
    pub location: String,
    /// The target bucket.
    pub bucket: String,
    /// The created key.
    pub key: String,
    /// The created object's quoted ETag.
    pub etag: String,
}

impl S3Serialize for PostResponse {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Location", &self.location)?;
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "ETag", &self.etag)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Multipart documents
// ---------------------------------------------------------------------------

/// The `InitiateMultipartUploadResult` document.
#[derive(Debug, Clone)]
pub struct InitiateMultipartUploadResult {
    /// The target bucket.
    pub bucket: String,
    /// The target key.
    pub key: String,
    /// The freshly minted upload ID.
    pub upload_id: String,
}

impl S3Serialize for InitiateMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "UploadId", &self.upload_id)?;
        Ok(())
    }
}

/// The `CompleteMultipartUploadResult` document.
#[derive(Debug, Clone)]
pub struct CompleteMultipartUploadResult {
    /// The URL of the assembled object.
    pub location: String,
    /// The target bucket.
    pub bucket: String,
    /// The assembled key.
    pub key: String,
    /// The multipart ETag (`"md5hex-N"`).
    pub etag: String,
}

impl S3Serialize for CompleteMultipartUploadResult {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_text_element(writer, "Location", &self.location)?;
        write_text_element(writer, "Bucket", &self.bucket)?;
        write_text_element(writer, "Key", &self.key)?;
        write_text_element(writer, "ETag", &self.etag)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ACL document (fixed owner, never enforced)
// ---------------------------------------------------------------------------

/// The canned `AccessControlPolicy` document granting the fixed owner
/// FULL_CONTROL.
#[derive(Debug, Clone, Default)]
pub struct AccessControlPolicy {
    /// The fixed owner.
    pub owner: Owner,
}

impl S3Serialize for AccessControlPolicy {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        write_owner(writer, "Owner", &self.owner)?;
        writer
            .create_element("AccessControlList")
            .write_inner_content(|w| {
                w.create_element("Grant").write_inner_content(|g| {
                    g.create_element("Grantee")
                        .with_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"))
                        .with_attribute(("xsi:type", "CanonicalUser"))
                        .write_inner_content(|gr| {
                            write_text_element(gr, "ID", &self.owner.id)?;
                            write_text_element(gr, "DisplayName", &self.owner.display_name)?;
                            Ok(())
                        })?;
                    write_text_element(g, "Permission", "FULL_CONTROL")?;
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    }
}
