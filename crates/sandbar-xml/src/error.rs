//! XML codec errors and the `<Error>` response envelope.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// Errors that can occur during XML serialization or deserialization.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// A required XML element was missing.
    #[error("missing required XML element: {0}")]
    MissingElement(String),

    /// An unexpected XML element was encountered.
    #[error("unexpected XML element: {0}")]
    UnexpectedElement(String),

    /// An error parsing a value from XML text content.
    #[error("failed to parse value: {0}")]
    ParseError(String),

    /// A well-formed element carried a value outside its allowed domain
    /// (e.g. a redirect protocol that is not `http`/`https`). These map to
    /// a more specific wire error than `MalformedXML`.
    #[error("{0}")]
    InvalidValue(String),
}

/// Format an S3 error as the flat `<Error>` envelope.
///
/// S3 uses `noErrorWrapping`, so there is no outer `<ErrorResponse>` element.
///
/// # Example output
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>NoSuchKey</Code>
///   <Message>The specified key does not exist.</Message>
///   <Resource>/bucket1/text</Resource>
///   <RequestId>8A206622...</RequestId>
/// </Error>
/// ```
pub fn error_to_xml(
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    // Writing into a Vec cannot fail; an Err here is a logic error.
    if let Err(e) = write_error_xml(&mut buf, code, message, resource, request_id) {
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        if let Some(res) = resource {
            w.create_element("Resource")
                .write_text_content(BytesText::new(res))?;
        }
        w.create_element("RequestId")
            .write_text_content(BytesText::new(request_id))?;
        Ok(())
    })?;

    Ok(())
}
