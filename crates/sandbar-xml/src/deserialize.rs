//! S3 request-body deserialization.
//!
//! Provides the [`S3Deserialize`] trait and typed parsers for the XML bodies
//! this server accepts: CORS and website configurations, tag sets, multi-key
//! deletes, and multipart completion manifests. Parsing is shape-level; the
//! configuration engines apply the semantic rules (wildcard limits, method
//! whitelists, mutual exclusions) on the parsed values.

use quick_xml::Reader;
use quick_xml::events::Event;

use sandbar_model::types::{
    CompletedMultipartUpload, CompletedPart, CorsConfiguration, CorsRule, DeleteRequest,
    ObjectIdentifier, Protocol, RedirectAllRequestsTo, RoutingCondition, RoutingRedirect,
    RoutingRule, Tag, Tagging, WebsiteConfiguration,
};

use crate::error::XmlError;

/// Trait for deserializing S3 types from XML.
///
/// The reader is positioned just after the opening tag of this element; the
/// implementation reads child content through the matching end tag.
pub trait S3Deserialize: Sized {
    /// Deserialize an instance from the given XML reader.
    ///
    /// # Errors
    ///
    /// Returns `XmlError` if the XML is malformed or required fields are
    /// missing.
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError>;
}

/// Deserialize a complete S3 XML document into a typed value.
///
/// # Errors
///
/// Returns `XmlError` if the XML is malformed or deserialization fails.
pub fn from_xml<T: S3Deserialize>(xml: &[u8]) -> Result<T, XmlError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    // Skip the declaration and find the root element.
    loop {
        match reader.read_event()? {
            Event::Start(_) => {
                return T::deserialize_xml(&mut reader);
            }
            Event::Eof => {
                return Err(XmlError::MissingElement("root element".to_owned()));
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Reader helpers
// ---------------------------------------------------------------------------

/// Read the text content of the current element and consume its end tag.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String, XmlError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => {
                let unescaped = e
                    .unescape()
                    .map_err(|err| XmlError::ParseError(err.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::End(_) => return Ok(text),
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while reading text content".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

/// Skip over an element and all its children.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<(), XmlError> {
    let mut depth: u32 = 1;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(
                    "unexpected EOF while skipping element".to_owned(),
                ));
            }
            _ => {}
        }
    }
}

/// Read repeated `item_tag` children of the current element into a `Vec`.
fn deserialize_list<T: S3Deserialize>(
    reader: &mut Reader<&[u8]>,
    item_tag: &str,
) -> Result<Vec<T>, XmlError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?
                    .to_owned();
                if tag_name == item_tag {
                    items.push(T::deserialize_xml(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF in {item_tag} list"
                )));
            }
            _ => {}
        }
    }
    Ok(items)
}

/// Parse a boolean from XML text (`true`/`false`).
fn parse_bool(s: &str) -> Result<bool, XmlError> {
    match s {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(XmlError::ParseError(format!("invalid boolean: {s}"))),
    }
}

/// Parse an i64 from XML text.
fn parse_i64(s: &str) -> Result<i64, XmlError> {
    s.parse()
        .map_err(|_| XmlError::ParseError(format!("invalid integer: {s}")))
}

/// Parse a u32 from XML text.
fn parse_u32(s: &str) -> Result<u32, XmlError> {
    s.parse()
        .map_err(|_| XmlError::ParseError(format!("invalid integer: {s}")))
}

// ---------------------------------------------------------------------------
// CORS configuration
// ---------------------------------------------------------------------------

impl S3Deserialize for CorsRule {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut allowed_methods = Vec::new();
        let mut allowed_origins = Vec::new();
        let mut allowed_headers = Vec::new();
        let mut expose_headers = Vec::new();
        let mut max_age_seconds = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "AllowedMethod" => allowed_methods.push(read_text_content(reader)?),
                        "AllowedOrigin" => allowed_origins.push(read_text_content(reader)?),
                        "AllowedHeader" => allowed_headers.push(read_text_content(reader)?),
                        "ExposeHeader" => expose_headers.push(read_text_content(reader)?),
                        "MaxAgeSeconds" => {
                            let text = read_text_content(reader)?;
                            max_age_seconds = Some(parse_i64(&text)?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in CORSRule".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        Ok(CorsRule {
            allowed_methods,
            allowed_origins,
            allowed_headers,
            expose_headers,
            max_age_seconds,
        })
    }
}

impl S3Deserialize for CorsConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let rules = deserialize_list(reader, "CORSRule")?;
        Ok(CorsConfiguration { rules })
    }
}

// ---------------------------------------------------------------------------
// Website configuration
// ---------------------------------------------------------------------------

fn parse_protocol(text: &str) -> Result<Protocol, XmlError> {
    Protocol::parse(text).ok_or_else(|| {
        XmlError::InvalidValue(format!(
            "Invalid protocol, protocol can be http or https only. Provided protocol: {text}"
        ))
    })
}

impl S3Deserialize for RoutingCondition {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key_prefix_equals = None;
        let mut http_error_code_returned_equals = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "KeyPrefixEquals" => key_prefix_equals = Some(read_text_content(reader)?),
                        "HttpErrorCodeReturnedEquals" => {
                            let text = read_text_content(reader)?;
                            let code: u16 = text.parse().map_err(|_| {
                                XmlError::ParseError(format!("invalid HTTP error code: {text}"))
                            })?;
                            if !(400..=599).contains(&code) {
                                return Err(XmlError::InvalidValue(format!(
                                    "The provided HTTP error code ({code}) is not valid. Valid \
                                     codes are 4XX or 5XX."
                                )));
                            }
                            http_error_code_returned_equals = Some(code);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Condition".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        if key_prefix_equals.is_none() && http_error_code_returned_equals.is_none() {
            return Err(XmlError::MissingElement(
                "Condition requires KeyPrefixEquals or HttpErrorCodeReturnedEquals".to_owned(),
            ));
        }

        Ok(RoutingCondition {
            key_prefix_equals,
            http_error_code_returned_equals,
        })
    }
}

impl S3Deserialize for RoutingRedirect {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut redirect = RoutingRedirect::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Protocol" => {
                            let text = read_text_content(reader)?;
                            redirect.protocol = Some(parse_protocol(&text)?);
                        }
                        "HostName" => redirect.host_name = Some(read_text_content(reader)?),
                        "ReplaceKeyPrefixWith" => {
                            redirect.replace_key_prefix_with = Some(read_text_content(reader)?);
                        }
                        "ReplaceKeyWith" => {
                            redirect.replace_key_with = Some(read_text_content(reader)?);
                        }
                        "HttpRedirectCode" => {
                            let text = read_text_content(reader)?;
                            let code: u16 = text.parse().map_err(|_| {
                                XmlError::ParseError(format!("invalid redirect code: {text}"))
                            })?;
                            if !(300..=399).contains(&code) {
                                return Err(XmlError::InvalidValue(format!(
                                    "The provided HTTP redirect code ({code}) is not valid. \
                                     Valid codes are 3XX except 300."
                                )));
                            }
                            redirect.http_redirect_code = Some(code);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Redirect".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        if redirect.replace_key_with.is_some() && redirect.replace_key_prefix_with.is_some() {
            return Err(XmlError::InvalidValue(
                "You can only define ReplaceKeyPrefix or ReplaceKey but not both.".to_owned(),
            ));
        }

        Ok(redirect)
    }
}

impl S3Deserialize for RoutingRule {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut condition = None;
        let mut redirect = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Condition" => condition = Some(RoutingCondition::deserialize_xml(reader)?),
                        "Redirect" => redirect = Some(RoutingRedirect::deserialize_xml(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in RoutingRule".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        let redirect =
            redirect.ok_or_else(|| XmlError::MissingElement("RoutingRule.Redirect".to_owned()))?;

        Ok(RoutingRule {
            condition,
            redirect,
        })
    }
}

impl S3Deserialize for RedirectAllRequestsTo {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut host_name = None;
        let mut protocol = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "HostName" => host_name = Some(read_text_content(reader)?),
                        "Protocol" => {
                            let text = read_text_content(reader)?;
                            protocol = Some(parse_protocol(&text)?);
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in RedirectAllRequestsTo".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        let host_name = host_name
            .ok_or_else(|| XmlError::MissingElement("RedirectAllRequestsTo.HostName".to_owned()))?;

        Ok(RedirectAllRequestsTo {
            host_name,
            protocol,
        })
    }
}

/// Read a single-child wrapper element (`<IndexDocument><Suffix>…`) and
/// return the child's text.
fn read_wrapped_text(
    reader: &mut Reader<&[u8]>,
    child_tag: &str,
) -> Result<String, XmlError> {
    let mut value = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                let tag_name = std::str::from_utf8(name.as_ref())
                    .map_err(|e| XmlError::ParseError(e.to_string()))?
                    .to_owned();
                if tag_name == child_tag {
                    value = Some(read_text_content(reader)?);
                } else {
                    skip_element(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlError::UnexpectedElement(format!(
                    "unexpected EOF while reading {child_tag}"
                )));
            }
            _ => {}
        }
    }
    value.ok_or_else(|| XmlError::MissingElement(child_tag.to_owned()))
}

impl S3Deserialize for WebsiteConfiguration {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut config = WebsiteConfiguration::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "IndexDocument" => {
                            config.index_document_suffix =
                                Some(read_wrapped_text(reader, "Suffix")?);
                        }
                        "ErrorDocument" => {
                            config.error_document_key = Some(read_wrapped_text(reader, "Key")?);
                        }
                        "RedirectAllRequestsTo" => {
                            config.redirect_all_requests_to =
                                Some(RedirectAllRequestsTo::deserialize_xml(reader)?);
                        }
                        "RoutingRules" => {
                            config.routing_rules = deserialize_list(reader, "RoutingRule")?;
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in WebsiteConfiguration".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        // A configuration must either redirect everything or name an index
        // document; anything else is rejected by the real service too.
        if config.redirect_all_requests_to.is_none() && config.index_document_suffix.is_none() {
            return Err(XmlError::MissingElement(
                "WebsiteConfiguration.IndexDocument".to_owned(),
            ));
        }

        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tagging
// ---------------------------------------------------------------------------

impl S3Deserialize for Tag {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;
        let mut value = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Key" => key = Some(read_text_content(reader)?),
                        "Value" => value = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Tag".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Tag {
            key: key.ok_or_else(|| XmlError::MissingElement("Tag.Key".to_owned()))?,
            value: value.ok_or_else(|| XmlError::MissingElement("Tag.Value".to_owned()))?,
        })
    }
}

impl S3Deserialize for Tagging {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut tag_set = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    if tag_name == "TagSet" {
                        tag_set = deserialize_list(reader, "Tag")?;
                    } else {
                        skip_element(reader)?;
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Tagging".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        Ok(Tagging { tag_set })
    }
}

// ---------------------------------------------------------------------------
// DeleteObjects
// ---------------------------------------------------------------------------

impl S3Deserialize for ObjectIdentifier {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut key = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    if tag_name == "Key" {
                        key = Some(read_text_content(reader)?);
                    } else {
                        skip_element(reader)?;
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Object".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        Ok(ObjectIdentifier {
            key: key.ok_or_else(|| XmlError::MissingElement("Object.Key".to_owned()))?,
        })
    }
}

impl S3Deserialize for DeleteRequest {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut objects = Vec::new();
        let mut quiet = false;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "Object" => objects.push(ObjectIdentifier::deserialize_xml(reader)?),
                        "Quiet" => {
                            let text = read_text_content(reader)?;
                            quiet = parse_bool(&text)?;
                        }
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Delete".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        if objects.is_empty() {
            return Err(XmlError::MissingElement("Delete.Object".to_owned()));
        }

        Ok(DeleteRequest { objects, quiet })
    }
}

// ---------------------------------------------------------------------------
// CompleteMultipartUpload
// ---------------------------------------------------------------------------

impl S3Deserialize for CompletedPart {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let mut part_number = None;
        let mut etag = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = e.name();
                    let tag_name = std::str::from_utf8(name.as_ref())
                        .map_err(|e| XmlError::ParseError(e.to_string()))?;
                    match tag_name {
                        "PartNumber" => {
                            let text = read_text_content(reader)?;
                            part_number = Some(parse_u32(&text)?);
                        }
                        "ETag" => etag = Some(read_text_content(reader)?),
                        _ => skip_element(reader)?,
                    }
                }
                Event::End(_) => break,
                Event::Eof => {
                    return Err(XmlError::UnexpectedElement(
                        "unexpected EOF in Part".to_owned(),
                    ));
                }
                _ => {}
            }
        }

        Ok(CompletedPart {
            part_number: part_number
                .ok_or_else(|| XmlError::MissingElement("Part.PartNumber".to_owned()))?,
            etag: etag.ok_or_else(|| XmlError::MissingElement("Part.ETag".to_owned()))?,
        })
    }
}

impl S3Deserialize for CompletedMultipartUpload {
    fn deserialize_xml(reader: &mut Reader<&[u8]>) -> Result<Self, XmlError> {
        let parts = deserialize_list(reader, "Part")?;
        Ok(CompletedMultipartUpload { parts })
    }
}
