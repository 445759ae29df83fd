//! Response body type.
//!
//! [`S3ResponseBody`] backs every response the service produces. Object
//! bodies are [`Bytes`] snapshots taken under the bucket lock, so a reader
//! keeps the bytes it saw at open time even if the key is overwritten or
//! deleted while the response is streaming out.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;

/// Response body supporting buffered and empty modes.
#[derive(Debug, Default)]
pub enum S3ResponseBody {
    /// Buffered body: object bytes, XML payloads, HTML pages.
    Buffered(Full<Bytes>),
    /// Empty body: 204 responses, HEAD responses.
    #[default]
    Empty,
}

impl S3ResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a buffered body from an XML byte vector.
    #[must_use]
    pub fn from_xml(xml: Vec<u8>) -> Self {
        Self::Buffered(Full::new(Bytes::from(xml)))
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for S3ResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body::Body;

    use super::*;

    #[test]
    fn test_should_report_empty_body_as_end_of_stream() {
        let body = S3ResponseBody::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[test]
    fn test_should_size_buffered_body() {
        let body = S3ResponseBody::from_bytes(Bytes::from("Hello!"));
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(6));
    }

    #[test]
    fn test_should_build_from_string_and_xml() {
        assert_eq!(
            S3ResponseBody::from_string("abc").size_hint().exact(),
            Some(3),
        );
        assert_eq!(
            S3ResponseBody::from_xml(b"<R/>".to_vec()).size_hint().exact(),
            Some(4),
        );
    }
}
