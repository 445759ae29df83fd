//! S3 RestXml codec for Sandbar.
//!
//! - [`serialize`]: the [`serialize::S3Serialize`] trait and implementations
//!   producing response documents under the
//!   `http://s3.amazonaws.com/doc/2006-03-01/` namespace.
//! - [`deserialize`]: the [`deserialize::S3Deserialize`] trait and typed,
//!   shape-validating parsers for request bodies (CORS, website, tagging,
//!   delete, complete-multipart).
//! - [`error`]: [`error::XmlError`] plus the flat `<Error>` envelope writer.

pub mod deserialize;
pub mod error;
pub mod serialize;

pub use deserialize::from_xml;
pub use error::{XmlError, error_to_xml};
pub use serialize::{S3_NAMESPACE, to_xml};
