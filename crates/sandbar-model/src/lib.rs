//! Shared wire-level model for the Sandbar S3 test double.
//!
//! This crate holds everything the other layers agree on:
//!
//! - [`error`]: the S3 error registry ([`error::S3ErrorCode`]) and the wire
//!   error type ([`error::S3Error`]) serialized as the `<Error>` envelope.
//! - [`operations`]: the [`operations::S3Operation`] enum the router resolves
//!   requests into.
//! - [`types`]: plain data types shared between the store, the configuration
//!   engines, and the XML codec (tags, CORS rules, website routing rules,
//!   listing results, multipart parts).

pub mod error;
pub mod operations;
pub mod types;

pub use error::{S3Error, S3ErrorCode};
pub use operations::S3Operation;
