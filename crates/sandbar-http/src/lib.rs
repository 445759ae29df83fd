//! S3 HTTP layer: routing, request parsing, response shaping, and the hyper
//! service.
//!
//! - **Routing** ([`router`]): maps incoming requests to S3 operations by
//!   method, path, query parameters, and headers. Supports path-style,
//!   virtual-hosted-style, CNAME (bucket-as-Host), and website-endpoint
//!   addressing.
//! - **Dispatch** ([`dispatch`]): the [`dispatch::S3Handler`] trait, the
//!   boundary between this layer and the store/handlers.
//! - **Request helpers** ([`request`]): query/header extraction, metadata
//!   headers, copy-source parsing, response-header overrides.
//! - **Response helpers** ([`response`]): XML/empty response builders and
//!   the `<Error>` envelope assembler.
//! - **Body** ([`body`]): [`body::S3ResponseBody`], buffered or empty.
//! - **Form uploads** ([`multipart`]): the `multipart/form-data` parser
//!   behind POST object.
//! - **Service** ([`service`]): [`service::S3HttpService`], the hyper
//!   `Service` gluing routing, authentication, dispatch, and common headers.
//!
//! ```text
//! HTTP Request
//!   -> S3HttpService (hyper Service)
//!     -> Health check interception
//!     -> S3Router (addressing + operation identification)
//!     -> Body collection
//!     -> SigV2/SigV4 authentication (sandbar-auth)
//!     -> dispatch_operation (S3Handler trait)
//!     -> Common response headers (x-amz-request-id, Date, Server)
//!   <- HTTP Response
//! ```

// S3Error is used pervasively as Result<T, S3Error>; boxing it in every
// Result would add indirection on the hot path for negligible benefit.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod multipart;
pub mod request;
pub mod response;
pub mod router;
pub mod service;

pub use body::S3ResponseBody;
pub use dispatch::S3Handler;
pub use router::{AddressingStyle, RoutingContext, S3Router};
pub use service::{S3HttpConfig, S3HttpService};
