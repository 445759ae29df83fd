//! Operation dispatch: the boundary between the HTTP layer and the store.
//!
//! The service resolves a request into a [`RoutingContext`] and hands it,
//! with the raw parts and collected body, to the [`S3Handler`]. The handler
//! returns a fully formed HTTP response or an [`S3Error`] the response
//! assembler turns into the `<Error>` envelope.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use sandbar_model::error::S3Error;
use sandbar_model::operations::S3Operation;

use crate::body::S3ResponseBody;
use crate::router::RoutingContext;

/// A boxed handler future.
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<http::Response<S3ResponseBody>, S3Error>> + Send>>;

/// Trait the store/handler layer implements.
///
/// Uses `async-trait`-style boxing so the service can hold the handler
/// behind `Arc<H>` without generic futures leaking into its `Service` impl.
pub trait S3Handler: Send + Sync + 'static {
    /// Handle an identified S3 operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: S3Operation,
        parts: http::request::Parts,
        body: Bytes,
        ctx: RoutingContext,
    ) -> HandlerFuture;

    /// Whether a bucket with this exact name exists. Backs CNAME-style
    /// addressing in the router.
    fn bucket_exists(&self, name: &str) -> bool;
}

/// Dispatch a routed request to the handler.
pub async fn dispatch_operation<H: S3Handler>(
    handler: &H,
    parts: http::request::Parts,
    body: Bytes,
    ctx: RoutingContext,
) -> Result<http::Response<S3ResponseBody>, S3Error> {
    let op = ctx.operation;
    tracing::debug!(operation = %op, bucket = ?ctx.bucket, key = ?ctx.key, "dispatching");
    handler.handle_operation(op, parts, body, ctx).await
}
