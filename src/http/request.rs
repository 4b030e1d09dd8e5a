//! Request identification and per-response accounting.
//!
//! # Responsibilities
//! - Stamp a unique request ID (UUID v4) on request and response
//! - Count responses by status class
//!
//! # Design Decisions
//! - Request ID added as early as possible for log correlation
//! - The layer wraps everything, so its counter sees every response

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    response::Response,
};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::observability::metrics;

/// Header carrying the generated request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer installing [`RequestIdService`].
#[derive(Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Service stamping `x-request-id` on both directions.
#[derive(Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<S::Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let header = HeaderName::from_static(X_REQUEST_ID);
        let id = Uuid::new_v4().to_string();
        if let Ok(value) = HeaderValue::from_str(&id) {
            request.headers_mut().insert(header.clone(), value);
        }

        // Swap in a clone so the boxed future owns a service that was
        // polled ready.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(request).await?;
            metrics::record_request(response.status().as_u16());
            if let Ok(value) = HeaderValue::from_str(&id) {
                response.headers_mut().insert(header, value);
            }
            Ok(response)
        })
    }
}
