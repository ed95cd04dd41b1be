//! Interview Service Abstraction
//!
//! The controller only needs two calls from the remote service: create a
//! session and cancel it. Keeping them behind a trait lets tests substitute
//! an in-memory fake for the HTTP client.

use async_trait::async_trait;

use super::error::ServiceResult;
use super::types::{CancelRequest, OfferRequest, OfferResponse};

/// Remote endpoint of the session protocol
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Request creation of a session (`POST /offer`)
    async fn create_session(&self, request: &OfferRequest) -> ServiceResult<OfferResponse>;

    /// Request cancellation of a session (`POST /cancel`)
    async fn cancel_session(&self, request: &CancelRequest) -> ServiceResult<()>;

    /// Service type name for logging
    fn service_type(&self) -> &'static str;
}
