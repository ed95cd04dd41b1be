//! Interview Service Module
//!
//! Client side of the remote interview service's HTTP protocol:
//! - `POST /offer` to create a session
//! - `POST /cancel` to stop it
//! - Service-level error taxonomy

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::SessionService;
pub use error::{ServiceError, ServiceResult};
pub use http::HttpSessionService;
pub use types::*;
