//! Rerouting to a sibling deployment.
//!
//! # Data Flow
//! ```text
//! pinned deployment id + inbound request
//!     → target.rs (origin template → sibling origin, keep path and query)
//!     → [bypass.rs: POST password, extract site session cookie]   (optional)
//!     → proxy.rs (same method, headers, body → sibling origin)
//!     → sibling response, streamed back unmodified
//! ```
//!
//! # Design Decisions
//! - Transparent proxy, not a redirect: the client never sees the sibling host
//! - Redirects from the sibling are passed through, never followed
//! - Network failures surface as 502, never as a silent pass-through
//! - Bypass calls are sequential: the proxied call needs the session cookie

pub mod bypass;
pub mod proxy;
pub mod target;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub use proxy::Rerouter;
pub use target::OriginTemplate;

#[derive(Debug, Error)]
pub enum RerouteError {
    #[error("invalid origin template {template:?}: {reason}")]
    Template { template: String, reason: String },

    #[error("invalid target URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("HTTP client could not be built: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to sibling deployment failed: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("no session credential for the basic auth gate")]
    MissingCredential,
}

impl RerouteError {
    pub fn status(&self) -> StatusCode {
        match self {
            RerouteError::MissingCredential => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RerouteError {
    fn into_response(self) -> Response {
        match self {
            RerouteError::MissingCredential => self.status().into_response(),
            _ => (self.status(), "Upstream request failed").into_response(),
        }
    }
}
