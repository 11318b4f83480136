//! HTTP gateway subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → GET: skew protection engine
//!         → Continue: forward to the current deployment's origin
//!         → Respond:  rerouted response from the pinned deployment
//!     → other methods: forward untouched
//!     → queued Set-Cookie headers appended
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::{AppState, GatewayError, GatewayServer};
