//! Deployment skew protection.
//!
//! Pins a client to the deployment that served its first page load and
//! transparently serves its later requests from that deployment's origin,
//! so HTML from one deploy never pulls scripts from another.

/// `debug!` that only fires when verbose decision logging is enabled.
macro_rules! verbose {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            ::tracing::debug!($($arg)+);
        }
    };
}

// Core subsystems
pub mod engine;
pub mod entrypoint;
pub mod reroute;
pub mod token;

// Host integration
pub mod host;
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use engine::{Decision, Outcome, SkewProtection};
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
