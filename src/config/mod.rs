//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → engine and server built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets never live in the file, only the names of the variables holding them

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, RerouteConfig,
    SkewProtectionConfig, TimeoutConfig, UpstreamConfig,
};
