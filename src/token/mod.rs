//! Pinning token subsystem.
//!
//! # Data Flow
//! ```text
//! Issuance:
//!     Payload { id, ts }
//!     → serde_json (stable key order)
//!     → HMAC-SHA256 over the payload bytes
//!     → "<hex payload>.<hex mac>"
//!
//! Verification:
//!     cookie value
//!     → split on first '.' → hex decode both halves
//!     → recompute MAC, constant-time compare
//!     → only then deserialize the payload
//! ```
//!
//! # Design Decisions
//! - Stateless: the secret is passed in, nothing is cached
//! - Every failure is an `Err`, never a panic
//! - Payload bytes are never parsed before the MAC is checked

pub mod codec;

pub use codec::{sign, verify, Payload, TokenError};
