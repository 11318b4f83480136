//! Skew protection decision engine.
//!
//! # Data Flow
//! ```text
//! request head + DeploymentContext + CookieJar + now
//!     → protection.rs::decide (ordered states, first match wins)
//!     → decision.rs::Decision
//!     → apply (Set-Cookie / delete)
//!     → Continue(request) | Respond(rerouted response)
//! ```
//!
//! # States (in order)
//! 1. not a published deployment → pass through
//! 2. no secret / classifier misconfigured → log error, pass through
//! 3. entrypoint → issue a fresh pin, continue
//! 4. no pin cookie → pass through
//! 5. pin fails verification → delete it, pass through
//! 6. pin expired → delete it, pass through
//! 7. pinned to the current deployment → pass through
//! 8. pinned elsewhere → reroute
//!
//! # Design Decisions
//! - Deciding is synchronous and side-effect free apart from logging
//! - No state outlives a request; the engine itself is immutable
//! - Failures while deciding pass the request through; reroute failures do not

pub mod decision;
pub mod protection;

pub use decision::{Decision, Outcome, PassReason, ResetReason};
pub use protection::{now_ms, SkewError, SkewProtection};
