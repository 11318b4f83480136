//! Entrypoint classification.
//!
//! # Data Flow
//! ```text
//! ClassifierMode + entrypoints (at startup)
//!     → classifier.rs (build strategy, reject inconsistent pairings)
//!     → Box<dyn EntrypointClassifier>
//!
//! Per request:
//!     request head (path, Accept)
//!     → is_entrypoint() → bool
//! ```
//!
//! # Design Decisions
//! - Strategies are mutually exclusive; one is chosen at startup
//! - Path matching is exact (no normalization, no trailing-slash folding)
//! - Classifiers never read or write cookies

pub mod classifier;

pub use classifier::{
    build_classifier, AcceptHeaderClassifier, ClassifierError, ClassifierMode,
    EntrypointClassifier, PathListClassifier,
};
