//! Per-request decisions.

use axum::{
    body::Body,
    http::{Request, Response},
};

use crate::host::CookieDescriptor;

/// What the engine decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Set a fresh pin and continue on the current deployment.
    Issue(CookieDescriptor),

    /// Serve the request from the pinned deployment.
    Reroute { deployment_id: String },

    /// Leave the request alone.
    PassThrough(PassReason),

    /// Delete the pin and continue on the current deployment.
    Reset(ResetReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    /// Local development or a draft deployment.
    Unpublished,
    MissingSecret,
    /// Classifier mode and entrypoints disagree.
    Misconfigured,
    NoCookie,
    SameDeployment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Malformed or forged token.
    InvalidToken,
    Expired,
}

impl Decision {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Issue(_) => "issue",
            Decision::Reroute { .. } => "reroute",
            Decision::PassThrough(PassReason::Unpublished) => "unpublished",
            Decision::PassThrough(PassReason::MissingSecret) => "missing_secret",
            Decision::PassThrough(PassReason::Misconfigured) => "misconfigured",
            Decision::PassThrough(PassReason::NoCookie) => "no_cookie",
            Decision::PassThrough(PassReason::SameDeployment) => "same_deployment",
            Decision::Reset(ResetReason::InvalidToken) => "invalid_token",
            Decision::Reset(ResetReason::Expired) => "expired",
        }
    }
}

/// Result of handling a request.
#[derive(Debug)]
pub enum Outcome {
    /// Serve the request normally (cookie mutations may have been queued).
    Continue(Request<Body>),

    /// Send this response instead.
    Respond(Response<Body>),
}
