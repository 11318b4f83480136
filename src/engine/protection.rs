//! The skew protection engine.

use axum::{
    body::Body,
    http::{request::Parts, Request},
    response::IntoResponse,
};
use chrono::Utc;
use thiserror::Error;

use super::{Decision, Outcome, PassReason, ResetReason};
use crate::config::{RerouteConfig, SkewProtectionConfig};
use crate::entrypoint::{build_classifier, ClassifierError, EntrypointClassifier};
use crate::host::{CookieDescriptor, CookieJar, DeploymentContext, Environment, SameSite};
use crate::observability::metrics;
use crate::reroute::{RerouteError, Rerouter};
use crate::token::{self, Payload, TokenError};

#[derive(Debug, Error)]
pub enum SkewError {
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error(transparent)]
    Reroute(#[from] RerouteError),
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Keeps clients on the deployment they first loaded.
///
/// Built once per process from immutable options; every request is handled
/// independently.
#[derive(Debug)]
pub struct SkewProtection {
    options: SkewProtectionConfig,
    secret: Option<String>,
    classifier: Result<Box<dyn EntrypointClassifier>, ClassifierError>,
    rerouter: Rerouter,
}

impl SkewProtection {
    /// Build the engine, reading the secret and bypass password once from `env`.
    ///
    /// A missing secret or an inconsistent classifier does not fail
    /// construction; it is reported on every request instead.
    pub fn new(
        options: SkewProtectionConfig,
        reroute: &RerouteConfig,
        env: &dyn Environment,
    ) -> Result<Self, SkewError> {
        let secret = env
            .get(&options.secret_environment_variable_name)
            .filter(|secret| !secret.is_empty());
        let bypass_password = options
            .basic_auth_password_environment_variable_name
            .as_deref()
            .and_then(|name| env.get(name));

        let classifier = build_classifier(options.mode, &options.entrypoints);
        if let Err(e) = &classifier {
            tracing::warn!(error = %e, "Skew protection classifier is misconfigured; requests will pass through");
        }

        let rerouter = Rerouter::new(reroute, bypass_password, options.verbose)?;

        tracing::info!(
            mode = ?options.mode,
            entrypoints = ?options.entrypoints,
            cookie_name = %options.cookie_name,
            secret_configured = secret.is_some(),
            basic_auth_bypass = rerouter.bypass_enabled(),
            origin_template = %rerouter.template().as_str(),
            "Skew protection initialized"
        );

        Ok(Self {
            options,
            secret,
            classifier,
            rerouter,
        })
    }

    /// Pick the decision for a request. First matching state wins.
    pub fn decide(
        &self,
        request: &Parts,
        context: &DeploymentContext,
        cookies: &dyn CookieJar,
        now_ms: u64,
    ) -> Result<Decision, SkewError> {
        let verbose = self.options.verbose;

        let Some(current) = context.active_deployment() else {
            verbose!(verbose, "Not a published deployment, exiting");
            return Ok(Decision::PassThrough(PassReason::Unpublished));
        };

        let Some(secret) = self.secret.as_deref() else {
            tracing::error!(
                variable = %self.options.secret_environment_variable_name,
                "Skew protection is not installed properly: missing or empty secret environment variable"
            );
            return Ok(Decision::PassThrough(PassReason::MissingSecret));
        };

        let classifier = match &self.classifier {
            Ok(classifier) => classifier,
            Err(e) => {
                tracing::error!(error = %e, "Skew protection is not installed properly");
                return Ok(Decision::PassThrough(PassReason::Misconfigured));
            }
        };

        verbose!(verbose, path = %request.uri.path(), "Classifying request");

        if classifier.is_entrypoint(request) {
            verbose!(verbose, deployment_id = %current, "Entrypoint matched, issuing pin");
            let value = token::sign(&Payload::new(current, now_ms), secret)?;
            return Ok(Decision::Issue(self.pin_cookie(value, now_ms)));
        }

        let Some(cookie) = cookies
            .get(&self.options.cookie_name)
            .filter(|cookie| !cookie.is_empty())
        else {
            verbose!(verbose, cookie_name = %self.options.cookie_name, "No pin cookie, exiting");
            return Ok(Decision::PassThrough(PassReason::NoCookie));
        };

        let payload = match token::verify(&cookie, secret) {
            Ok(payload) => payload,
            Err(e) => {
                verbose!(verbose, error = %e, "Pin cookie is invalid, deleting it");
                return Ok(Decision::Reset(ResetReason::InvalidToken));
            }
        };

        if payload.is_expired(now_ms, self.options.cookie_max_age_in_ms) {
            verbose!(verbose, issued_at_ms = payload.issued_at_ms, "Pin cookie expired, deleting it");
            return Ok(Decision::Reset(ResetReason::Expired));
        }

        if payload.deployment_id == current {
            verbose!(verbose, "Pinned to the current deployment, exiting");
            return Ok(Decision::PassThrough(PassReason::SameDeployment));
        }

        Ok(Decision::Reroute {
            deployment_id: payload.deployment_id,
        })
    }

    /// Queue the cookie mutations a decision implies.
    pub fn apply(&self, decision: &Decision, cookies: &mut dyn CookieJar) {
        match decision {
            Decision::Issue(cookie) => cookies.set(cookie.clone()),
            Decision::Reset(_) => {
                cookies.delete(&self.options.cookie_name, &self.options.cookie_path)
            }
            Decision::Reroute { .. } | Decision::PassThrough(_) => {}
        }
    }

    /// Decide, apply, and reroute if needed.
    pub async fn handle(
        &self,
        request: Request<Body>,
        context: &DeploymentContext,
        cookies: &mut dyn CookieJar,
    ) -> Outcome {
        let (parts, body) = request.into_parts();

        let decision = match self.decide(&parts, context, &*cookies, now_ms()) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::error!(error = %e, "Skew protection failed, passing request through");
                metrics::record_decision("error");
                return Outcome::Continue(Request::from_parts(parts, body));
            }
        };

        verbose!(self.options.verbose, decision = decision.label(), path = %parts.uri.path(), "Skew protection decision");
        metrics::record_decision(decision.label());
        self.apply(&decision, cookies);

        let request = Request::from_parts(parts, body);
        let Decision::Reroute { deployment_id } = decision else {
            return Outcome::Continue(request);
        };

        match self.rerouter.reroute(&deployment_id, request, context).await {
            Ok(response) => Outcome::Respond(response),
            Err(e) => {
                tracing::error!(deployment_id = %deployment_id, error = %e, "Re-routing to pinned deployment failed");
                metrics::record_reroute_failure();
                Outcome::Respond(e.into_response())
            }
        }
    }

    fn pin_cookie(&self, value: String, now_ms: u64) -> CookieDescriptor {
        CookieDescriptor {
            name: self.options.cookie_name.clone(),
            value,
            path: self.options.cookie_path.clone(),
            http_only: true,
            // Cross-origin classic <script> tags need SameSite=None, which requires Secure.
            secure: true,
            same_site: Some(SameSite::None),
            expires_at_ms: Some(now_ms.saturating_add(self.options.cookie_max_age_in_ms)),
        }
    }
}
