//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::entrypoint::ClassifierMode;
use crate::host::DeploymentContext;
use crate::reroute::OriginTemplate;

pub const SECRET_ENVIRONMENT_VARIABLE: &str = "SKEW_PROTECTION_SECRET";
pub const COOKIE_NAME: &str = "nf_sp";
/// One day.
pub const COOKIE_MAX_AGE_MS: u64 = 1000 * 60 * 60 * 24;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin serving the current deployment.
    pub upstream: UpstreamConfig,

    /// Identity of the current deployment.
    pub deployment: DeploymentContext,

    /// Skew protection engine options.
    pub skew_protection: SkewProtectionConfig,

    /// Sibling deployment addressing.
    pub reroute: RerouteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// The current deployment's origin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Options of the skew protection engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SkewProtectionConfig {
    /// How entrypoint requests are recognized.
    pub mode: ClassifierMode,

    /// Exact paths that (re)issue the pinning cookie. Required in
    /// `entrypoints` mode, must be empty in `spa` mode.
    pub entrypoints: Vec<String>,

    /// Environment variable holding the HMAC secret.
    pub secret_environment_variable_name: String,

    /// Environment variable holding the basic auth password. Unset disables
    /// the bypass.
    pub basic_auth_password_environment_variable_name: Option<String>,

    pub cookie_name: String,

    pub cookie_path: String,

    pub cookie_max_age_in_ms: u64,

    /// Log every decision step.
    pub verbose: bool,
}

impl SkewProtectionConfig {
    /// Any HTML navigation issues the pin.
    pub fn spa() -> Self {
        Self {
            mode: ClassifierMode::Spa,
            ..Self::default()
        }
    }

    /// Only `entrypoints` issue the pin.
    pub fn entrypoints<I, S>(entrypoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: ClassifierMode::Entrypoints,
            entrypoints: entrypoints.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for SkewProtectionConfig {
    fn default() -> Self {
        Self {
            mode: ClassifierMode::default(),
            entrypoints: Vec::new(),
            secret_environment_variable_name: SECRET_ENVIRONMENT_VARIABLE.to_string(),
            basic_auth_password_environment_variable_name: None,
            cookie_name: COOKIE_NAME.to_string(),
            cookie_path: "/".to_string(),
            cookie_max_age_in_ms: COOKIE_MAX_AGE_MS,
            verbose: false,
        }
    }
}

/// Sibling deployment addressing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RerouteConfig {
    /// Origin of a deployment, with `{deployment_id}` and `{site_name}`
    /// placeholders.
    pub origin_template: String,

    /// Total timeout for a rerouted request in seconds.
    pub timeout_secs: u64,
}

impl Default for RerouteConfig {
    fn default() -> Self {
        Self {
            origin_template: OriginTemplate::NETLIFY.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
