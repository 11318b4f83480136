//! HTTP gateway setup.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler on every path
//! - Wire up middleware (tracing, timeout, request ID, panic recovery)
//! - Build the per-request cookie jar and deployment context
//! - Run the skew protection engine on GET requests
//! - Forward everything else to the current deployment's origin

use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        Method, Request, StatusCode, Uri, Version,
    },
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{GatewayConfig, TimeoutConfig};
use crate::engine::{Outcome, SkewError, SkewProtection};
use crate::host::{DeploymentContext, Environment, ProcessEnvironment, RequestCookies};
use crate::http::headers::strip_hop_by_hop;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to build skew protection: {0}")]
    Engine(#[from] SkewError),

    #[error("invalid upstream address {address:?}: {source}")]
    Upstream {
        address: String,
        source: axum::http::uri::InvalidUri,
    },
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub protection: Arc<SkewProtection>,
    pub deployment: Arc<DeploymentContext>,
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Gateway in front of the current deployment's origin.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build the gateway, reading secrets from the process environment.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_environment(config, &ProcessEnvironment)
    }

    pub fn with_environment(
        config: GatewayConfig,
        env: &dyn Environment,
    ) -> Result<Self, GatewayError> {
        let protection = SkewProtection::new(config.skew_protection.clone(), &config.reroute, env)?;
        let upstream =
            Authority::from_str(&config.upstream.address).map_err(|source| GatewayError::Upstream {
                address: config.upstream.address.clone(),
                source,
            })?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            protection: Arc::new(protection),
            deployment: Arc::new(config.deployment.clone()),
            client,
            upstream,
        };

        let router = Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state);
        let router = with_middleware(router, &config.timeouts);
        Ok(Self { router, config })
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            deployment_id = ?self.config.deployment.deployment_id,
            published = self.config.deployment.is_published,
            "Gateway starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

/// Wrap a router with the gateway's middleware layers.
#[allow(deprecated)]
fn with_middleware(router: Router, timeouts: &TimeoutConfig) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "Request handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}

/// Runs skew protection on GET requests, then serves the outcome.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() != Method::GET {
        return forward(&state, request).await;
    }

    let mut cookies = RequestCookies::from_headers(request.headers());
    let mut response = match state
        .protection
        .handle(request, &state.deployment, &mut cookies)
        .await
    {
        Outcome::Continue(request) => forward(&state, request).await,
        Outcome::Respond(response) => response,
    };

    cookies.apply(response.headers_mut());
    response
}

/// Forward a request to the current deployment's origin.
async fn forward(state: &AppState, request: Request<Body>) -> Response {
    let request_id = request_id(&request).to_string();
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Could not build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response();
        }
    };
    parts.version = Version::HTTP_11;
    strip_hop_by_hop(&mut parts.headers);

    tracing::debug!(request_id = %request_id, method = %parts.method, uri = %parts.uri, "Forwarding to upstream");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
