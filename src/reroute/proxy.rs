//! Transparent proxying to a sibling deployment.

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use reqwest::{redirect, Client};

use super::{bypass, OriginTemplate, RerouteError};
use crate::config::RerouteConfig;
use crate::host::DeploymentContext;
use crate::http::headers::strip_hop_by_hop;
use crate::observability::metrics;

/// Largest request body buffered for re-sending.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Re-issues requests against the deployment a client is pinned to.
#[derive(Debug, Clone)]
pub struct Rerouter {
    client: Client,
    template: OriginTemplate,
    bypass_password: Option<String>,
    verbose: bool,
}

impl Rerouter {
    pub fn new(
        config: &RerouteConfig,
        bypass_password: Option<String>,
        verbose: bool,
    ) -> Result<Self, RerouteError> {
        let template = OriginTemplate::new(config.origin_template.clone())?;
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(RerouteError::Client)?;

        Ok(Self {
            client,
            template,
            bypass_password: bypass_password.filter(|password| !password.is_empty()),
            verbose,
        })
    }

    pub fn template(&self) -> &OriginTemplate {
        &self.template
    }

    pub fn bypass_enabled(&self) -> bool {
        self.bypass_password.is_some()
    }

    /// Serve `request` from `deployment_id`'s origin.
    pub async fn reroute(
        &self,
        deployment_id: &str,
        request: Request<Body>,
        context: &DeploymentContext,
    ) -> Result<Response<Body>, RerouteError> {
        let start = Instant::now();
        let target = self
            .template
            .target_for(deployment_id, &context.site_name, request.uri())?;

        verbose!(self.verbose, deployment_id = %deployment_id, url = %target, "Re-routing request");

        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES).await?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        if let Some(password) = &self.bypass_password {
            let site_id = context
                .site_id
                .as_deref()
                .ok_or(RerouteError::MissingCredential)?;
            let session =
                bypass::obtain_session(&self.client, &target, site_id, password, self.verbose)
                    .await?;
            headers.remove(header::COOKIE);
            headers.insert(header::COOKIE, session);
        }

        let upstream = self
            .client
            .request(parts.method, target)
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(RerouteError::Fetch)?;

        metrics::record_reroute(upstream.status().as_u16(), start);

        Ok(into_response(upstream))
    }
}

fn into_response(upstream: reqwest::Response) -> Response<Body> {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
