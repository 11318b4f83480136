//! Sibling deployment addressing.

use axum::http::Uri;
use url::Url;

use super::RerouteError;

const DEPLOYMENT_ID: &str = "{deployment_id}";
const SITE_NAME: &str = "{site_name}";

/// Hosting platform rule mapping a deployment to its own origin.
///
/// Placeholders: `{deployment_id}` and `{site_name}`.
#[derive(Debug, Clone)]
pub struct OriginTemplate {
    template: String,
}

impl OriginTemplate {
    /// Netlify's per-deploy permalink.
    pub const NETLIFY: &'static str = "https://{deployment_id}--{site_name}.netlify.app";

    pub fn new(template: impl Into<String>) -> Result<Self, RerouteError> {
        let template = Self {
            template: template.into(),
        };
        template.origin_for("deploy", "site").map_err(|e| RerouteError::Template {
            template: template.template.clone(),
            reason: e.to_string(),
        })?;
        Ok(template)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Origin URL of `deployment_id`.
    pub fn origin_for(&self, deployment_id: &str, site_name: &str) -> Result<Url, RerouteError> {
        let rendered = self
            .template
            .replace(DEPLOYMENT_ID, deployment_id)
            .replace(SITE_NAME, site_name);
        let url = Url::parse(&rendered)?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(RerouteError::Template {
                template: self.template.clone(),
                reason: "origin must be an http(s) URL with a host".into(),
            });
        }
        Ok(url)
    }

    /// The inbound URL re-homed onto `deployment_id`'s origin.
    pub fn target_for(
        &self,
        deployment_id: &str,
        site_name: &str,
        uri: &Uri,
    ) -> Result<Url, RerouteError> {
        let mut target = self.origin_for(deployment_id, site_name)?;
        target.set_path(uri.path());
        target.set_query(uri.query());
        Ok(target)
    }
}

impl Default for OriginTemplate {
    fn default() -> Self {
        Self {
            template: Self::NETLIFY.to_string(),
        }
    }
}
