//! Per-request deployment metadata supplied by the host.

use serde::{Deserialize, Serialize};

/// Identity of the deployment currently serving a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentContext {
    /// Current deployment id; `None` in local development.
    pub deployment_id: Option<String>,

    /// Whether this deployment is the published one.
    pub is_published: bool,

    /// Site name, used to derive sibling deployment hostnames.
    pub site_name: String,

    /// Site id, used as the session cookie name by the basic-auth gate.
    pub site_id: Option<String>,
}

impl DeploymentContext {
    /// Context for a published deployment.
    pub fn published(deployment_id: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self {
            deployment_id: Some(deployment_id.into()),
            is_published: true,
            site_name: site_name.into(),
            site_id: None,
        }
    }

    pub fn with_site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = Some(site_id.into());
        self
    }

    /// The deployment id, if skew protection applies to this deployment.
    pub fn active_deployment(&self) -> Option<&str> {
        match self.deployment_id.as_deref() {
            Some(id) if self.is_published && !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_deployment() {
        assert_eq!(DeploymentContext::published("d1", "site").active_deployment(), Some("d1"));

        let mut draft = DeploymentContext::published("d1", "site");
        draft.is_published = false;
        assert_eq!(draft.active_deployment(), None);

        assert_eq!(DeploymentContext::published("", "site").active_deployment(), None);
        assert_eq!(DeploymentContext::default().active_deployment(), None);
    }
}
