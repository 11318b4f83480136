//! Entrypoint strategies.

use std::collections::HashSet;

use axum::http::{header, request::Parts};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decides whether a request is a first load that should (re)issue a pin.
pub trait EntrypointClassifier: Send + Sync + std::fmt::Debug {
    fn is_entrypoint(&self, request: &Parts) -> bool;
}

/// How entrypoints are recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierMode {
    /// Any HTML navigation is an entrypoint.
    Spa,
    /// Only the enumerated paths are entrypoints.
    #[default]
    Entrypoints,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier mode \"entrypoints\" requires at least one entrypoint")]
    MissingEntrypoints,

    #[error("classifier mode \"spa\" does not accept entrypoints (got {0})")]
    UnexpectedEntrypoints(usize),
}

/// Matches the request path against a fixed set, exactly.
#[derive(Debug, Clone)]
pub struct PathListClassifier {
    entrypoints: HashSet<String>,
}

impl PathListClassifier {
    pub fn new<I, S>(entrypoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entrypoints: entrypoints.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntrypointClassifier for PathListClassifier {
    fn is_entrypoint(&self, request: &Parts) -> bool {
        self.entrypoints.contains(request.uri.path())
    }
}

/// Treats any request negotiating `text/html` as a page load.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptHeaderClassifier;

impl EntrypointClassifier for AcceptHeaderClassifier {
    fn is_entrypoint(&self, request: &Parts) -> bool {
        request
            .headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.to_ascii_lowercase().contains("text/html"))
    }
}

/// Build the strategy for `mode`, refusing inconsistent pairings.
pub fn build_classifier(
    mode: ClassifierMode,
    entrypoints: &[String],
) -> Result<Box<dyn EntrypointClassifier>, ClassifierError> {
    match mode {
        ClassifierMode::Entrypoints if entrypoints.is_empty() => {
            Err(ClassifierError::MissingEntrypoints)
        }
        ClassifierMode::Entrypoints => Ok(Box::new(PathListClassifier::new(
            entrypoints.iter().cloned(),
        ))),
        ClassifierMode::Spa if !entrypoints.is_empty() => {
            Err(ClassifierError::UnexpectedEntrypoints(entrypoints.len()))
        }
        ClassifierMode::Spa => Ok(Box::new(AcceptHeaderClassifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn head(uri: &str, accept: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(accept) = accept {
            builder = builder.header("Accept", accept);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_path_list_exact_match() {
        let classifier = PathListClassifier::new(["/", "/manifest.json"]);

        assert!(classifier.is_entrypoint(&head("https://example.com/", None)));
        assert!(classifier.is_entrypoint(&head("https://example.com/manifest.json?v=2", None)));
        assert!(!classifier.is_entrypoint(&head("https://example.com/manifest.json/", None)));
        assert!(!classifier.is_entrypoint(&head("https://example.com/Manifest.json", None)));
        assert!(!classifier.is_entrypoint(&head("https://example.com/file.js", None)));
    }

    #[test]
    fn test_path_list_ignores_accept() {
        let classifier = PathListClassifier::new(["/index.html"]);
        assert!(!classifier.is_entrypoint(&head("/about", Some("text/html"))));
    }

    #[test]
    fn test_accept_header_sniff() {
        let classifier = AcceptHeaderClassifier;

        assert!(classifier.is_entrypoint(&head(
            "/any/route",
            Some("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        )));
        assert!(classifier.is_entrypoint(&head("/any/route", Some("TEXT/HTML"))));
        assert!(!classifier.is_entrypoint(&head("/app.js", Some("*/*"))));
        assert!(!classifier.is_entrypoint(&head("/api/data", Some("application/json"))));
        assert!(!classifier.is_entrypoint(&head("/", None)));
    }

    #[test]
    fn test_build_rejects_inconsistent_pairings() {
        assert_eq!(
            build_classifier(ClassifierMode::Entrypoints, &[]).unwrap_err(),
            ClassifierError::MissingEntrypoints
        );
        assert_eq!(
            build_classifier(ClassifierMode::Spa, &["/".to_string()]).unwrap_err(),
            ClassifierError::UnexpectedEntrypoints(1)
        );
        assert!(build_classifier(ClassifierMode::Spa, &[]).is_ok());
        assert!(build_classifier(ClassifierMode::Entrypoints, &["/".to_string()]).is_ok());
    }
}
