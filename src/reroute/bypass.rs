//! Basic-auth gate bypass.
//!
//! Password-protected sites accept a form POST carrying the password and
//! answer with a session cookie named after the site id. That cookie then
//! stands in for the client's own cookies on the proxied request.

use axum::http::{header, HeaderMap, HeaderValue};
use reqwest::Client;
use url::Url;

use super::RerouteError;

/// Exchange `password` for the site's session cookie.
///
/// Returns the `Cookie` header value to send on the proxied request.
pub async fn obtain_session(
    client: &Client,
    target: &Url,
    site_id: &str,
    password: &str,
    verbose: bool,
) -> Result<HeaderValue, RerouteError> {
    verbose!(verbose, url = %target, "Requesting basic auth session");

    let response = client
        .post(target.clone())
        .form(&[("form-name", "form 1"), ("password", password)])
        .send()
        .await
        .map_err(RerouteError::Fetch)?;

    verbose!(verbose, status = %response.status(), "Basic auth session response");

    let Some(session) = extract_session_cookie(response.headers(), site_id) else {
        verbose!(verbose, site_id = %site_id, "No session cookie in response");
        return Err(RerouteError::MissingCredential);
    };

    HeaderValue::from_str(&format!("{site_id}={session}"))
        .map_err(|_| RerouteError::MissingCredential)
}

/// Find `<site_id>=<value>` among the `Set-Cookie` headers.
///
/// Only the first `;`-delimited segment of each header is considered; the
/// first header carrying a non-empty value for `site_id` wins.
pub fn extract_session_cookie(headers: &HeaderMap, site_id: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let first = cookie.split(';').next()?;
            let (name, value) = first.split_once('=')?;
            (name.trim() == site_id && !value.trim().is_empty()).then(|| value.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_cookies(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(header::SET_COOKIE, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_extract_first_header() {
        let headers = set_cookies(&["site-id=jwt.value.here; Path=/; HttpOnly"]);
        assert_eq!(extract_session_cookie(&headers, "site-id").as_deref(), Some("jwt.value.here"));
    }

    #[test]
    fn test_extract_scans_later_headers() {
        let headers = set_cookies(&["other=1; Path=/", "site-id=jwt; Secure"]);
        assert_eq!(extract_session_cookie(&headers, "site-id").as_deref(), Some("jwt"));
    }

    #[test]
    fn test_extract_requires_exact_name_and_value() {
        let headers = set_cookies(&["site-id-2=jwt", "site-id=; Path=/", "x=1; site-id=jwt"]);
        assert_eq!(extract_session_cookie(&headers, "site-id"), None);
        assert_eq!(extract_session_cookie(&HeaderMap::new(), "site-id"), None);
    }
}
