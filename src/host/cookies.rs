//! Cookie access for the engine.
//!
//! # Responsibilities
//! - Expose request cookies by name
//! - Collect cookie writes and deletions for the outgoing response
//! - Render `Set-Cookie` values (IMF-fixdate expiry)
//!
//! # Design Decisions
//! - Reads only see cookies sent by the client, never pending writes
//! - A later write for the same name supersedes an earlier one

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::DateTime;

/// Cookie get/set/delete, as offered by the host runtime.
pub trait CookieJar: Send {
    /// Value of a cookie sent with the request.
    fn get(&self, name: &str) -> Option<String>;

    /// Queue a cookie on the response.
    fn set(&mut self, cookie: CookieDescriptor);

    /// Queue a deletion of `name` scoped to `path`.
    fn delete(&mut self, name: &str, path: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// A cookie to be written on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDescriptor {
    pub name: String,
    pub value: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
    /// Absolute expiry, epoch milliseconds.
    pub expires_at_ms: Option<u64>,
}

impl CookieDescriptor {
    /// Render as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);

        if let Some(expires) = self.expires_at_ms.and_then(http_date) {
            out.push_str("; Expires=");
            out.push_str(&expires);
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

fn http_date(epoch_ms: u64) -> Option<String> {
    let at = DateTime::from_timestamp_millis(i64::try_from(epoch_ms).ok()?)?;
    Some(at.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

fn deletion_header_value(name: &str, path: &str) -> String {
    format!("{name}=; Path={path}; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0")
}

/// Parse every `Cookie` header into name/value pairs. The first occurrence
/// of a name wins.
pub fn parse_cookie_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else { continue };
        for pair in value.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                cookies
                    .entry(name.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
        }
    }
    cookies
}

/// Cookie jar bound to one HTTP request/response pair.
#[derive(Debug, Default)]
pub struct RequestCookies {
    incoming: HashMap<String, String>,
    pending: Vec<(String, String)>,
}

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            incoming: parse_cookie_headers(headers),
            pending: Vec::new(),
        }
    }

    fn queue(&mut self, name: &str, header_value: String) {
        self.pending.retain(|(pending, _)| pending != name);
        self.pending.push((name.to_string(), header_value));
    }

    /// Append queued `Set-Cookie` headers to a response.
    pub fn apply(self, headers: &mut HeaderMap) {
        for (name, value) in self.pending {
            match HeaderValue::from_str(&value) {
                Ok(value) => {
                    headers.append(header::SET_COOKIE, value);
                }
                Err(e) => {
                    tracing::warn!(cookie = %name, error = %e, "Dropping unencodable Set-Cookie header");
                }
            }
        }
    }
}

impl CookieJar for RequestCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn set(&mut self, cookie: CookieDescriptor) {
        let value = cookie.to_header_value();
        self.queue(&cookie.name, value);
    }

    fn delete(&mut self, name: &str, path: &str) {
        self.queue(name, deletion_header_value(name, path));
    }
}

/// In-memory jar recording every mutation.
#[derive(Debug, Default, Clone)]
pub struct MemoryCookieJar {
    pub incoming: HashMap<String, String>,
    pub set: Vec<CookieDescriptor>,
    pub deleted: Vec<String>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.incoming.insert(name.into(), value.into());
        self
    }

    /// True when nothing was set or deleted.
    pub fn is_untouched(&self) -> bool {
        self.set.is_empty() && self.deleted.is_empty()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.incoming.get(name).cloned()
    }

    fn set(&mut self, cookie: CookieDescriptor) {
        self.set.push(cookie);
    }

    fn delete(&mut self, name: &str, _path: &str) {
        self.deleted.push(name.to_string());
    }
}
