//! Request/response model shared by the shell worker and its backends.
//!
//! The worker routes on a deliberately small surface: method, URL and
//! navigation mode on the way in; status, headers and visibility class on
//! the way out. Everything else about the exchange belongs to the backend.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Returns true for the only method the shell worker intercepts.
    #[must_use]
    pub const fn is_get(self) -> bool {
        matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        };
        f.write_str(name)
    }
}

/// How a request reached the shell worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// An ordinary subresource load (script, style, data call).
    #[default]
    Subresource,
    /// A top-level navigation. Only navigations are eligible for the
    /// offline fallback page.
    Navigation,
}

/// A request intercepted by the shell worker.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Target URL, absolute or a path relative to the configured origin.
    pub url: String,
    /// Navigation vs. subresource.
    pub mode: RequestMode,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body, empty for GETs.
    pub body: Bytes,
}

impl Request {
    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            mode: RequestMode::Subresource,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a plain GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Creates a top-level navigation request.
    #[must_use]
    pub fn navigation(url: impl Into<String>) -> Self {
        let mut request = Self::new(Method::Get, url);
        request.mode = RequestMode::Navigation;
        request
    }

    /// Returns true if this request is a top-level navigation.
    #[must_use]
    pub const fn is_navigation(&self) -> bool {
        matches!(self.mode, RequestMode::Navigation)
    }
}

/// Visibility class of a captured response.
///
/// Opaque responses come from cross-origin fetches whose contents the
/// capturing code cannot inspect; they are never written into a cache
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Same-origin response, fully visible.
    Basic,
    /// Cross-origin response served with CORS approval.
    Cors,
    /// Cross-origin response with no CORS approval.
    Opaque,
}

/// A response captured from the network or replayed from a generation.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Visibility class.
    pub kind: ResponseKind,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

impl Response {
    /// Creates a same-origin response with the given status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            kind: ResponseKind::Basic,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Sets the visibility class.
    #[must_use]
    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn ok(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Whether this response may be written into a cache generation.
    ///
    /// Only a plain 200 with a non-opaque body qualifies; everything else
    /// is simply not stored, which is not an error.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        self.status == 200 && !matches!(self.kind, ResponseKind::Opaque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Options.to_string(), "OPTIONS");
    }

    #[test]
    fn only_get_is_interceptable() {
        assert!(Method::Get.is_get());
        assert!(!Method::Head.is_get());
        assert!(!Method::Post.is_get());
        assert!(!Method::Delete.is_get());
    }

    #[test]
    fn navigation_constructor_sets_mode() {
        let request = Request::navigation("/rooms");
        assert!(request.is_navigation());
        assert_eq!(request.method, Method::Get);

        let request = Request::get("/rooms");
        assert!(!request.is_navigation());
    }

    #[test]
    fn cacheable_requires_200_and_visible_body() {
        assert!(Response::new(200, "ok").is_cacheable());
        assert!(
            Response::new(200, "ok")
                .with_kind(ResponseKind::Cors)
                .is_cacheable()
        );
        assert!(
            !Response::new(200, "ok")
                .with_kind(ResponseKind::Opaque)
                .is_cacheable()
        );
        assert!(!Response::new(404, "missing").is_cacheable());
        assert!(!Response::new(301, "").is_cacheable());
        // 204 is a success but not a storable shell asset
        assert!(Response::new(204, "").ok());
        assert!(!Response::new(204, "").is_cacheable());
    }
}
