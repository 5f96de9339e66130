//! Network fetch abstraction for the shell worker.

use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use crate::error::{Error, Result};
use crate::http::{Method, Request, Response, ResponseKind};

/// Abstraction over live network exchanges for testability.
///
/// The shell worker issues every network request through this trait; the
/// default implementation is [`ReqwestFetcher`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a live network exchange for the given request.
    ///
    /// # Errors
    ///
    /// Returns an error when the exchange could not complete at all
    /// (offline, DNS failure, timeout). A completed exchange with a bad
    /// status is a successful fetch carrying that status.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Default fetcher backed by `reqwest`.
///
/// Relative request paths are resolved against the configured origin, and
/// the origin is also what decides whether a captured response is basic,
/// CORS-approved or opaque.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    origin: Url,
}

impl ReqwestFetcher {
    /// Creates a fetcher resolving relative paths against `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if `origin` is not a valid absolute URL.
    pub fn new(origin: &str) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            origin: Url::parse(origin)?,
        })
    }

    /// Creates a fetcher with a caller-supplied `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns an error if `origin` is not a valid absolute URL.
    pub fn with_client(client: reqwest::Client, origin: &str) -> Result<Self> {
        Ok(Self {
            client,
            origin: Url::parse(origin)?,
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        Ok(self.origin.join(url)?)
    }
}

const fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// Classifies a completed response against the fetcher's origin.
///
/// Same-origin responses are basic; cross-origin responses are CORS if the
/// server approved the read, otherwise opaque.
fn classify(origin: &Url, response_url: &Url, cors_approved: bool) -> ResponseKind {
    let same_origin = origin.scheme() == response_url.scheme()
        && origin.host_str() == response_url.host_str()
        && origin.port_or_known_default() == response_url.port_or_known_default();
    if same_origin {
        ResponseKind::Basic
    } else if cors_approved {
        ResponseKind::Cors
    } else {
        ResponseKind::Opaque
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let url = self.resolve(&request.url)?;

        let mut builder = self.client.request(to_reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            // Transport-level failures are what the worker recovers from
            // via cache or the offline page.
            Error::Network(format!("{} {}: {e}", request.method, request.url))
        })?;

        let status = response.status().as_u16();
        let response_url = response.url().clone();
        let cors_approved = response.headers().contains_key("access-control-allow-origin");

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response.bytes().await?;

        Ok(Response {
            status,
            kind: classify(&self.origin, &response_url, cors_approved),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://kukaya.app").unwrap()
    }

    #[test]
    fn same_origin_is_basic() {
        let response_url = Url::parse("https://kukaya.app/static/js/app.js").unwrap();
        assert_eq!(
            classify(&origin(), &response_url, false),
            ResponseKind::Basic
        );
    }

    #[test]
    fn same_host_different_scheme_is_cross_origin() {
        let response_url = Url::parse("http://kukaya.app/static/js/app.js").unwrap();
        assert_eq!(
            classify(&origin(), &response_url, false),
            ResponseKind::Opaque
        );
    }

    #[test]
    fn cross_origin_with_cors_header_is_cors() {
        let response_url = Url::parse("https://cdn.example.com/lib.js").unwrap();
        assert_eq!(classify(&origin(), &response_url, true), ResponseKind::Cors);
    }

    #[test]
    fn cross_origin_without_cors_header_is_opaque() {
        let response_url = Url::parse("https://cdn.example.com/lib.js").unwrap();
        assert_eq!(
            classify(&origin(), &response_url, false),
            ResponseKind::Opaque
        );
    }

    #[test]
    fn default_port_matches_explicit_port() {
        let response_url = Url::parse("https://kukaya.app:443/").unwrap();
        assert_eq!(
            classify(&origin(), &response_url, false),
            ResponseKind::Basic
        );
    }

    #[test]
    fn relative_paths_resolve_against_origin() {
        let fetcher = ReqwestFetcher::new("https://kukaya.app").unwrap();
        let url = fetcher.resolve("/offline.html").unwrap();
        assert_eq!(url.as_str(), "https://kukaya.app/offline.html");

        let absolute = fetcher.resolve("https://cdn.example.com/lib.js").unwrap();
        assert_eq!(absolute.as_str(), "https://cdn.example.com/lib.js");
    }

    #[test]
    fn invalid_origin_is_rejected() {
        assert!(ReqwestFetcher::new("not a url").is_err());
    }
}
