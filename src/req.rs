//! HTTP request wrapper
//!
//! [`Req`] provides ergonomic access to request data including
//! headers, path parameters, query strings, cookies and the buffered body.

use bytes::Bytes;
use hyper::http::request::Parts;
use hyper::{Method, Request, Uri, header};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::upload::MultipartForm;
use crate::{Error, Extensions, Result, Session};

/// HTTP request
///
/// The body has already been read (up to the app's size limit) when a
/// handler sees the request, so every accessor is synchronous except
/// multipart parsing.
pub struct Req {
    parts: Parts,
    body: Bytes,
    path_params: HashMap<String, String>,
    extensions: Extensions,
}

impl Req {
    /// Create from a request with a buffered body
    pub fn new(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body,
            path_params: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Path plus query string, always with the `?` separator.
    pub fn full_path(&self) -> String {
        format!("{}?{}", self.path(), self.query().unwrap_or(""))
    }

    /// First value of a query parameter, percent-decoded
    pub fn query_value(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Deserialize the whole query string
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_urlencoded::from_str(self.query().unwrap_or(""))?)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get all headers
    pub fn headers(&self) -> &header::HeaderMap {
        &self.parts.headers
    }

    /// Set path parameters (used internally by router)
    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }

    /// Get a path parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(|s| s.as_str())
    }

    /// Get all path parameters
    pub fn params(&self) -> &HashMap<String, String> {
        &self.path_params
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parse an `application/x-www-form-urlencoded` body
    pub fn form<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_urlencoded::from_bytes(&self.body)?)
    }

    /// First value of a urlencoded body field
    pub fn form_value(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(&self.body)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// Parse a `multipart/form-data` body
    pub async fn multipart(&self) -> Result<MultipartForm> {
        MultipartForm::parse(self.content_type(), self.body.clone()).await
    }

    /// Get the content type
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Check if the request expects JSON
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false)
    }

    /// Check if the body is multipart form data
    pub fn is_multipart(&self) -> bool {
        self.content_type()
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false)
    }

    /// All cookies sent with the request
    pub fn cookies(&self) -> HashMap<String, String> {
        self.parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| crate::cookie::parse_cookie_header(v).into_iter())
            .collect()
    }

    /// A single cookie value
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().remove(name)
    }

    /// The `Referer` header, if any
    pub fn referrer(&self) -> Option<&str> {
        self.header(header::REFERER.as_str())
    }

    /// Scheme and authority of this app as seen by the client, with a
    /// trailing slash (`http://example.com/`).
    pub fn host_url(&self) -> String {
        let host = self
            .header(header::HOST.as_str())
            .or_else(|| self.parts.uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let scheme = self.parts.uri.scheme_str().unwrap_or("http");
        format!("{}://{}/", scheme, host)
    }

    /// Request-scoped values
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Mutable request-scoped values
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// The session attached by [`SessionLayer`](crate::SessionLayer)
    pub fn session(&self) -> Result<Session> {
        self.extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| Error::internal("Session layer not installed"))
    }
}
