//! HTTP response.

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, Full, StreamBody as HttpStreamBody};
use hyper::body::Frame;
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use std::path::{Component, Path};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::{Cookie, Error, IntoRes, Result};

/// Boxed body type for responses.
pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, Error>;

static CONTENT_TYPE_TEXT: header::HeaderValue =
    header::HeaderValue::from_static("text/plain; charset=utf-8");
static CONTENT_TYPE_HTML: header::HeaderValue =
    header::HeaderValue::from_static("text/html; charset=utf-8");
static CONTENT_TYPE_XML: header::HeaderValue =
    header::HeaderValue::from_static("application/xml");
static CONTENT_TYPE_JSON: header::HeaderValue =
    header::HeaderValue::from_static("application/json");

fn full(bytes: impl Into<Bytes>) -> BoxBody {
    Full::new(bytes.into()).map_err(|e| match e {}).boxed()
}

/// HTTP response.
pub struct Res {
    inner: Response<BoxBody>,
}

impl Res {
    /// Create empty 200 response.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: Response::new(full(Bytes::new())),
        }
    }

    /// Unwrap to hyper response.
    #[inline]
    pub fn into_hyper(self) -> Response<BoxBody> {
        self.inner
    }

    fn with_type(body: impl Into<Bytes>, content_type: &header::HeaderValue) -> Self {
        let mut res = Response::new(full(body));
        res.headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
        Self { inner: res }
    }

    /// Text response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::with_type(body.into(), &CONTENT_TYPE_TEXT)
    }

    /// HTML response.
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_type(body.into(), &CONTENT_TYPE_HTML)
    }

    /// XML response.
    pub fn xml(body: impl Into<String>) -> Self {
        Self::with_type(body.into(), &CONTENT_TYPE_XML)
    }

    /// JSON response (serializes to Vec<u8> directly).
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => Self::with_type(bytes, &CONTENT_TYPE_JSON),
            Err(e) => Error::internal(format!("JSON serialization failed: {}", e)).into_res(),
        }
    }

    /// Status-only response.
    pub fn status(code: u16) -> Self {
        let mut res = Response::new(full(Bytes::new()));
        *res.status_mut() = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { inner: res }
    }

    /// 302 redirect to `location`.
    pub fn redirect(location: impl AsRef<str>) -> Self {
        let location = location.as_ref();
        let body = format!(
            "<!doctype html>\n<title>Redirecting...</title>\n<h1>Redirecting...</h1>\n\
             <p>You should be redirected automatically to the target URL: \
             <a href=\"{0}\">{0}</a>.</p>\n",
            crate::escape(location)
        );
        Res::builder()
            .status(302)
            .header(header::LOCATION.as_str(), location)
            .html(body)
    }

    /// Stream file from disk. Returns 404 if not found.
    ///
    /// ```rust,no_run
    /// # async fn f() {
    /// lantern::Res::file("index.html").await.header("content-type", "text/html");
    /// # }
    /// ```
    pub async fn file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        let file = match File::open(path).await {
            Ok(f) => f,
            Err(_) => {
                tracing::debug!(path = %path.display(), "file not found");
                return Error::not_found("File not found").into_res();
            }
        };

        let reader_stream = ReaderStream::new(file);
        let stream_body =
            HttpStreamBody::new(reader_stream.map_ok(Frame::data).map_err(Error::from));

        Self {
            inner: Response::new(stream_body.boxed()),
        }
    }

    /// Serve `filename` from inside `dir`, guessing its content type.
    ///
    /// Names that would escape `dir` (absolute paths, `..`) are answered
    /// with 404.
    pub async fn from_directory(dir: impl AsRef<Path>, filename: &str) -> Self {
        let relative = Path::new(filename);
        let contained = !filename.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            tracing::warn!(filename, "rejected file path outside of serving directory");
            return Error::not_found("File not found").into_res();
        }

        let path = dir.as_ref().join(relative);
        let mime = mime_guess::from_path(&path).first_or_octet_stream();
        let res = Self::file(&path).await;
        if res.status_code().is_success() {
            res.header(header::CONTENT_TYPE.as_str(), mime.as_ref())
        } else {
            res
        }
    }

    /// Create builder.
    pub fn builder() -> ResBuilder {
        ResBuilder::new()
    }

    /// Get status code.
    pub fn status_code(&self) -> StatusCode {
        self.inner.status()
    }

    /// Get mutable status code.
    #[inline]
    pub fn status_mut(&mut self) -> &mut StatusCode {
        self.inner.status_mut()
    }

    /// Add header.
    #[inline]
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_ref().as_bytes()),
            header::HeaderValue::from_str(value.as_ref()),
        ) {
            self.inner.headers_mut().insert(name, value);
        }
        self
    }

    /// Append a `Set-Cookie` header.
    pub fn set_cookie(mut self, cookie: Cookie) -> Self {
        self.add_cookie(&cookie);
        self
    }

    /// Append a `Set-Cookie` header that deletes `name`.
    pub fn remove_cookie(self, name: &str) -> Self {
        self.set_cookie(Cookie::removal(name))
    }

    pub(crate) fn add_cookie(&mut self, cookie: &Cookie) {
        if let Ok(value) = header::HeaderValue::from_str(&cookie.to_header_value()) {
            self.inner.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    /// Get mutable headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut header::HeaderMap {
        self.inner.headers_mut()
    }

    /// Get headers.
    #[inline]
    pub fn headers(&self) -> &header::HeaderMap {
        self.inner.headers()
    }

    pub(crate) fn extensions_mut(&mut self) -> &mut hyper::http::Extensions {
        self.inner.extensions_mut()
    }

    /// Collect the whole body. Mostly useful in tests.
    pub async fn into_body_bytes(self) -> Result<Bytes> {
        Ok(self.inner.into_body().collect().await?.to_bytes())
    }

    /// Collect the body as UTF-8 text.
    pub async fn into_text(self) -> Result<String> {
        let bytes = self.into_body_bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Custom(e.to_string()))
    }
}

impl Default for Res {
    fn default() -> Self {
        Self::new()
    }
}

/// Response builder with pre-allocated headers.
pub struct ResBuilder {
    status: StatusCode,
    headers: header::HeaderMap,
}

impl ResBuilder {
    /// Create builder.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: header::HeaderMap::with_capacity(4),
        }
    }

    /// Set status code.
    pub fn status(mut self, code: u16) -> Self {
        self.status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self
    }

    /// Add header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            header::HeaderName::from_bytes(name.as_ref().as_bytes()),
            header::HeaderValue::from_str(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    fn finish(mut self, body: impl Into<Bytes>, default_type: &header::HeaderValue) -> Res {
        let mut res = Response::new(full(body));
        *res.status_mut() = self.status;

        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers
                .insert(header::CONTENT_TYPE, default_type.clone());
        }

        *res.headers_mut() = self.headers;
        Res { inner: res }
    }

    /// Build text response.
    pub fn text(self, body: impl Into<String>) -> Res {
        self.finish(body.into(), &CONTENT_TYPE_TEXT)
    }

    /// Build HTML response.
    pub fn html(self, body: impl Into<String>) -> Res {
        self.finish(body.into(), &CONTENT_TYPE_HTML)
    }

    /// Build JSON response.
    pub fn json<T: Serialize>(self, value: &T) -> Res {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.finish(bytes, &CONTENT_TYPE_JSON),
            Err(_) => Res::builder().status(500).text("Failed to serialize JSON"),
        }
    }

    /// Build with custom body.
    pub fn body(self, bytes: impl Into<Bytes>) -> Res {
        let mut res = Response::new(full(bytes));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        Res { inner: res }
    }
}

impl Default for ResBuilder {
    fn default() -> Self {
        Self::new()
    }
}
