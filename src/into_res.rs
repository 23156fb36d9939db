//! Convert types into HTTP responses
//!
//! The [`IntoRes`] trait allows handlers to return various types
//! that are automatically converted to HTTP responses.

use crate::error_handler::{DefaultErrorHandler, ErrorHandler, Raised};
use crate::{Error, Res};

/// Types that can become HTTP responses
pub trait IntoRes {
    /// Convert into response
    fn into_res(self) -> Res;
}

impl IntoRes for Res {
    fn into_res(self) -> Res {
        self
    }
}

impl IntoRes for String {
    fn into_res(self) -> Res {
        Res::html(self)
    }
}

impl IntoRes for &'static str {
    fn into_res(self) -> Res {
        Res::html(self)
    }
}

impl IntoRes for () {
    fn into_res(self) -> Res {
        Res::status(204) // No Content
    }
}

/// `(400, "Invalid file type.")` style responses.
impl<T: IntoRes> IntoRes for (u16, T) {
    fn into_res(self) -> Res {
        let (code, inner) = self;
        let mut res = inner.into_res();
        if let Ok(status) = hyper::StatusCode::from_u16(code) {
            *res.status_mut() = status;
        }
        res
    }
}

impl<T: IntoRes> IntoRes for Result<T, Error> {
    fn into_res(self) -> Res {
        match self {
            Ok(value) => value.into_res(),
            Err(err) => err.into_res(),
        }
    }
}

impl IntoRes for Error {
    fn into_res(self) -> Res {
        // The app swaps this for its own error handler's output.
        let raised = Raised::from_error(&self);
        tracing::debug!(status = raised.code, error = %self, "request failed");
        let mut res = DefaultErrorHandler.handle(self);
        res.extensions_mut().insert(raised);
        res
    }
}

/// Wrapper for HTML responses
pub struct Html(pub String);

impl IntoRes for Html {
    fn into_res(self) -> Res {
        Res::html(self.0)
    }
}

/// Escape text for inclusion in HTML.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
