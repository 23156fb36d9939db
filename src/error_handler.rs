//! Custom error handlers
//!
//! Allows applications to define how errors are converted into HTTP responses.
//! Every error response produced while serving a request (unknown route,
//! rejected extractor, handler `Err`, panic) passes through the handler set
//! with [`App::set_error_handler`](crate::App::set_error_handler).

use crate::{Error, Res};

/// Trait for converting errors into HTTP responses
///
/// Implement this trait to customize how your application handles errors.
///
/// # Example
///
/// ```rust,ignore
/// use lantern::prelude::*;
///
/// struct PlainPages;
///
/// impl ErrorHandler for PlainPages {
///     fn handle(&self, error: Error) -> Res {
///         Res::builder()
///             .status(error.status_code())
///             .html(format!("<h1>{}</h1>", status_text(error.status_code())))
///     }
/// }
///
/// let mut app = App::new();
/// app.set_error_handler(PlainPages);
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Convert an error into an HTTP response
    fn handle(&self, error: Error) -> Res;
}

/// Default error handler that provides plain text responses
#[derive(Debug, Clone, Copy)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, error: Error) -> Res {
        match error {
            Error::Status(code, Some(msg)) => Res::builder()
                .status(code)
                .text(format!("{} {}", code, msg)),
            Error::Status(code, None) => Res::builder()
                .status(code)
                .text(format!("{} {}", code, status_text(code))),
            other => Res::builder()
                .status(other.status_code())
                .text(other.to_string()),
        }
    }
}

/// JSON error handler that returns errors as JSON
#[derive(Debug, Clone, Copy)]
pub struct JsonErrorHandler;

impl ErrorHandler for JsonErrorHandler {
    fn handle(&self, error: Error) -> Res {
        let status_code = error.status_code();
        let message = match &error {
            Error::Status(_, Some(msg)) => msg.clone(),
            Error::Status(code, None) => status_text(*code),
            other => other.to_string(),
        };

        Res::builder().status(status_code).json(&serde_json::json!({
            "error": message,
            "status": status_code,
        }))
    }
}

/// Function-based error handler
pub struct FnErrorHandler<F>(pub F);

impl<F> ErrorHandler for FnErrorHandler<F>
where
    F: Fn(Error) -> Res + Send + Sync + 'static,
{
    fn handle(&self, error: Error) -> Res {
        (self.0)(error)
    }
}

/// Marker left on error responses so the app can re-render them through
/// its configured [`ErrorHandler`].
#[derive(Debug, Clone)]
pub(crate) struct Raised {
    pub(crate) code: u16,
    pub(crate) message: Option<String>,
}

impl Raised {
    pub(crate) fn from_error(error: &Error) -> Self {
        let message = match error {
            Error::Status(_, msg) => msg.clone(),
            other => Some(other.to_string()),
        };
        Self {
            code: error.status_code(),
            message,
        }
    }

    pub(crate) fn into_error(self) -> Error {
        Error::Status(self.code, self.message)
    }
}

/// Reason phrase for a status code.
pub fn status_text(code: u16) -> String {
    match code {
        400 => "Bad Request".to_string(),
        401 => "Unauthorized".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not Found".to_string(),
        405 => "Method Not Allowed".to_string(),
        413 => "Payload Too Large".to_string(),
        418 => "I'm a teapot".to_string(),
        422 => "Unprocessable Entity".to_string(),
        500 => "Internal Server Error".to_string(),
        502 => "Bad Gateway".to_string(),
        503 => "Service Unavailable".to_string(),
        _ => format!("HTTP {}", code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_handler_body() {
        let res = JsonErrorHandler.handle(Error::bad_request("say \"please\""));
        assert_eq!(res.status_code().as_u16(), 400);
        let body = res.into_body_bytes().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "say \"please\"");
        assert_eq!(value["status"], 400);
    }

    #[tokio::test]
    async fn test_default_handler_without_message() {
        let res = DefaultErrorHandler.handle(Error::status(418));
        assert_eq!(res.status_code().as_u16(), 418);
        let body = res.into_body_bytes().await.unwrap();
        assert_eq!(&body[..], b"418 I'm a teapot");
    }

    #[test]
    fn test_raised_round_trip() {
        let raised = Raised::from_error(&Error::Custom("db down".into()));
        assert_eq!(raised.code, 500);
        match raised.into_error() {
            Error::Status(500, Some(msg)) => assert_eq!(msg, "db down"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
