//! Typed views of a request, usable as handler arguments.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::upload::MultipartForm;
use crate::{Error, Req, Result, Session};

/// Values that can be built from a request before the handler runs.
#[async_trait]
pub trait FromRequest<S>: Sized {
    /// Extract the value, or fail with the error response to send.
    async fn from_request(req: &Req, state: &Arc<S>) -> Result<Self>;
}

/// Shared application state.
pub struct State<S>(pub Arc<S>);

impl<S> Deref for State<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> FromRequest<S> for State<S> {
    async fn from_request(_req: &Req, state: &Arc<S>) -> Result<Self> {
        Ok(State(Arc::clone(state)))
    }
}

/// Query string deserialized into `T`. Malformed input is a 400.
#[derive(Debug)]
pub struct Query<T>(pub T);

#[async_trait]
impl<S: Send + Sync + 'static, T: DeserializeOwned + Send + 'static> FromRequest<S> for Query<T> {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        req.query_as().map(Query)
    }
}

/// Urlencoded body deserialized into `T`. Malformed input is a 400.
#[derive(Debug)]
pub struct Form<T>(pub T);

#[async_trait]
impl<S: Send + Sync + 'static, T: DeserializeOwned + Send + 'static> FromRequest<S> for Form<T> {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        req.form().map(Form)
    }
}

/// JSON body deserialized into `T`.
#[derive(Debug)]
pub struct Json<T>(pub T);

#[async_trait]
impl<S: Send + Sync + 'static, T: DeserializeOwned + Send + 'static> FromRequest<S> for Json<T> {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        if !req.is_json() {
            return Err(Error::Status(
                415,
                Some("Expected request with `Content-Type: application/json`".into()),
            ));
        }
        req.json().map(Json)
    }
}

/// Path parameters deserialized into `T`.
///
/// A parameter that does not convert (`/goback/abc` into an integer)
/// means the URL does not name a resource, so the rejection is a 404.
#[derive(Debug)]
pub struct Path<T>(pub T);

#[async_trait]
impl<S: Send + Sync + 'static, T: DeserializeOwned + Send + 'static> FromRequest<S> for Path<T> {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(req.params())
            .map_err(|e| Error::internal(format!("Failed to encode path parameters: {}", e)))?;
        serde_urlencoded::from_str(&encoded)
            .map(Path)
            .map_err(|e| {
                tracing::debug!(path = req.path(), error = %e, "path parameters rejected");
                Error::not_found("The requested URL was not found on the server.")
            })
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> FromRequest<S> for Session {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        req.session()
    }
}

#[async_trait]
impl<S: Send + Sync + 'static> FromRequest<S> for MultipartForm {
    async fn from_request(req: &Req, _state: &Arc<S>) -> Result<Self> {
        req.multipart().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use hyper::Request;
    use std::collections::HashMap;

    #[derive(Debug, serde::Deserialize)]
    struct GoBack {
        year: i32,
    }

    fn req_with_params(params: &[(&str, &str)]) -> Req {
        let mut req = Req::new(Request::get("/").body(Bytes::new()).unwrap());
        req.set_path_params(
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        );
        req
    }

    #[tokio::test]
    async fn test_path_converts_integers() {
        let req = req_with_params(&[("year", "20")]);
        let Path(go_back) = Path::<GoBack>::from_request(&req, &Arc::new(()))
            .await
            .unwrap();
        assert_eq!(go_back.year, 20);
    }

    #[tokio::test]
    async fn test_path_rejection_is_not_found() {
        let req = req_with_params(&[("year", "abc")]);
        let err = Path::<GoBack>::from_request(&req, &Arc::new(()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_json_requires_content_type() {
        let req = Req::new(Request::post("/").body(Bytes::from_static(b"{}")).unwrap());
        let err = Json::<serde_json::Value>::from_request(&req, &Arc::new(()))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 415);
    }
}
