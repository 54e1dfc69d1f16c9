//! REST client for the `/api/documents` surface.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::errors::{StoreError, StoreResult};
use crate::record::{is_valid_id, DocumentDraft, DocumentRecord, DocumentSummary};
use crate::store::DocumentStore;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct HttpStore {
    base_url: String,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore").field("base_url", &self.base_url).finish()
    }
}

impl HttpStore {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:5000/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn document_path(id: &str) -> StoreResult<String> {
        if !is_valid_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(format!("/documents/{}", id))
    }

    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> StoreResult<(StatusCode, Bytes)> {
        let uri = format!("{}{}", self.base_url, path);
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(ACCEPT, "application/json");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| StoreError::Unavailable(format!("invalid request to {}: {}", uri, e)))?;

        let response = self.client.request(request).await.map_err(|e| {
            tracing::error!(%method, %uri, error = %e, "request failed");
            StoreError::Unavailable(format!("{} {}: {}", method, uri, e))
        })?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| StoreError::Unavailable(format!("reading response from {}: {}", uri, e)))?
            .to_bytes();

        tracing::debug!(%method, %uri, status = status.as_u16(), "response");
        Ok((status, bytes))
    }

    /// Run a request and decode a successful JSON body
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        id: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> StoreResult<T> {
        let (status, bytes) = self.send(method, path, body).await?;
        check_status(status, &bytes, id)?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }
}

fn check_status(status: StatusCode, bytes: &[u8], id: Option<&str>) -> StoreResult<()> {
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(id.unwrap_or_default().to_string()));
    }

    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .map(|body| body.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

fn encode(draft: &DocumentDraft) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(draft).map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn create(&self, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let body = encode(&draft)?;
        self.call(Method::POST, "/documents", None, Some(body)).await
    }

    async fn read(&self, id: &str) -> StoreResult<DocumentRecord> {
        let path = Self::document_path(id)?;
        self.call(Method::GET, &path, Some(id), None).await
    }

    async fn update(&self, id: &str, draft: DocumentDraft) -> StoreResult<DocumentRecord> {
        let path = Self::document_path(id)?;
        let body = encode(&draft)?;
        self.call(Method::PUT, &path, Some(id), Some(body)).await
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let path = Self::document_path(id)?;
        let (status, bytes) = self.send(Method::DELETE, &path, None).await?;
        check_status(status, &bytes, Some(id))
    }

    async fn list(&self) -> StoreResult<Vec<DocumentSummary>> {
        self.call(Method::GET, "/documents", None, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_becomes_rejected() {
        let err = check_status(StatusCode::BAD_REQUEST, br#"{"message":"title too long"}"#, None).unwrap_err();
        match err {
            StoreError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "title too long");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_error_kept() {
        let err = check_status(StatusCode::BAD_GATEWAY, b"upstream down", None).unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 502, ref message } if message == "upstream down"));
    }

    #[test]
    fn test_not_found_carries_id() {
        let err = check_status(StatusCode::NOT_FOUND, b"{}", Some("abc")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "abc"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        assert_eq!(HttpStore::new("http://localhost:5000/api/").base_url(), "http://localhost:5000/api");
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let store = HttpStore::new(format!("http://127.0.0.1:{}/api", port));
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)), "got {:?}", err);
    }
}
