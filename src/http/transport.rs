//! The fetch-like collaborator the client sends requests through.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::request::{HttpRequest, HttpResponse};

/// Failures raised below the HTTP layer.
#[derive(Debug)]
pub enum TransportError {
    /// The server could not be reached
    Connect(String),
    /// The transport gave up waiting on its own
    Timeout,
    /// The request was abandoned through its cancellation token
    Cancelled,
    /// Anything else (TLS, protocol, body read errors)
    Other(String),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Connect(msg) => write!(f, "connection failed: {}", msg),
            TransportError::Timeout => write!(f, "transport timed out"),
            TransportError::Cancelled => write!(f, "transport cancelled"),
            TransportError::Other(msg) => write!(f, "transport error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the auth token, keep it out of error messages.
        let err = err.without_url();
        if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

/// Sends a request and returns its status and body. Implementations should
/// stop work and return [`TransportError::Cancelled`] once `cancel` fires.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(
        &self,
        request: HttpRequest,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a reqwest client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Received HTTP {} ({} bytes)", status, body.len());

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn call(
        &self,
        request: HttpRequest,
        cancel: CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = self.send(request) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::Method;

    #[tokio::test]
    async fn test_call_sends_method_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("POST", "/items")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_body(r#"{"name":"a"}"#)
            .with_status(201)
            .with_body(r#"{"id":1}"#)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let request = HttpRequest::new(
            Method::Post,
            format!("{}/items", url),
            Some(r#"{"name":"a"}"#.to_string()),
        );
        let response = transport
            .call(request, CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, HttpResponse::new(201, r#"{"id":1}"#));
    }

    #[tokio::test]
    async fn test_call_returns_error_statuses_as_responses() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let _m = server
            .mock("DELETE", "/items/1")
            .with_status(401)
            .create_async()
            .await;

        let transport = ReqwestTransport::new(Client::new());
        let request = HttpRequest::new(Method::Delete, format!("{}/items/1", url), None);
        let response = transport
            .call(request, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_call_connection_refused_is_connect_error() {
        let transport = ReqwestTransport::new(Client::new());
        let request = HttpRequest::new(Method::Get, "http://127.0.0.1:1/x?token=secret", None);
        let err = transport
            .call(request, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Connect(_)), "got {:?}", err);
        assert!(!err.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn test_call_honours_cancelled_token() {
        let transport = ReqwestTransport::new(Client::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = HttpRequest::new(Method::Get, "http://127.0.0.1:1/x", None);
        let err = transport.call(request, cancel).await.unwrap_err();

        assert!(matches!(err, TransportError::Cancelled));
    }
}
