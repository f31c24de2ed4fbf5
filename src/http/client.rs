//! Request client: URL building, the timeout race and response classification.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::endpoint::build_url;
use super::request::{HttpRequest, HttpResponse, Method};
use super::response::{classify, decode_and_validate};
use super::transport::{ReqwestTransport, Transport};
use crate::config::ClientConfig;
use crate::error::{RequestError, Result};
use crate::schema::{JsonSchemaValidator, SchemaValidator};

/// Per-call settings. Everything is optional.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    params: BTreeMap<String, String>,
    schema: Option<Value>,
    timeout: Option<Duration>,
    cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter. Parameters are sent sorted by key.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Validates the decoded body against `schema` before resolving.
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Overrides the client's default timeout for this call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Abandons the call with [`RequestError::Cancelled`] once `token` fires.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// HTTP request helper bound to one [`ClientConfig`].
///
/// Relative paths are joined onto the configured root URL and carry the
/// configured token. Cloning is cheap; clones share the transport and the
/// schema cache.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    validator: Arc<dyn SchemaValidator>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client sending through reqwest and validating with JSON Schema.
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_parts(
            config,
            Arc::new(ReqwestTransport::new(http)),
            Arc::new(JsonSchemaValidator::new()),
        ))
    }

    /// Creates a client from explicit collaborators.
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        validator: Arc<dyn SchemaValidator>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            validator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The URL a relative request for `path` is sent to.
    pub fn url_for(&self, path: &str, params: &BTreeMap<String, String>) -> String {
        build_url(&self.config.root_url, path, params, &self.config.token)
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.send(Method::Get, path, None, options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn post<B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.send(Method::Post, path, Some(body), options).await
    }

    #[tracing::instrument(skip(self, body, options))]
    pub async fn put<B>(&self, path: &str, body: &B, options: RequestOptions) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = encode(body)?;
        self.send(Method::Put, path, Some(body), options).await
    }

    #[tracing::instrument(skip(self, options))]
    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<Value> {
        self.send(Method::Delete, path, None, options).await
    }

    /// POSTs to an absolute URL. No token or params are appended and the
    /// status code is not inspected: whatever JSON comes back resolves.
    #[tracing::instrument(skip(self, body, options))]
    pub async fn post_to_url<B>(&self, url: &str, body: &B, options: RequestOptions) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        debug!("POST {}...", url);

        let request = HttpRequest::new(Method::Post, url, Some(encode(body)?));
        let response = self.race(request, &options).await?;

        decode_and_validate(&response.body, options.schema.as_ref(), self.validator.as_ref())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<Value> {
        debug!("{} {} with params {:?}...", method, path, options.params);

        let request = HttpRequest::new(method, self.url_for(path, &options.params), body);
        let response = self.race(request, &options).await?;

        classify(response, options.schema.as_ref(), self.validator.as_ref())
    }

    /// Races the transport against the timeout. Whichever side loses is
    /// dropped, and the transport's token is cancelled on the way out.
    async fn race(&self, request: HttpRequest, options: &RequestOptions) -> Result<HttpResponse> {
        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let cancel = match &options.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        let _abandon = cancel.clone().drop_guard();

        tokio::select! {
            result = self.transport.call(request, cancel.clone()) => {
                result.map_err(|e| {
                    debug!("Transport failed: {}", e);
                    RequestError::from(e)
                })
            }
            _ = tokio::time::sleep(timeout) => {
                warn!("Request timed out after {}ms", timeout.as_millis());
                Err(RequestError::Timeout)
            }
            _ = cancel.cancelled() => {
                debug!("Request cancelled by caller");
                Err(RequestError::Cancelled)
            }
        }
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<String> {
    serde_json::to_string(body).map_err(|e| RequestError::Encode(e.to_string()))
}
