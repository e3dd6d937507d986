//! Transport backed by the official Elasticsearch client.

use std::fmt::{Debug, Display};
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::response::Response;
use elasticsearch::http::Url;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::{CountParts, Elasticsearch, SearchParts};
use serde_json::{Value, json};

use crate::config::{ElasticsearchAuth, ElasticsearchConfig};
use crate::error::{ResponseError, ScoutResult, TransportError};
use crate::payload::Payload;

use super::Transport;

const DEFAULT_NODE: &str = "http://localhost:9200";

/// Sends payloads to an Elasticsearch cluster.
///
/// The payload's `index` addresses the request and its `body` is sent as is.
/// The legacy `type` key is not sent; mapping types no longer exist on the
/// cluster side.
pub struct ElasticsearchTransport {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchTransport {
    /// Creates a transport with the given configuration.
    ///
    /// # Errors
    ///
    /// * `TransportError::ConnectionFailed` - If the node URL is invalid or the
    ///   HTTP transport cannot be built
    pub fn new(config: ElasticsearchConfig) -> ScoutResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ElasticsearchConfig) -> ScoutResult<Elasticsearch> {
        let node = config.nodes.first().map_or(DEFAULT_NODE, String::as_str);
        let url: Url = node
            .parse()
            .map_err(|e| connection_failed(format!("invalid node url {node}"), e))?;

        let mut builder = TransportBuilder::new(SingleNodeConnectionPool::new(url))
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }
        if let Some(auth) = &config.auth {
            builder = builder.auth(credentials(auth));
        }

        let transport = builder
            .build()
            .map_err(|e| connection_failed("cannot build http transport", e))?;

        tracing::debug!(node, "elasticsearch client ready");
        Ok(Elasticsearch::new(transport))
    }

    /// Returns the Elasticsearch client.
    pub fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the transport configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for ElasticsearchTransport {
    async fn search(&self, payload: &Payload) -> ScoutResult<Value> {
        let index = target_index(payload)?;
        let body = payload.get("body").cloned().unwrap_or_else(|| json!({}));

        tracing::debug!(index = %index, "sending search request");

        let response = self
            .client
            .search(SearchParts::Index(&[&index]))
            .body(body)
            .send()
            .await
            .map_err(|e| request_failed("search", e))?;

        read_body(response).await
    }

    async fn count(&self, payload: &Payload) -> ScoutResult<Value> {
        let index = target_index(payload)?;

        // The count API only accepts a query.
        let body = match payload.get("body.query") {
            Some(query) => json!({ "query": query }),
            None => json!({}),
        };

        tracing::debug!(index = %index, "sending count request");

        let response = self
            .client
            .count(CountParts::Index(&[&index]))
            .body(body)
            .send()
            .await
            .map_err(|e| request_failed("count", e))?;

        read_body(response).await
    }
}

fn credentials(auth: &ElasticsearchAuth) -> Credentials {
    match auth {
        ElasticsearchAuth::Basic { username, password } => {
            Credentials::Basic(username.clone(), password.clone())
        }
        ElasticsearchAuth::Bearer { token } => Credentials::Bearer(token.clone()),
    }
}

fn connection_failed(context: impl Display, err: impl Display) -> TransportError {
    TransportError::ConnectionFailed {
        message: format!("{context}: {err}"),
    }
}

fn target_index(payload: &Payload) -> ScoutResult<String> {
    payload
        .get("index")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            ResponseError::Malformed {
                message: "payload has no index".to_string(),
            }
            .into()
        })
}

fn request_failed(operation: &str, err: elasticsearch::Error) -> TransportError {
    TransportError::RequestFailed {
        message: format!("{} request failed: {}", operation, err),
        source: Some(Box::new(err)),
    }
}

async fn read_body(response: Response) -> ScoutResult<Value> {
    let status = response.status_code();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TransportError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        }
        .into());
    }

    response.json::<Value>().await.map_err(|e| {
        ResponseError::Malformed {
            message: format!("Failed to parse response: {}", e),
        }
        .into()
    })
}
