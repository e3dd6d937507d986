//! Configuration.
//!
//! [`ScoutConfig`] shapes builders and payloads; [`ElasticsearchConfig`]
//! describes how the cluster transport connects.

use serde::{Deserialize, Serialize};

/// Settings that shape how builders and payloads are created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    /// Prefix prepended to every index name (default: empty).
    #[serde(default)]
    pub prefix: String,

    /// Whether soft-deleted records are excluded by default (default: false).
    ///
    /// Only takes effect for record types that use soft deletion.
    #[serde(default)]
    pub soft_delete: bool,
}

impl ScoutConfig {
    /// Creates a configuration with the given index prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Enables or disables soft-delete filtering.
    pub fn with_soft_delete(mut self, soft_delete: bool) -> Self {
        self.soft_delete = soft_delete;
        self
    }
}

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Connection settings for the Elasticsearch transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}
