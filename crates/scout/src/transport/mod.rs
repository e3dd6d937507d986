//! The cluster boundary.
//!
//! [`Transport`] is the narrow contract the engine needs from a search
//! cluster. Connection pooling, timeouts, authentication and retries all live
//! behind it. With the `elasticsearch` feature enabled,
//! [`ElasticsearchTransport`] implements it on top of the official client.

#[cfg(feature = "elasticsearch")]
mod elasticsearch;

use async_trait::async_trait;
use serde_json::Value;

use crate::compiler::SearchOptions;
use crate::error::ScoutResult;
use crate::payload::Payload;

#[cfg(feature = "elasticsearch")]
pub use self::elasticsearch::ElasticsearchTransport;

/// Sends compiled payloads to a search cluster.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Runs a search request and returns the raw response document.
    ///
    /// # Errors
    ///
    /// * `TransportError::RequestFailed` - If no response was received
    /// * `TransportError::UnexpectedStatus` - If the cluster rejected the request
    async fn search(&self, payload: &Payload) -> ScoutResult<Value>;

    /// Runs a count request and returns the raw response (`{"count": n, ...}`).
    ///
    /// # Errors
    ///
    /// * `TransportError::RequestFailed` - If no response was received
    /// * `TransportError::UnexpectedStatus` - If the cluster rejected the request
    async fn count(&self, payload: &Payload) -> ScoutResult<Value>;
}

/// Replaces payload compilation for a single search.
///
/// When a builder carries a callback, the engine hands it the transport, the
/// free-text query and the execution options and returns whatever the
/// callback answers. The answer must be a JSON object; search-family calls
/// keep it as is (see [`RawResult::from_callback`]), and `count` reads its
/// `count` key, falling back to the total hit count.
///
/// [`RawResult::from_callback`]: crate::result::RawResult::from_callback
#[async_trait]
pub trait RawCallback: Send + Sync {
    /// Runs the custom request.
    async fn call(
        &self,
        transport: &dyn Transport,
        query: &str,
        options: &SearchOptions,
    ) -> ScoutResult<Value>;
}
