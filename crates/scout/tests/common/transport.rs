//! Recording mock transport.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use helios_scout::compiler::SearchOptions;
use helios_scout::error::{ScoutResult, TransportError};
use helios_scout::payload::Payload;
use helios_scout::transport::{RawCallback, Transport};

/// Transport that answers from scripted queues and records every request.
///
/// When a queue runs dry, searches answer with no hits and counts with zero.
#[derive(Debug, Default)]
pub struct MockTransport {
    search_responses: Mutex<VecDeque<Value>>,
    count_responses: Mutex<VecDeque<Value>>,
    searches: Mutex<Vec<Value>>,
    counts: Mutex<Vec<Value>>,
    fail_search_at: Mutex<Option<usize>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next search response.
    pub fn with_search_response(self, response: Value) -> Self {
        self.search_responses.lock().push_back(response);
        self
    }

    /// Queues the next count response.
    pub fn with_count_response(self, response: Value) -> Self {
        self.count_responses.lock().push_back(response);
        self
    }

    /// Makes the nth search call (0-based) fail.
    pub fn failing_search_at(self, call: usize) -> Self {
        *self.fail_search_at.lock() = Some(call);
        self
    }

    /// Every search payload sent so far.
    pub fn searches(&self) -> Vec<Value> {
        self.searches.lock().clone()
    }

    /// Every count payload sent so far.
    pub fn counts(&self) -> Vec<Value> {
        self.counts.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn search(&self, payload: &Payload) -> ScoutResult<Value> {
        let call = {
            let mut searches = self.searches.lock();
            searches.push(payload.to_value());
            searches.len() - 1
        };

        if *self.fail_search_at.lock() == Some(call) {
            return Err(TransportError::RequestFailed {
                message: "connection reset".to_string(),
                source: None,
            }
            .into());
        }

        Ok(self
            .search_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| hits_response(&[])))
    }

    async fn count(&self, payload: &Payload) -> ScoutResult<Value> {
        self.counts.lock().push(payload.to_value());

        Ok(self
            .count_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| json!({ "count": 0 })))
    }
}

/// A search response whose hits carry the given ids.
pub fn hits_response(ids: &[u64]) -> Value {
    let hits: Vec<Value> = ids.iter().map(|id| json!({ "_id": id })).collect();
    json!({
        "took": 1,
        "timed_out": false,
        "hits": {
            "total": { "value": ids.len(), "relation": "eq" },
            "hits": hits,
        }
    })
}

/// Raw callback that records its inputs and answers with a fixed response.
#[derive(Debug)]
pub struct RecordingCallback {
    response: Value,
    calls: Mutex<Vec<(String, SearchOptions)>>,
}

impl RecordingCallback {
    pub fn new(response: Value) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, SearchOptions)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl RawCallback for RecordingCallback {
    async fn call(
        &self,
        _transport: &dyn Transport,
        query: &str,
        options: &SearchOptions,
    ) -> ScoutResult<Value> {
        self.calls.lock().push((query.to_string(), *options));
        Ok(self.response.clone())
    }
}
