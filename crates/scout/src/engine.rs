//! Rule-priority execution.
//!
//! The engine compiles a builder and sends its payloads one at a time, in rule
//! order, stopping at the first response that found anything. Rules are
//! expected to loosen from first to last, so the earliest match is the most
//! precise one. Requests are never merged and never sent concurrently.
//!
//! A transport failure on any payload aborts the search; later rules are not
//! tried.

use serde_json::Value;

use crate::builders::QueryBuilder;
use crate::compiler::{PayloadCompiler, SearchOptions};
use crate::config::ScoutConfig;
use crate::error::{QueryError, ScoutResult};
use crate::model::Searchable;
use crate::payload::Payload;
use crate::result::{MappedRecord, RawResult, ResultMapper};
use crate::transport::Transport;

/// Executes builders against a search cluster.
#[derive(Debug)]
pub struct Engine<T: Transport> {
    transport: T,
}

impl<T: Transport> Engine<T> {
    /// Creates an engine over a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Compiles a builder without sending anything.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::MissingIndex` - If the record type has no index
    pub fn build_payloads<B: QueryBuilder>(
        &self,
        builder: &B,
        options: &SearchOptions,
    ) -> ScoutResult<Vec<Payload>> {
        PayloadCompiler::compile(builder, options)
    }

    /// Runs a search, returning the first response with hits, or the last
    /// response when no rule matched.
    ///
    /// The returned result carries the payload that produced it. A builder
    /// whose rules are all inapplicable yields an empty result without any
    /// request being sent.
    ///
    /// # Errors
    ///
    /// Returns configuration, transport and response errors; the first
    /// transport error stops evaluation.
    pub async fn search<B: QueryBuilder>(&self, builder: &B) -> ScoutResult<RawResult> {
        self.perform_search(builder, SearchOptions::default()).await
    }

    /// Runs a search for one page (1-based) of `per_page` results.
    ///
    /// # Errors
    ///
    /// * `QueryError::InvalidPagination` - If `page` is 0
    ///
    /// Otherwise as [`Engine::search`].
    pub async fn paginate<B: QueryBuilder>(
        &self,
        builder: B,
        per_page: u64,
        page: u64,
    ) -> ScoutResult<RawResult> {
        if page == 0 {
            return Err(QueryError::InvalidPagination {
                message: "pages are numbered from 1".to_string(),
            }
            .into());
        }

        let builder = builder
            .from((page - 1).saturating_mul(per_page))
            .take(per_page);

        self.perform_search(&builder, SearchOptions::default()).await
    }

    /// Runs a search with scoring explanations.
    ///
    /// # Errors
    ///
    /// As [`Engine::search`].
    pub async fn explain<B: QueryBuilder>(&self, builder: &B) -> ScoutResult<RawResult> {
        self.perform_search(builder, SearchOptions::default().with_explain(true))
            .await
    }

    /// Runs a search with execution profiling.
    ///
    /// # Errors
    ///
    /// As [`Engine::search`].
    pub async fn profile<B: QueryBuilder>(&self, builder: &B) -> ScoutResult<RawResult> {
        self.perform_search(builder, SearchOptions::default().with_profile(true))
            .await
    }

    /// Counts matches: the first non-zero count in rule order, else 0.
    ///
    /// # Errors
    ///
    /// As [`Engine::search`].
    pub async fn count<B: QueryBuilder>(&self, builder: &B) -> ScoutResult<u64> {
        let options = SearchOptions::default().with_highlight(false);

        if let Some(callback) = builder.raw_callback() {
            let response = callback
                .call(&self.transport, builder.query_string(), &options)
                .await?;
            return callback_count(response);
        }

        let payloads = PayloadCompiler::compile(builder, &options)?;
        let mut count = 0;

        for (position, payload) in payloads.iter().enumerate() {
            let response = self.transport.count(payload).await?;
            count = response.get("count").and_then(Value::as_u64).unwrap_or(0);

            if count > 0 {
                tracing::debug!(position, count, "count matched");
                break;
            }
        }

        Ok(count)
    }

    /// Sends a caller-built body to a record type's index, unmodified.
    ///
    /// Never compiles anything and ignores raw callbacks.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::MissingIndex` - If the record type has no index
    ///
    /// Otherwise propagates transport errors.
    pub async fn search_raw<M: Searchable>(
        &self,
        model: &M,
        config: &ScoutConfig,
        body: Value,
    ) -> ScoutResult<Value> {
        let mut payload = Payload::for_model(model, config)?;
        payload.set_if_not_empty("body", body);

        self.transport.search(&payload).await
    }

    /// Loads the records behind a response. See [`ResultMapper::map`].
    ///
    /// # Errors
    ///
    /// Propagates record-store failures.
    pub async fn map<M: Searchable>(
        &self,
        raw: &RawResult,
        model: &M,
    ) -> ScoutResult<Vec<MappedRecord<M::Record>>> {
        ResultMapper::map(raw, model).await
    }

    /// Runs a search and loads its records.
    ///
    /// # Errors
    ///
    /// As [`Engine::search`] and [`Engine::map`].
    pub async fn get<B: QueryBuilder>(
        &self,
        builder: &B,
    ) -> ScoutResult<Vec<MappedRecord<<B::Model as Searchable>::Record>>> {
        let raw = self.search(builder).await?;
        ResultMapper::map(&raw, builder.model()).await
    }

    async fn perform_search<B: QueryBuilder>(
        &self,
        builder: &B,
        options: SearchOptions,
    ) -> ScoutResult<RawResult> {
        if let Some(callback) = builder.raw_callback() {
            tracing::debug!("delegating search to raw callback");
            let response = callback
                .call(&self.transport, builder.query_string(), &options)
                .await?;
            return RawResult::from_callback(response);
        }

        let payloads = PayloadCompiler::compile(builder, &options)?;
        let mut result = RawResult::default();

        for (position, payload) in payloads.iter().enumerate() {
            let body = payload.to_value();
            tracing::trace!(position, payload = %body, "sending search payload");

            let response = self.transport.search(payload).await?;
            result = RawResult::from_value(response)?.with_payload(body);

            let total = result.total();
            if total > 0 {
                tracing::debug!(position, total, "search rule matched");
                break;
            }
        }

        Ok(result)
    }
}

fn callback_count(response: Value) -> ScoutResult<u64> {
    if let Some(count) = response.get("count").and_then(Value::as_u64) {
        return Ok(count);
    }
    Ok(RawResult::from_callback(response)?.total())
}
