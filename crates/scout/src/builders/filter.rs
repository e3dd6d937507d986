//! Filter-only builder.

use std::sync::Arc;

use crate::compiler::{self, SearchOptions};
use crate::config::ScoutConfig;
use crate::error::ScoutResult;
use crate::model::Searchable;
use crate::payload::Payload;
use crate::transport::RawCallback;

use super::{BuilderState, Filterable, QueryBuilder};

/// Builds structured filter searches over a record type.
///
/// Compiles to exactly one payload whose scoring query matches everything;
/// all declared clauses land in the non-scoring filter section.
pub struct FilterBuilder<M: Searchable> {
    model: Arc<M>,
    config: ScoutConfig,
    state: BuilderState,
    callback: Option<Arc<dyn RawCallback>>,
}

impl<M: Searchable> FilterBuilder<M> {
    /// Creates a builder; soft-delete mode is on when both the record type
    /// and the configuration ask for it.
    pub fn new(model: Arc<M>, config: &ScoutConfig) -> Self {
        let soft_delete = model.uses_soft_delete() && config.soft_delete;
        Self::with_soft_delete(model, config, soft_delete)
    }

    /// Creates a builder with an explicit soft-delete mode.
    pub fn with_soft_delete(model: Arc<M>, config: &ScoutConfig, soft_delete: bool) -> Self {
        Self {
            model,
            config: config.clone(),
            state: BuilderState::new(soft_delete),
            callback: None,
        }
    }

    /// Hands execution to a raw callback instead of compiled payloads.
    pub fn callback(mut self, callback: Arc<dyn RawCallback>) -> Self {
        self.callback = Some(callback);
        self
    }
}

impl<M: Searchable> std::fmt::Debug for FilterBuilder<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("model", &self.model.model_name())
            .field("state", &self.state)
            .field("has_callback", &self.callback.is_some())
            .finish_non_exhaustive()
    }
}

impl<M: Searchable> Filterable for FilterBuilder<M> {
    fn state(&self) -> &BuilderState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BuilderState {
        &mut self.state
    }
}

impl<M: Searchable> QueryBuilder for FilterBuilder<M> {
    type Model = M;

    fn model(&self) -> &M {
        &self.model
    }

    fn config(&self) -> &ScoutConfig {
        &self.config
    }

    fn query_string(&self) -> &str {
        ""
    }

    fn raw_callback(&self) -> Option<&Arc<dyn RawCallback>> {
        self.callback.as_ref()
    }

    fn seed_payloads(&self, _options: &SearchOptions) -> ScoutResult<Vec<Payload>> {
        compiler::seed_match_all(self.model.as_ref(), &self.config)
    }
}
