//! Searchable record type and search rules used across tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use helios_scout::builders::SearchQueryBuilder;
use helios_scout::error::{RecordError, ScoutResult};
use helios_scout::index::Index;
use helios_scout::model::{Columns, Searchable};
use helios_scout::rule::{QueryStringRule, SearchRule};

/// A stored restaurant row.
#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    pub id: u64,
    pub title: String,
    pub deleted: bool,
}

/// One `batch_fetch_by_ids` call.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub ids: Vec<String>,
    pub columns: Columns,
    pub include_soft_deleted: bool,
}

/// In-memory restaurant store.
pub struct Restaurants {
    rows: Vec<Restaurant>,
    soft_delete: bool,
    rules: Vec<Arc<dyn SearchRule<Restaurants>>>,
    fail_fetch: bool,
    fetches: Mutex<Vec<FetchCall>>,
}

impl Restaurants {
    pub fn new(rows: Vec<Restaurant>) -> Self {
        Self {
            rows,
            soft_delete: false,
            rules: Vec::new(),
            fail_fetch: false,
            fetches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_soft_delete(mut self) -> Self {
        self.soft_delete = true;
        self
    }

    pub fn with_rule(mut self, rule: impl SearchRule<Restaurants> + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.lock().clone()
    }
}

#[async_trait]
impl Searchable for Restaurants {
    type Record = Restaurant;

    fn index(&self) -> Option<Index> {
        Some(Index::new("test"))
    }

    fn searchable_type_name(&self) -> String {
        "test".to_string()
    }

    fn search_rules(&self) -> Vec<Arc<dyn SearchRule<Self>>> {
        self.rules.clone()
    }

    fn uses_soft_delete(&self) -> bool {
        self.soft_delete
    }

    async fn batch_fetch_by_ids(
        &self,
        ids: &[String],
        columns: &Columns,
        include_soft_deleted: bool,
    ) -> ScoutResult<HashMap<String, Restaurant>> {
        self.fetches.lock().push(FetchCall {
            ids: ids.to_vec(),
            columns: columns.clone(),
            include_soft_deleted,
        });

        if self.fail_fetch {
            return Err(RecordError::FetchFailed {
                model: self.model_name(),
                message: "store offline".to_string(),
            }
            .into());
        }

        Ok(self
            .rows
            .iter()
            .filter(|row| include_soft_deleted || !row.deleted)
            .filter(|row| ids.contains(&row.id.to_string()))
            .map(|row| (row.id.to_string(), row.clone()))
            .collect())
    }
}

/// A record type with no index.
pub struct Unindexed;

#[async_trait]
impl Searchable for Unindexed {
    type Record = ();

    fn index(&self) -> Option<Index> {
        None
    }

    fn searchable_type_name(&self) -> String {
        "unindexed".to_string()
    }

    async fn batch_fetch_by_ids(
        &self,
        _ids: &[String],
        _columns: &Columns,
        _include_soft_deleted: bool,
    ) -> ScoutResult<HashMap<String, ()>> {
        Ok(HashMap::new())
    }
}

pub fn restaurant(id: u64, title: &str) -> Restaurant {
    Restaurant {
        id,
        title: title.to_string(),
        deleted: false,
    }
}

pub fn deleted_restaurant(id: u64, title: &str) -> Restaurant {
    Restaurant {
        deleted: true,
        ..restaurant(id, title)
    }
}

/// Query-string rule that highlights every selected field.
pub struct SelectHighlightRule;

impl SearchRule<Restaurants> for SelectHighlightRule {
    fn build_query_payload(&self, builder: &SearchQueryBuilder<Restaurants>) -> Value {
        QueryStringRule.build_query_payload(builder)
    }

    fn build_highlight_payload(&self, builder: &SearchQueryBuilder<Restaurants>) -> Option<Value> {
        use helios_scout::builders::Filterable;

        let fields: Map<String, Value> = builder
            .state()
            .select
            .iter()
            .map(|field| (field.clone(), json!({ "type": "plain" })))
            .collect();

        if fields.is_empty() {
            return None;
        }
        Some(json!({ "fields": fields }))
    }
}

/// Rule that never applies.
pub struct NeverApplicableRule;

impl SearchRule<Restaurants> for NeverApplicableRule {
    fn is_applicable(&self, _builder: &SearchQueryBuilder<Restaurants>) -> bool {
        false
    }

    fn build_query_payload(&self, _builder: &SearchQueryBuilder<Restaurants>) -> Value {
        json!({ "must": { "match_none": {} } })
    }
}

/// Rule matching the query against one field.
pub struct MatchRule(pub &'static str);

impl SearchRule<Restaurants> for MatchRule {
    fn build_query_payload(&self, builder: &SearchQueryBuilder<Restaurants>) -> Value {
        json!({ "must": { "match": { self.0: builder.query() } } })
    }
}
