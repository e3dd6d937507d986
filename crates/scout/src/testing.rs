//! Record type shared by unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ScoutResult;
use crate::index::Index;
use crate::model::{Columns, Searchable};
use crate::rule::SearchRule;

pub(crate) struct TestModel {
    pub index: Option<String>,
    pub soft_delete: bool,
    pub rules: Vec<Arc<dyn SearchRule<TestModel>>>,
}

impl Default for TestModel {
    fn default() -> Self {
        Self {
            index: Some("test".to_string()),
            soft_delete: false,
            rules: Vec::new(),
        }
    }
}

#[async_trait]
impl Searchable for TestModel {
    type Record = String;

    fn index(&self) -> Option<Index> {
        self.index.as_deref().map(Index::new)
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
        _columns: &Columns,
        _include_soft_deleted: bool,
    ) -> ScoutResult<HashMap<String, String>> {
        Ok(ids
            .iter()
            .map(|id| (id.clone(), format!("record-{id}")))
            .collect())
    }
}
