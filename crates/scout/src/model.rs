//! The contract a record type implements to become searchable.
//!
//! A searchable type knows which index it lives in, which rules drive its
//! free-text searches, and how to load its backing records once the cluster
//! has answered with a list of ids.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ConfigurationError, ScoutResult};
use crate::index::Index;
use crate::rule::SearchRule;

/// Columns requested from the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Columns {
    /// Every column of the record.
    All,
    /// Only the listed columns.
    Only(Vec<String>),
}

/// A record type backed by a search index.
///
/// # Example
///
/// ```ignore
/// struct Restaurant { store: Arc<RestaurantStore> }
///
/// #[async_trait]
/// impl Searchable for Restaurant {
///     type Record = RestaurantRow;
///
///     fn index(&self) -> Option<Index> {
///         Some(Index::new("restaurants"))
///     }
///
///     fn searchable_type_name(&self) -> String {
///         "restaurants".to_string()
///     }
///
///     async fn batch_fetch_by_ids(
///         &self,
///         ids: &[String],
///         columns: &Columns,
///         include_soft_deleted: bool,
///     ) -> ScoutResult<HashMap<String, RestaurantRow>> {
///         self.store.find_many(ids, columns, include_soft_deleted).await
///     }
/// }
/// ```
#[async_trait]
pub trait Searchable: Send + Sync + Sized + 'static {
    /// The record loaded for each matching hit.
    ///
    /// Cloned when the same id is hit more than once.
    type Record: Clone + Send;

    /// Human readable name used in errors and logs.
    fn model_name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }

    /// The index this record type is stored in, if one is configured.
    fn index(&self) -> Option<Index>;

    /// The document type name sent with every payload.
    fn searchable_type_name(&self) -> String;

    /// Rules used by free-text searches that register none of their own.
    ///
    /// An empty list falls back to the catch-all query-string rule.
    fn search_rules(&self) -> Vec<Arc<dyn SearchRule<Self>>> {
        Vec::new()
    }

    /// The field that identifies a record, both in the index and the store.
    fn identifier_field_name(&self) -> &str {
        "id"
    }

    /// Whether records of this type are soft deleted.
    fn uses_soft_delete(&self) -> bool {
        false
    }

    /// Loads records by id, keyed by their identifier.
    ///
    /// Ids that have no record are simply absent from the returned map.
    async fn batch_fetch_by_ids(
        &self,
        ids: &[String],
        columns: &Columns,
        include_soft_deleted: bool,
    ) -> ScoutResult<HashMap<String, Self::Record>>;

    /// Returns the configured index or a configuration error.
    fn require_index(&self) -> ScoutResult<Index> {
        self.index().ok_or_else(|| {
            ConfigurationError::MissingIndex {
                model: self.model_name(),
            }
            .into()
        })
    }
}
