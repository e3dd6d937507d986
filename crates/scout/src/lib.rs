//! Helios Scout
//!
//! This crate compiles fluent filter and free-text searches into Elasticsearch
//! request payloads, runs them against a cluster and maps the hits back to the
//! records they index.
//!
//! # Features
//!
//! - **Filter builder**: term, terms, range, exists, regexp and geo clauses
//!   routed into `must`/`must_not`/`should`/`filter` buckets, plus sorting,
//!   pagination, projection and collapsing
//! - **Rule-based search**: a free-text query evaluated through an ordered list
//!   of [`SearchRule`](rule::SearchRule)s, one request per applicable rule
//! - **Progressive fallback**: rules run strictest first and the first one that
//!   finds anything wins
//! - **Soft deletion**: soft-deleted documents are excluded by default and can
//!   be included or isolated per search
//! - **Result mapping**: hits are resolved to backing records in hit order,
//!   with their highlights attached
//!
//! The cluster is reached through the [`Transport`](transport::Transport)
//! trait. Enable the `elasticsearch` feature for a transport built on the
//! official client:
//!
//! ```toml
//! [dependencies]
//! helios-scout = { version = "0.1", features = ["elasticsearch"] }
//! ```
//!
//! # Architecture
//!
//! - [`builders`] - [`FilterBuilder`](builders::FilterBuilder) and
//!   [`SearchQueryBuilder`](builders::SearchQueryBuilder)
//! - [`rule`] - Search rule strategies
//! - [`compiler`] - Turns a builder into ordered payloads
//! - [`engine`] - Sends payloads in rule order
//! - [`result`] - Response types and record mapping
//! - [`model`] - The contract a searchable record type implements
//! - [`payload`] - The mutable request document
//! - [`transport`] - The cluster boundary
//! - [`error`] - Error types for all operations
//!
//! # Payloads
//!
//! ```
//! use helios_scout::payload::Payload;
//! use serde_json::json;
//!
//! let mut payload = Payload::for_index("restaurants");
//! payload
//!     .set("body.query.bool.must.match_all", json!({}))
//!     .set_if_not_null("body.size", 10)
//!     .set("index", "ignored");
//!
//! assert_eq!(
//!     payload.into_value(),
//!     json!({
//!         "index": "restaurants",
//!         "body": { "query": { "bool": { "must": { "match_all": {} } } }, "size": 10 }
//!     })
//! );
//! ```
//!
//! # Searching
//!
//! ```ignore
//! use helios_scout::builders::{Filterable, Operator, SearchQueryBuilder};
//! use helios_scout::{Engine, ScoutConfig};
//!
//! let engine = Engine::new(transport);
//! let builder = SearchQueryBuilder::new(restaurants, "pizza", &ScoutConfig::default())
//!     .where_op("rating", Operator::Gte, 4)
//!     .take(20);
//!
//! for restaurant in engine.get(&builder).await? {
//!     if let Some(title) = restaurant.highlight.as_ref().and_then(|h| h.as_string("title")) {
//!         println!("{title}");
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builders;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod index;
pub mod model;
pub mod payload;
pub mod result;
pub mod rule;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at crate root
pub use builders::{FilterBuilder, Filterable, Operator, QueryBuilder, SearchQueryBuilder};
pub use compiler::{PayloadCompiler, SearchOptions};
pub use config::ScoutConfig;
pub use engine::Engine;
pub use error::{ScoutError, ScoutResult};
pub use highlight::Highlight;
pub use model::{Columns, Searchable};
pub use result::{MappedRecord, RawResult, ResultMapper};
pub use rule::{FnRule, QueryStringRule, SearchRule};
pub use transport::{RawCallback, Transport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
