//! # Bazaar
//!
//! A catalog query engine and activity feed builder.
//!
//! ## Features
//!
//! - Fuzzy text matching with highlight spans
//! - Faceted filtering with "counts independent of own filter" semantics
//! - Category, vendor, price and rating aggregations
//! - Stable multi-field sorting with a creation-time tiebreak
//! - Offset pagination for catalog pages
//! - Cursor pagination over merged reviews, answers and comments
//!
//! ## Example
//!
//! ```
//! use bazaar::prelude::*;
//! use chrono::Utc;
//!
//! let items = vec![
//!     CatalogItem::new(1, "Rain Jacket", 49.0, Utc::now()),
//!     CatalogItem::new(2, "Wool Scarf", 19.0, Utc::now()),
//! ];
//! let snapshot = CatalogSnapshot::new(items, Vec::new(), Vec::new(), Vec::new());
//! let engine = CatalogQueryEngine::new(EngineConfig::default())?;
//!
//! let query = CatalogQuery::new(FilterSpec::new().query("jacket"));
//! let result = engine.search(&snapshot, &query, &NoDisplayData)?;
//! assert_eq!(result.total_count, 1);
//! # Ok::<(), bazaar::error::EngineError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod query;
pub mod search;
pub mod util;

pub mod prelude {
    pub use crate::catalog::{
        CatalogItem, CatalogSnapshot, CatalogSource, DisplayDataSource, FetchScope,
        MemoryCatalog, NamedParameter, NoDisplayData, SizeStock, VariantFacet,
    };
    pub use crate::config::EngineConfig;
    pub use crate::error::{EngineError, Result};
    pub use crate::feed::{ActivityRecord, FeedEngine, FeedQuery};
    pub use crate::query::{FilterSpec, SortSpec};
    pub use crate::search::{CatalogQuery, CatalogQueryEngine, CatalogSearchResult, Cursor};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
