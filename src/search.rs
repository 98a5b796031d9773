//! Catalog search: facets, aggregations, pagination and the query pipeline.

pub mod aggregation;
pub mod cursor;
pub mod engine;
pub mod facet;
pub mod pagination;

pub use self::aggregation::{Aggregations, Aggregator, CategoryCount, VendorCount};
pub use self::cursor::{Cursor, CursorKey, CursorPage, CursorPaginator};
pub use self::engine::{CatalogHit, CatalogQuery, CatalogQueryEngine, CatalogSearchResult};
pub use self::facet::{FacetExtractor, Facets, IdFacet, SizeNormalizer, ValueCount};
pub use self::pagination::{Page, paginate};
