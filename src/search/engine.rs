//! Catalog query orchestration: filter, facet, aggregate, sort, paginate, enrich.

use ahash::AHashMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::item::{CatalogItem, ItemId, ReviewStats};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::catalog::source::DisplayDataSource;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::query::filter::{FilterEngine, FilterSpec};
use crate::query::matcher::{FieldMatch, TextMatcher};
use crate::query::sort::{SortSpec, sort};
use crate::search::aggregation::{Aggregator, CategoryCount, VendorCount};
use crate::search::facet::{FacetExtractor, Facets};
use crate::search::pagination::paginate;

/// A catalog search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogQuery {
    pub filter: FilterSpec,
    /// `field_direction` token; the configured default applies when absent or malformed.
    pub sort: Option<String>,
    /// 1-indexed page number.
    pub page: usize,
    /// Overrides the configured catalog page size.
    pub page_size: Option<usize>,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        CatalogQuery {
            filter: FilterSpec::default(),
            sort: None,
            page: 1,
            page_size: None,
        }
    }
}

impl CatalogQuery {
    pub fn new(filter: FilterSpec) -> Self {
        CatalogQuery {
            filter,
            ..Self::default()
        }
    }

    pub fn sort<S: Into<String>>(mut self, token: S) -> Self {
        self.sort = Some(token.into());
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// An item on the result page with its display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogHit {
    pub item: CatalogItem,
    pub primary_image: Option<String>,
    pub review_count: u32,
    /// Reviews per star count, one through five.
    pub rating_histogram: [u32; 5],
    /// Highlight spans per matched field, best field first. Empty without a text query.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub highlights: Vec<FieldMatch>,
}

/// Result envelope of a catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchResult {
    pub batch: Vec<CatalogHit>,
    pub total_count: usize,
    pub has_next_page: bool,
    pub categories: Vec<CategoryCount>,
    pub vendors: Vec<VendorCount>,
    pub prices: [u64; 5],
    pub ratings: [u64; 4],
    pub filters: Facets,
    /// Sort actually applied.
    pub sort: String,
}

/// The product-search pipeline.
#[derive(Debug, Clone)]
pub struct CatalogQueryEngine {
    config: EngineConfig,
    filter: FilterEngine,
    facets: FacetExtractor,
    aggregator: Aggregator,
    matcher: TextMatcher,
    default_sort: SortSpec,
}

impl CatalogQueryEngine {
    /// Build the pipeline. Fails when the configuration does not validate or
    /// its default sort token is malformed.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let default_sort = SortSpec::parse(&config.pagination.default_sort)
            .map_err(|e| EngineError::config(format!("pagination.default_sort: {e}")))?;

        Ok(CatalogQueryEngine {
            filter: FilterEngine::new(&config),
            facets: FacetExtractor::new(&config.facets),
            aggregator: Aggregator::new(),
            matcher: TextMatcher::new(&config.matcher),
            default_sort,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `query` against `snapshot`, fetching display data for the page only.
    pub fn search(
        &self,
        snapshot: &CatalogSnapshot,
        query: &CatalogQuery,
        display: &dyn DisplayDataSource,
    ) -> Result<CatalogSearchResult> {
        let page_size = query
            .page_size
            .unwrap_or(self.config.pagination.catalog_page_size);

        let outcome = self.filter.filter(snapshot, &query.filter);
        let filters = self.facets.extract(snapshot, &outcome, &query.filter);
        let aggregations = self.aggregator.aggregate(snapshot, &outcome);

        let sort_spec = SortSpec::parse_or(query.sort.as_deref(), &self.default_sort);
        let working: Vec<&CatalogItem> = outcome
            .working_set
            .iter()
            .map(|&position| &snapshot.items()[position])
            .collect();
        let sorted = sort(&working, &sort_spec);
        let page = paginate(&sorted, query.page, page_size)?;

        let batch = self.enrich(&page.batch, query.filter.query.as_deref(), display)?;
        info!(
            "catalog search: {} of {} items match, page {} holds {}",
            page.total_count,
            snapshot.len(),
            query.page,
            batch.len()
        );

        Ok(CatalogSearchResult {
            batch,
            total_count: page.total_count,
            has_next_page: page.has_next_page,
            categories: aggregations.categories,
            vendors: aggregations.vendors,
            prices: aggregations.prices,
            ratings: aggregations.ratings,
            filters,
            sort: sort_spec.to_string(),
        })
    }

    fn enrich(
        &self,
        page: &[&CatalogItem],
        text_query: Option<&str>,
        display: &dyn DisplayDataSource,
    ) -> Result<Vec<CatalogHit>> {
        if page.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<ItemId> = page.iter().map(|item| item.item_id).collect();

        let (images, stats) = rayon::join(
            || display.primary_images(&ids),
            || display.review_stats(&ids),
        );
        let (mut images, mut stats): (AHashMap<ItemId, String>, AHashMap<ItemId, ReviewStats>) =
            (images?, stats?);
        debug!(
            "enriched {} page items: {} images, {} review stats",
            ids.len(),
            images.len(),
            stats.len()
        );

        let mut highlights = match text_query {
            Some(text) => self.matcher.match_spans(page, text),
            None => Default::default(),
        };

        Ok(page
            .iter()
            .map(|item| {
                let review = stats.remove(&item.item_id);
                CatalogHit {
                    item: (*item).clone(),
                    primary_image: images.remove(&item.item_id),
                    review_count: review
                        .as_ref()
                        .map_or(item.review_count, |found| found.review_count),
                    rating_histogram: review
                        .map(|found| found.stars_histogram)
                        .unwrap_or_default(),
                    highlights: highlights
                        .remove(&item.item_id)
                        .map(|found| found.fields)
                        .unwrap_or_default(),
                }
            })
            .collect())
    }
}
