//! Count-based aggregations: categories, vendors, price and rating histograms.

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::item::{CategoryId, VendorId};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::query::filter::{Dimension, FilterOutcome};

/// Upper bounds (inclusive) of the first four price buckets; the fifth is open.
pub const PRICE_BOUNDS: [f64; 4] = [25.0, 50.0, 100.0, 200.0];

/// Lower bounds (inclusive) of the first three rating buckets; the fourth is `< 2`.
pub const RATING_FLOORS: [f64; 3] = [4.0, 3.0, 2.0];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: CategoryId,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorCount {
    pub vendor_id: VendorId,
    pub name: String,
    pub count: u64,
    /// Whether the vendor still has items after the vendor filter.
    pub present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregations {
    pub categories: Vec<CategoryCount>,
    pub vendors: Vec<VendorCount>,
    pub prices: [u64; 5],
    pub ratings: [u64; 4],
}

/// Price bucket of a price, `None` for non-finite prices.
pub fn price_bucket(price: f64) -> Option<usize> {
    if !price.is_finite() {
        return None;
    }
    Some(
        PRICE_BOUNDS
            .iter()
            .position(|bound| price <= *bound)
            .unwrap_or(PRICE_BOUNDS.len()),
    )
}

/// Rating bucket of an average star rating, `None` for NaN.
pub fn rating_bucket(stars: f64) -> Option<usize> {
    if stars.is_nan() {
        return None;
    }
    Some(
        RATING_FLOORS
            .iter()
            .position(|floor| stars >= *floor)
            .unwrap_or(RATING_FLOORS.len()),
    )
}

/// Folds a filter outcome into [`Aggregations`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Aggregator
    }

    pub fn aggregate(&self, snapshot: &CatalogSnapshot, outcome: &FilterOutcome) -> Aggregations {
        let items = snapshot.items();

        // Categories: every category in the snapshot, counted with every
        // filter applied except the category filter itself.
        let mut categories: Vec<CategoryCount> = Vec::new();
        let mut category_slot: AHashMap<CategoryId, usize> = AHashMap::new();
        for (position, item) in items.iter().enumerate() {
            let slot = *category_slot.entry(item.category_id).or_insert_with(|| {
                categories.push(CategoryCount {
                    category_id: item.category_id,
                    name: item.category_name.clone(),
                    count: 0,
                });
                categories.len() - 1
            });
            if outcome.matrix.passes_except(position, Some(&Dimension::Category)) {
                categories[slot].count += 1;
            }
        }
        categories.sort_by(|a, b| b.count.cmp(&a.count));

        let mut vendors: Vec<VendorCount> = Vec::new();
        let mut vendor_slot: AHashMap<VendorId, usize> = AHashMap::new();
        for &position in &outcome.before_vendor {
            let item = &items[position];
            let slot = *vendor_slot.entry(item.vendor_id).or_insert_with(|| {
                vendors.push(VendorCount {
                    vendor_id: item.vendor_id,
                    name: item.vendor_name.clone(),
                    count: 0,
                    present: false,
                });
                vendors.len() - 1
            });
            vendors[slot].count += 1;
        }
        for &position in &outcome.working_set {
            if let Some(&slot) = vendor_slot.get(&items[position].vendor_id) {
                vendors[slot].present = true;
            }
        }
        vendors.retain(|vendor| vendor.count > 0);
        vendors.sort_by(|a, b| b.count.cmp(&a.count));

        let mut prices = [0u64; 5];
        let mut ratings = [0u64; 4];
        for &position in &outcome.working_set {
            let item = &items[position];
            if let Some(bucket) = price_bucket(item.price) {
                prices[bucket] += 1;
            }
            if let Some(bucket) = item.stars_avg.and_then(rating_bucket) {
                ratings[bucket] += 1;
            }
        }

        debug!(
            "aggregated {} categories, {} vendors, prices {prices:?}, ratings {ratings:?}",
            categories.len(),
            vendors.len()
        );

        Aggregations {
            categories,
            vendors,
            prices,
            ratings,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::catalog::item::CatalogItem;
    use crate::config::EngineConfig;
    use crate::query::filter::{FilterEngine, FilterSpec};

    #[test]
    fn test_price_bucket_boundaries() {
        assert_eq!(price_bucket(0.0), Some(0));
        assert_eq!(price_bucket(25.0), Some(0));
        assert_eq!(price_bucket(25.01), Some(1));
        assert_eq!(price_bucket(50.0), Some(1));
        assert_eq!(price_bucket(100.0), Some(2));
        assert_eq!(price_bucket(200.0), Some(3));
        assert_eq!(price_bucket(200.01), Some(4));
        assert_eq!(price_bucket(f64::NAN), None);
    }

    #[test]
    fn test_rating_bucket_boundaries() {
        assert_eq!(rating_bucket(5.0), Some(0));
        assert_eq!(rating_bucket(4.0), Some(0));
        assert_eq!(rating_bucket(3.99), Some(1));
        assert_eq!(rating_bucket(3.0), Some(1));
        assert_eq!(rating_bucket(2.0), Some(2));
        assert_eq!(rating_bucket(1.99), Some(3));
        assert_eq!(rating_bucket(0.0), Some(3));
    }

    fn snapshot() -> CatalogSnapshot {
        let created = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let items = vec![
            CatalogItem::new(1, "A", 10.0, created)
                .with_category(1, "Shirts")
                .with_vendor(10, "Acme")
                .with_stars(4.5, 2),
            CatalogItem::new(2, "B", 60.0, created)
                .with_category(1, "Shirts")
                .with_vendor(11, "Globex")
                .with_stars(2.5, 1),
            CatalogItem::new(3, "C", 60.0, created)
                .with_category(1, "Shirts")
                .with_vendor(11, "Globex"),
            CatalogItem::new(4, "D", 300.0, created)
                .with_category(2, "Coats")
                .with_vendor(12, "Initech"),
        ];
        CatalogSnapshot::new(items, Vec::new(), Vec::new(), Vec::new())
    }

    fn aggregate(spec: &FilterSpec) -> Aggregations {
        let snapshot = snapshot();
        let outcome = FilterEngine::new(&EngineConfig::default()).filter(&snapshot, spec);
        Aggregator::new().aggregate(&snapshot, &outcome)
    }

    #[test]
    fn test_vendor_counts_ignore_vendor_filter() {
        let aggs = aggregate(&FilterSpec::new().category(1).vendor(10));
        let vendors: Vec<(VendorId, u64, bool)> = aggs
            .vendors
            .iter()
            .map(|v| (v.vendor_id, v.count, v.present))
            .collect();
        assert_eq!(vendors, vec![(11, 2, false), (10, 1, true)]);
        assert_eq!(aggs.prices, [1, 0, 0, 0, 0]);
        assert_eq!(aggs.ratings, [1, 0, 0, 0]);
    }

    #[test]
    fn test_category_counts_ignore_category_filter() {
        let aggs = aggregate(&FilterSpec::new().category(1));
        let categories: Vec<(CategoryId, u64)> = aggs
            .categories
            .iter()
            .map(|c| (c.category_id, c.count))
            .collect();
        assert_eq!(categories, vec![(1, 3), (2, 1)]);
        assert_eq!(aggs.prices, [1, 0, 2, 0, 0]);
        // The unrated item is left out of the rating histogram.
        assert_eq!(aggs.ratings, [1, 0, 1, 0]);
    }
}
