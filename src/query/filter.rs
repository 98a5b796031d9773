//! Catalog filtering.
//!
//! Each active filter dimension becomes one predicate row over the snapshot's
//! items. The working set is the conjunction of all rows; facet counts use the
//! conjunction of every row but their own. Rows are evaluated in a fixed order:
//! category, text, price, rating, availability, color, size, named parameters,
//! and vendor last.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bit_vec::BitVec;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::item::{CatalogItem, CategoryId, VendorId};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::config::EngineConfig;
use crate::query::matcher::TextMatcher;
use crate::search::facet::SizeNormalizer;

/// Caller-supplied filter for one catalog query.
///
/// Within a dimension values are alternatives; across dimensions all must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterSpec {
    pub query: Option<String>,
    pub category_id: Option<CategoryId>,
    pub vendor_ids: BTreeSet<VendorId>,
    pub colors: BTreeSet<String>,
    pub sizes: BTreeSet<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub min_rating: Option<f64>,
    pub include_out_of_stock: bool,
    pub parameters: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query<S: Into<String>>(mut self, query: S) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn vendor(mut self, vendor_id: VendorId) -> Self {
        self.vendor_ids.insert(vendor_id);
        self
    }

    pub fn color<S: Into<String>>(mut self, color: S) -> Self {
        self.colors.insert(color.into());
        self
    }

    pub fn size<S: Into<String>>(mut self, size: S) -> Self {
        self.sizes.insert(size.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.price_min = min;
        self.price_max = max;
        self
    }

    pub fn min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn include_out_of_stock(mut self, include: bool) -> Self {
        self.include_out_of_stock = include;
        self
    }

    pub fn parameter<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.parameters
            .entry(name.into())
            .or_default()
            .insert(value.into());
        self
    }

    fn text_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// A filterable dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    Category,
    Text,
    Price,
    Rating,
    Availability,
    Color,
    Size,
    Parameter(String),
    Vendor,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Category => write!(f, "category"),
            Dimension::Text => write!(f, "text"),
            Dimension::Price => write!(f, "price"),
            Dimension::Rating => write!(f, "rating"),
            Dimension::Availability => write!(f, "availability"),
            Dimension::Color => write!(f, "color"),
            Dimension::Size => write!(f, "size"),
            Dimension::Parameter(name) => write!(f, "parameter '{name}'"),
            Dimension::Vendor => write!(f, "vendor"),
        }
    }
}

/// Which predicate rows an item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failures<'a> {
    None,
    One(&'a Dimension),
    Many,
}

/// One bit row per active dimension over the snapshot's item positions.
#[derive(Debug, Clone, Default)]
pub struct PredicateMatrix {
    len: usize,
    rows: Vec<(Dimension, BitVec)>,
}

impl PredicateMatrix {
    fn new(len: usize) -> Self {
        PredicateMatrix {
            len,
            rows: Vec::new(),
        }
    }

    fn push<F: FnMut(usize) -> bool>(&mut self, dimension: Dimension, mut predicate: F) {
        let row = BitVec::from_fn(self.len, &mut predicate);
        debug!(
            "{dimension} filter: {} of {} items pass",
            row.iter().filter(|bit| *bit).count(),
            self.len
        );
        self.rows.push((dimension, row));
    }

    /// Number of item positions.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Active dimensions in evaluation order.
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.rows.iter().map(|(dimension, _)| dimension)
    }

    pub fn is_active(&self, dimension: &Dimension) -> bool {
        self.rows.iter().any(|(active, _)| active == dimension)
    }

    /// Rows the item at `position` fails.
    pub fn failures(&self, position: usize) -> Failures<'_> {
        let mut failed = Failures::None;
        for (dimension, row) in &self.rows {
            if !row.get(position).unwrap_or(false) {
                failed = match failed {
                    Failures::None => Failures::One(dimension),
                    _ => return Failures::Many,
                };
            }
        }
        failed
    }

    /// Whether the item passes every row except `skip`.
    pub fn passes_except(&self, position: usize, skip: Option<&Dimension>) -> bool {
        match self.failures(position) {
            Failures::None => true,
            Failures::One(dimension) => Some(dimension) == skip,
            Failures::Many => false,
        }
    }

    /// Positions passing every row except `skip`, ascending.
    pub fn positions_except(&self, skip: Option<&Dimension>) -> Vec<usize> {
        (0..self.len)
            .filter(|&position| self.passes_except(position, skip))
            .collect()
    }
}

/// Working sets produced by [`FilterEngine::filter`].
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Per-dimension predicate rows.
    pub matrix: PredicateMatrix,
    /// Positions passing every filter except vendor.
    pub before_vendor: Vec<usize>,
    /// Positions passing every filter.
    pub working_set: Vec<usize>,
}

/// Applies a [`FilterSpec`] to a snapshot.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    matcher: TextMatcher,
    sizes: SizeNormalizer,
    color_dimension: String,
}

impl FilterEngine {
    pub fn new(config: &EngineConfig) -> Self {
        FilterEngine {
            matcher: TextMatcher::new(&config.matcher),
            sizes: SizeNormalizer::new(&config.facets),
            color_dimension: config.facets.color_dimension.clone(),
        }
    }

    /// Evaluate every active filter over the snapshot.
    pub fn filter(&self, snapshot: &CatalogSnapshot, spec: &FilterSpec) -> FilterOutcome {
        let items = snapshot.items();
        let mut matrix = PredicateMatrix::new(items.len());

        if let Some(category_id) = spec.category_id {
            matrix.push(Dimension::Category, |i| items[i].category_id == category_id);
        }

        if let Some(query) = spec.text_query() {
            let matched = self.matcher.match_indices(items, query);
            matrix.push(Dimension::Text, |i| matched.contains(&i));
        }

        if spec.price_min.is_some() || spec.price_max.is_some() {
            matrix.push(Dimension::Price, |i| {
                price_in_range(&items[i], spec.price_min, spec.price_max)
            });
        }

        if let Some(floor) = spec.min_rating {
            matrix.push(Dimension::Rating, |i| {
                items[i].stars_avg.is_some_and(|stars| stars >= floor)
            });
        }

        if !spec.include_out_of_stock {
            matrix.push(Dimension::Availability, |i| {
                items[i].is_available && snapshot.is_in_stock(&items[i])
            });
        }

        if !spec.colors.is_empty() {
            let wanted: BTreeSet<String> = spec.colors.iter().map(|c| c.trim().to_lowercase()).collect();
            matrix.push(Dimension::Color, |i| {
                snapshot
                    .variant_values(&items[i], &self.color_dimension)
                    .any(|value| wanted.contains(&value.trim().to_lowercase()))
            });
        }

        if !spec.sizes.is_empty() {
            let wanted: BTreeSet<String> = spec
                .sizes
                .iter()
                .filter_map(|size| self.sizes.normalize(size))
                .collect();
            matrix.push(Dimension::Size, |i| {
                snapshot.sizes_of(&items[i]).iter().any(|row| {
                    (spec.include_out_of_stock || row.qty > 0)
                        && self
                            .sizes
                            .normalize(&row.size_name)
                            .is_some_and(|size| wanted.contains(&size))
                })
            });
        }

        for (name, values) in &spec.parameters {
            if values.is_empty() {
                continue;
            }
            let wanted: BTreeSet<String> = values.iter().map(|v| v.trim().to_lowercase()).collect();
            matrix.push(Dimension::Parameter(name.clone()), |i| {
                snapshot
                    .parameters_of(&items[i])
                    .iter()
                    .any(|p| p.name == *name && wanted.contains(&p.value.trim().to_lowercase()))
            });
        }

        let before_vendor = matrix.positions_except(Some(&Dimension::Vendor));

        if !spec.vendor_ids.is_empty() {
            matrix.push(Dimension::Vendor, |i| spec.vendor_ids.contains(&items[i].vendor_id));
        }

        let working_set = matrix.positions_except(None);
        debug!(
            "filtered {} items to {} ({} before vendor filter)",
            items.len(),
            working_set.len(),
            before_vendor.len()
        );

        FilterOutcome {
            matrix,
            before_vendor,
            working_set,
        }
    }
}

fn price_in_range(item: &CatalogItem, min: Option<f64>, max: Option<f64>) -> bool {
    item.price.is_finite()
        && min.is_none_or(|min| item.price >= min)
        && max.is_none_or(|max| item.price <= max)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::catalog::item::{NamedParameter, SizeStock, VariantFacet};

    fn snapshot() -> CatalogSnapshot {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let items = vec![
            CatalogItem::new(1, "Red Tee", 20.0, created)
                .with_category(1, "Shirts")
                .with_vendor(10, "Acme")
                .with_group(100)
                .with_stars(4.5, 10),
            CatalogItem::new(2, "Blue Tee", 30.0, created)
                .with_category(1, "Shirts")
                .with_vendor(11, "Globex")
                .with_group(101)
                .with_stock(0),
            CatalogItem::new(3, "Wool Coat", 250.0, created)
                .with_category(2, "Coats")
                .with_vendor(10, "Acme")
                .with_stars(3.0, 2),
        ];
        CatalogSnapshot::new(
            items,
            vec![
                NamedParameter::new(1, "Material", "Cotton"),
                NamedParameter::new(1, "Fit", "Slim"),
                NamedParameter::new(2, "Material", "Cotton"),
                NamedParameter::new(3, "Material", "Wool"),
            ],
            vec![
                VariantFacet::new(100, "Color", "Red"),
                VariantFacet::new(101, "Color", "Blue"),
            ],
            vec![SizeStock::new(2, "Medium", 3)],
        )
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(&EngineConfig::default())
    }

    #[test]
    fn test_empty_spec_keeps_in_stock_items() {
        let outcome = engine().filter(&snapshot(), &FilterSpec::new());
        assert_eq!(outcome.working_set, vec![0, 1, 2]);
        assert_eq!(outcome.before_vendor, vec![0, 1, 2]);
    }

    #[test]
    fn test_conjunction_across_dimensions() {
        let spec = FilterSpec::new().category(1).price_range(Some(25.0), None);
        let outcome = engine().filter(&snapshot(), &spec);
        assert_eq!(outcome.working_set, vec![1]);
    }

    #[test]
    fn test_rating_floor_excludes_unrated() {
        let spec = FilterSpec::new().min_rating(3.0);
        let outcome = engine().filter(&snapshot(), &spec);
        assert_eq!(outcome.working_set, vec![0, 2]);
    }

    #[test]
    fn test_color_and_size_selection() {
        let outcome = engine().filter(&snapshot(), &FilterSpec::new().color("red").color("BLUE"));
        assert_eq!(outcome.working_set, vec![0, 1]);

        // "Medium" and "m" normalize to the same size.
        let outcome = engine().filter(&snapshot(), &FilterSpec::new().size("m"));
        assert_eq!(outcome.working_set, vec![1]);
    }

    #[test]
    fn test_parameters_and_within_or_across() {
        let spec = FilterSpec::new()
            .parameter("Material", "Cotton")
            .parameter("Material", "Wool");
        assert_eq!(engine().filter(&snapshot(), &spec).working_set, vec![0, 1, 2]);

        let spec = FilterSpec::new()
            .parameter("Material", "Cotton")
            .parameter("Fit", "Slim");
        assert_eq!(engine().filter(&snapshot(), &spec).working_set, vec![0]);
    }

    #[test]
    fn test_vendor_applied_last() {
        let spec = FilterSpec::new().category(1).vendor(10);
        let outcome = engine().filter(&snapshot(), &spec);
        assert_eq!(outcome.before_vendor, vec![0, 1]);
        assert_eq!(outcome.working_set, vec![0]);
        assert_eq!(outcome.matrix.dimensions().last(), Some(&Dimension::Vendor));
    }

    #[test]
    fn test_failures() {
        let spec = FilterSpec::new().category(1).vendor(10);
        let outcome = engine().filter(&snapshot(), &spec);
        assert_eq!(outcome.matrix.failures(0), Failures::None);
        assert_eq!(outcome.matrix.failures(1), Failures::One(&Dimension::Vendor));
        assert_eq!(outcome.matrix.failures(2), Failures::One(&Dimension::Category));
        assert_eq!(
            outcome.matrix.positions_except(Some(&Dimension::Category)),
            vec![0, 2]
        );
    }
}
