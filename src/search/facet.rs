//! Facet extraction.
//!
//! Facets list the values a caller can select next. Every value set for a
//! dimension is drawn from the items that pass every *other* active filter, so
//! selecting a value never hides its siblings or shrinks its own count.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::item::{CategoryId, VendorId};
use crate::catalog::snapshot::CatalogSnapshot;
use crate::config::FacetConfig;
use crate::query::filter::{Dimension, Failures, FilterOutcome, FilterSpec};

/// A category or vendor offered as a facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdFacet {
    pub id: u64,
    pub name: String,
    /// Items with this value in the final working set.
    pub present: u64,
}

/// A selectable value and the number of items carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

/// Facets of one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub category: Vec<IdFacet>,
    pub vendor: Vec<IdFacet>,
    #[serde(rename = "Colors")]
    pub colors: Vec<ValueCount>,
    #[serde(rename = "Sizes")]
    pub sizes: Vec<ValueCount>,
    /// Named-parameter dimensions, keyed by parameter name.
    #[serde(flatten)]
    pub parameters: BTreeMap<String, Vec<ValueCount>>,
}

impl Facets {
    /// Count of a color value, compared case-insensitively.
    pub fn color_count(&self, color: &str) -> Option<u64> {
        find_count(&self.colors, color)
    }

    /// Count of a size value, compared case-insensitively.
    pub fn size_count(&self, size: &str) -> Option<u64> {
        find_count(&self.sizes, size)
    }
}

fn find_count(values: &[ValueCount], value: &str) -> Option<u64> {
    values
        .iter()
        .find(|entry| entry.value.eq_ignore_ascii_case(value))
        .map(|entry| entry.count)
}

/// Maps raw size names onto one spelling per size and orders them.
#[derive(Debug, Clone)]
pub struct SizeNormalizer {
    synonyms: AHashMap<String, String>,
    canonical: Vec<String>,
}

impl SizeNormalizer {
    pub fn new(config: &FacetConfig) -> Self {
        let synonyms = config
            .size_synonyms
            .iter()
            .map(|(alias, canonical)| (alias.trim().to_lowercase(), canonical.clone()))
            .collect();
        SizeNormalizer {
            synonyms,
            canonical: config.canonical_sizes.clone(),
        }
    }

    /// Normalized name of a size, `None` for blank input.
    ///
    /// Synonyms and canonical sizes map to the canonical spelling; anything
    /// else is upper-cased so that `"one size"` and `"One Size"` collapse.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        if let Some(canonical) = self.synonyms.get(&lower) {
            return Some(canonical.clone());
        }
        if let Some(canonical) = self.canonical.iter().find(|c| c.eq_ignore_ascii_case(&lower)) {
            return Some(canonical.clone());
        }
        Some(trimmed.to_uppercase())
    }

    /// Canonical sizes first in configured order, then numeric sizes
    /// ascending, then everything else alphabetically.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a)
            .partial_cmp(&self.rank(b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(b))
    }

    fn rank(&self, size: &str) -> (u8, f64) {
        if let Some(position) = self.canonical.iter().position(|c| c == size) {
            return (0, position as f64);
        }
        match size.parse::<f64>() {
            Ok(number) if number.is_finite() => (1, number),
            _ => (2, 0.0),
        }
    }
}

/// Per-dimension value counter that keeps the first spelling seen per value.
#[derive(Debug, Default)]
struct ValueTally {
    counts: BTreeMap<String, (String, u64)>,
}

impl ValueTally {
    fn add_item<'a, I: IntoIterator<Item = &'a str>>(&mut self, values: I) {
        let mut seen = BTreeSet::new();
        for value in values {
            let key = value.to_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }
            self.counts
                .entry(key)
                .or_insert_with(|| (value.to_string(), 0))
                .1 += 1;
        }
    }

    fn distinct(&self) -> usize {
        self.counts.len()
    }

    fn into_values(self) -> Vec<ValueCount> {
        self.counts
            .into_values()
            .map(|(value, count)| ValueCount { value, count })
            .collect()
    }
}

/// Keys [`Facets`] serializes beside its flattened parameter dimensions.
const RESERVED_KEYS: [&str; 4] = ["category", "vendor", "Colors", "Sizes"];

/// Derives facet dimensions and their values from a filtered snapshot.
#[derive(Debug, Clone)]
pub struct FacetExtractor {
    blacklist: BTreeSet<String>,
    sizes: SizeNormalizer,
    color_dimension: String,
    max_dimensions: usize,
}

impl FacetExtractor {
    pub fn new(config: &FacetConfig) -> Self {
        FacetExtractor {
            blacklist: config
                .parameter_blacklist
                .iter()
                .map(|name| name.to_lowercase())
                .collect(),
            sizes: SizeNormalizer::new(config),
            color_dimension: config.color_dimension.clone(),
            max_dimensions: config.max_dimensions,
        }
    }

    /// Whether a parameter name may be offered as a facet. Names that would
    /// collide with a fixed facet key are never offered.
    pub fn is_facetable(&self, name: &str) -> bool {
        !name.trim().is_empty()
            && !self.blacklist.contains(&name.to_lowercase())
            && !RESERVED_KEYS.iter().any(|key| key.eq_ignore_ascii_case(name.trim()))
    }

    /// Extract facets for a filter outcome over `snapshot`.
    pub fn extract(
        &self,
        snapshot: &CatalogSnapshot,
        outcome: &FilterOutcome,
        spec: &FilterSpec,
    ) -> Facets {
        let items = snapshot.items();
        let working: BTreeSet<usize> = outcome.working_set.iter().copied().collect();

        let mut category: Vec<IdFacet> = Vec::new();
        let mut vendor: Vec<IdFacet> = Vec::new();
        let mut category_slot: AHashMap<CategoryId, usize> = AHashMap::new();
        let mut vendor_slot: AHashMap<VendorId, usize> = AHashMap::new();

        let mut colors = ValueTally::default();
        let mut sizes = ValueTally::default();
        let mut parameters: BTreeMap<String, ValueTally> = BTreeMap::new();

        for (position, item) in items.iter().enumerate() {
            let present = u64::from(working.contains(&position));

            let slot = *category_slot.entry(item.category_id).or_insert_with(|| {
                category.push(IdFacet {
                    id: item.category_id,
                    name: item.category_name.clone(),
                    present: 0,
                });
                category.len() - 1
            });
            category[slot].present += present;

            let slot = *vendor_slot.entry(item.vendor_id).or_insert_with(|| {
                vendor.push(IdFacet {
                    id: item.vendor_id,
                    name: item.vendor_name.clone(),
                    present: 0,
                });
                vendor.len() - 1
            });
            vendor[slot].present += present;

            let failures = outcome.matrix.failures(position);
            let counts_for = |dimension: &Dimension| match failures {
                Failures::None => true,
                Failures::One(failed) => failed == dimension,
                Failures::Many => false,
            };
            if matches!(failures, Failures::Many) {
                continue;
            }

            if counts_for(&Dimension::Color) {
                colors.add_item(
                    snapshot
                        .variant_values(item, &self.color_dimension)
                        .map(str::trim)
                        .filter(|value| !value.is_empty()),
                );
            }

            if counts_for(&Dimension::Size) {
                let names: Vec<String> = snapshot
                    .sizes_of(item)
                    .iter()
                    .filter(|row| spec.include_out_of_stock || row.qty > 0)
                    .filter_map(|row| self.sizes.normalize(&row.size_name))
                    .collect();
                sizes.add_item(names.iter().map(String::as_str));
            }

            let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for parameter in snapshot.parameters_of(item) {
                let value = parameter.value.trim();
                if !self.is_facetable(&parameter.name) || value.is_empty() || value.contains('#') {
                    continue;
                }
                by_name.entry(parameter.name.as_str()).or_default().push(value);
            }
            for (name, values) in by_name {
                if counts_for(&Dimension::Parameter(name.to_string())) {
                    parameters.entry(name.to_string()).or_default().add_item(values);
                }
            }
        }

        let mut ranked: Vec<(String, ValueTally)> = parameters.into_iter().collect();
        ranked.sort_by(|(a_name, a), (b_name, b)| {
            b.distinct().cmp(&a.distinct()).then_with(|| a_name.cmp(b_name))
        });
        ranked.truncate(self.max_dimensions);

        let mut sizes = sizes.into_values();
        sizes.sort_by(|a, b| self.sizes.compare(&a.value, &b.value));

        let facets = Facets {
            category,
            vendor,
            colors: colors.into_values(),
            sizes,
            parameters: ranked
                .into_iter()
                .map(|(name, tally)| (name, tally.into_values()))
                .collect(),
        };
        debug!(
            "extracted facets: {} colors, {} sizes, {} parameter dimensions",
            facets.colors.len(),
            facets.sizes.len(),
            facets.parameters.len()
        );
        facets
    }
}
