//! An immutable, joined view of catalog rows and their side tables.

use ahash::AHashMap;
use log::debug;

use crate::catalog::item::{
    CatalogItem, GroupId, ItemId, NamedParameter, SizeStock, VariantFacet,
};
use crate::catalog::source::{CatalogSource, FetchScope};
use crate::error::Result;

/// Catalog items together with their parameters, variants and size stock.
///
/// Side tables are grouped by the key the engine looks them up with; row order
/// within a group is the order the rows were supplied in.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    items: Vec<CatalogItem>,
    parameters: AHashMap<ItemId, Vec<NamedParameter>>,
    variants: AHashMap<GroupId, Vec<VariantFacet>>,
    sizes: AHashMap<ItemId, Vec<SizeStock>>,
}

impl CatalogSnapshot {
    /// Build a snapshot from already-fetched rows.
    pub fn new(
        items: Vec<CatalogItem>,
        parameters: Vec<NamedParameter>,
        variants: Vec<VariantFacet>,
        sizes: Vec<SizeStock>,
    ) -> Self {
        let mut by_item: AHashMap<ItemId, Vec<NamedParameter>> = AHashMap::new();
        for parameter in parameters {
            by_item.entry(parameter.item_id).or_default().push(parameter);
        }

        let mut by_group: AHashMap<GroupId, Vec<VariantFacet>> = AHashMap::new();
        for variant in variants {
            by_group.entry(variant.group_id).or_default().push(variant);
        }

        let mut sizes_by_item: AHashMap<ItemId, Vec<SizeStock>> = AHashMap::new();
        for size in sizes {
            sizes_by_item.entry(size.item_id).or_default().push(size);
        }

        CatalogSnapshot {
            items,
            parameters: by_item,
            variants: by_group,
            sizes: sizes_by_item,
        }
    }

    /// Fetch items for `scope`, then their three side tables concurrently.
    ///
    /// All fetches must succeed; the first failure is returned.
    pub fn fetch(source: &dyn CatalogSource, scope: &FetchScope) -> Result<Self> {
        let items = source.items(scope)?;
        let item_ids: Vec<ItemId> = items.iter().map(|item| item.item_id).collect();
        let mut group_ids: Vec<GroupId> = items.iter().filter_map(|item| item.group_id).collect();
        group_ids.sort_unstable();
        group_ids.dedup();

        let (parameters, (variants, sizes)) = rayon::join(
            || source.parameters(&item_ids),
            || {
                rayon::join(
                    || source.variants(&group_ids),
                    || source.sizes(&item_ids),
                )
            },
        );
        let (parameters, variants, sizes) = (parameters?, variants?, sizes?);

        debug!(
            "fetched snapshot: {} items, {} parameters, {} variants, {} size rows",
            items.len(),
            parameters.len(),
            variants.len(),
            sizes.len()
        );

        Ok(Self::new(items, parameters, variants, sizes))
    }

    /// All items in supply order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Named parameters of an item.
    pub fn parameters_of(&self, item: &CatalogItem) -> &[NamedParameter] {
        self.parameters
            .get(&item.item_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Variant facets of the item's group.
    pub fn variants_of(&self, item: &CatalogItem) -> &[VariantFacet] {
        item.group_id
            .and_then(|group| self.variants.get(&group))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Size stock rows of an item.
    pub fn sizes_of(&self, item: &CatalogItem) -> &[SizeStock] {
        self.sizes
            .get(&item.item_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Values of the given variant dimension for an item (dimension compared
    /// case-insensitively).
    pub fn variant_values<'a>(
        &'a self,
        item: &CatalogItem,
        dimension: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.variants_of(item)
            .iter()
            .filter(move |variant| variant.dimension.eq_ignore_ascii_case(dimension))
            .map(|variant| variant.value.as_str())
    }

    /// Item stock plus the stock of all its sizes.
    pub fn effective_stock(&self, item: &CatalogItem) -> u64 {
        let sized: u64 = self
            .sizes_of(item)
            .iter()
            .map(|size| u64::from(size.qty))
            .sum();
        u64::from(item.stock) + sized
    }

    /// Whether the item can be sold: `stock > 0` or any size has stock.
    pub fn is_in_stock(&self, item: &CatalogItem) -> bool {
        self.effective_stock(item) > 0
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn snapshot() -> CatalogSnapshot {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let items = vec![
            CatalogItem::new(1, "Tee", 10.0, created).with_stock(0).with_group(42),
            CatalogItem::new(2, "Hoodie", 40.0, created).with_stock(0),
        ];
        CatalogSnapshot::new(
            items,
            vec![NamedParameter::new(1, "Material", "Cotton")],
            vec![
                VariantFacet::new(42, "Color", "Red"),
                VariantFacet::new(42, "color", "Blue"),
                VariantFacet::new(42, "Fit", "Slim"),
            ],
            vec![SizeStock::new(1, "M", 3), SizeStock::new(2, "L", 0)],
        )
    }

    #[test]
    fn test_effective_stock() {
        let snapshot = snapshot();
        let items = snapshot.items();
        assert_eq!(snapshot.effective_stock(&items[0]), 3);
        assert!(snapshot.is_in_stock(&items[0]));
        assert!(!snapshot.is_in_stock(&items[1]));
    }

    #[test]
    fn test_side_table_lookup() {
        let snapshot = snapshot();
        let items = snapshot.items();
        let colors: Vec<&str> = snapshot.variant_values(&items[0], "Color").collect();
        assert_eq!(colors, vec!["Red", "Blue"]);
        assert_eq!(snapshot.parameters_of(&items[0]).len(), 1);
        assert!(snapshot.parameters_of(&items[1]).is_empty());
        assert!(snapshot.variants_of(&items[1]).is_empty());
    }
}
