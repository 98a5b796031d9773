//! Read-only collaborators that supply catalog rows and display data.
//!
//! The engine never talks to a store itself. Implementations of these traits
//! wrap whatever persistence layer the host application has; every call is a
//! read of an independent table, so callers may issue them concurrently.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::item::{
    CatalogItem, CategoryId, GroupId, ItemId, NamedParameter, ReviewStats, SizeStock,
    VariantFacet, VendorId,
};
use crate::error::Result;

/// Which items a fetch covers. Unset fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchScope {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default)]
    pub item_ids: Option<Vec<ItemId>>,
}

impl FetchScope {
    /// Scope covering the whole catalog.
    pub fn all() -> Self {
        Self::default()
    }

    /// Scope covering a single category.
    pub fn category(category_id: CategoryId) -> Self {
        FetchScope {
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    /// Whether an item falls inside this scope.
    pub fn contains(&self, item: &CatalogItem) -> bool {
        self.category_id.is_none_or(|id| item.category_id == id)
            && self.vendor_id.is_none_or(|id| item.vendor_id == id)
            && self
                .item_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&item.item_id))
    }
}

/// Row-fetch capability for catalog items and their side tables.
pub trait CatalogSource: Send + Sync {
    /// Items inside `scope`.
    fn items(&self, scope: &FetchScope) -> Result<Vec<CatalogItem>>;

    /// Named parameters of the given items.
    fn parameters(&self, item_ids: &[ItemId]) -> Result<Vec<NamedParameter>>;

    /// Variant facets of the given groups.
    fn variants(&self, group_ids: &[GroupId]) -> Result<Vec<VariantFacet>>;

    /// Size stock of the given items.
    fn sizes(&self, item_ids: &[ItemId]) -> Result<Vec<SizeStock>>;
}

/// Denormalized display data fetched for a result page.
pub trait DisplayDataSource: Send + Sync {
    /// Primary image URL per item. Items without images are absent.
    fn primary_images(&self, item_ids: &[ItemId]) -> Result<AHashMap<ItemId, String>>;

    /// Review count and star histogram per item. Unreviewed items may be absent.
    fn review_stats(&self, item_ids: &[ItemId]) -> Result<AHashMap<ItemId, ReviewStats>>;
}

/// A display source with nothing to add; hits keep the counts on the item row.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplayData;

impl DisplayDataSource for NoDisplayData {
    fn primary_images(&self, _item_ids: &[ItemId]) -> Result<AHashMap<ItemId, String>> {
        Ok(AHashMap::new())
    }

    fn review_stats(&self, _item_ids: &[ItemId]) -> Result<AHashMap<ItemId, ReviewStats>> {
        Ok(AHashMap::new())
    }
}
