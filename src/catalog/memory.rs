//! In-memory catalog collaborator, loadable from a JSON document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::catalog::item::{
    CatalogItem, GroupId, ItemId, ItemImage, NamedParameter, ReviewStats, SizeStock,
    VariantFacet,
};
use crate::catalog::source::{CatalogSource, DisplayDataSource, FetchScope};
use crate::error::Result;

/// A catalog held entirely in memory.
///
/// ```json
/// {
///   "items": [ ... ],
///   "parameters": [ ... ],
///   "variants": [ ... ],
///   "sizes": [ ... ],
///   "images": [ ... ],
///   "reviewStats": { "1": { "reviewCount": 3, "starsHistogram": [0, 0, 1, 1, 1] } }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryCatalog {
    pub items: Vec<CatalogItem>,
    pub parameters: Vec<NamedParameter>,
    pub variants: Vec<VariantFacet>,
    pub sizes: Vec<SizeStock>,
    pub images: Vec<ItemImage>,
    pub review_stats: BTreeMap<ItemId, ReviewStats>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl CatalogSource for MemoryCatalog {
    fn items(&self, scope: &FetchScope) -> Result<Vec<CatalogItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| scope.contains(item))
            .cloned()
            .collect())
    }

    fn parameters(&self, item_ids: &[ItemId]) -> Result<Vec<NamedParameter>> {
        Ok(self
            .parameters
            .iter()
            .filter(|parameter| item_ids.contains(&parameter.item_id))
            .cloned()
            .collect())
    }

    fn variants(&self, group_ids: &[GroupId]) -> Result<Vec<VariantFacet>> {
        Ok(self
            .variants
            .iter()
            .filter(|variant| group_ids.contains(&variant.group_id))
            .cloned()
            .collect())
    }

    fn sizes(&self, item_ids: &[ItemId]) -> Result<Vec<SizeStock>> {
        Ok(self
            .sizes
            .iter()
            .filter(|size| item_ids.contains(&size.item_id))
            .cloned()
            .collect())
    }
}

impl DisplayDataSource for MemoryCatalog {
    fn primary_images(&self, item_ids: &[ItemId]) -> Result<AHashMap<ItemId, String>> {
        // An explicit primary image wins; otherwise the lowest position.
        let mut chosen: AHashMap<ItemId, &ItemImage> = AHashMap::new();
        for image in self.images.iter().filter(|image| item_ids.contains(&image.item_id)) {
            let replace = match chosen.get(&image.item_id) {
                None => true,
                Some(current) => {
                    (image.is_primary, std::cmp::Reverse(image.position))
                        > (current.is_primary, std::cmp::Reverse(current.position))
                }
            };
            if replace {
                chosen.insert(image.item_id, image);
            }
        }
        Ok(chosen
            .into_iter()
            .map(|(id, image)| (id, image.url.clone()))
            .collect())
    }

    fn review_stats(&self, item_ids: &[ItemId]) -> Result<AHashMap<ItemId, ReviewStats>> {
        Ok(item_ids
            .iter()
            .filter_map(|id| self.review_stats.get(id).map(|stats| (*id, stats.clone())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_image_selection() -> Result<()> {
        let catalog = MemoryCatalog {
            images: vec![
                ItemImage { item_id: 1, url: "b.jpg".into(), is_primary: false, position: 2 },
                ItemImage { item_id: 1, url: "a.jpg".into(), is_primary: false, position: 1 },
                ItemImage { item_id: 2, url: "x.jpg".into(), is_primary: false, position: 0 },
                ItemImage { item_id: 2, url: "main.jpg".into(), is_primary: true, position: 5 },
            ],
            ..MemoryCatalog::default()
        };

        let images = catalog.primary_images(&[1, 2, 3])?;
        assert_eq!(images.get(&1).map(String::as_str), Some("a.jpg"));
        assert_eq!(images.get(&2).map(String::as_str), Some("main.jpg"));
        assert!(!images.contains_key(&3));
        Ok(())
    }

    #[test]
    fn test_from_json() -> Result<()> {
        let json = r#"{
            "items": [{"itemId": 1, "categoryId": 1, "vendorId": 1, "title": "Mug",
                       "price": 5.0, "createdAt": "2024-01-01T00:00:00Z"}],
            "reviewStats": {"1": {"reviewCount": 2, "starsHistogram": [0, 0, 0, 1, 1]}}
        }"#;
        let catalog: MemoryCatalog = serde_json::from_str(json)?;
        assert_eq!(catalog.items.len(), 1);
        assert_eq!(catalog.review_stats(&[1])?[&1].review_count, 2);
        Ok(())
    }
}
