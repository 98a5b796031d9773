//! Catalog rows as read from the catalog store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::query::matcher::Matchable;
use crate::query::sort::{SortValue, Sortable};

/// Identifier of a catalog item.
pub type ItemId = u64;
/// Identifier of a category.
pub type CategoryId = u64;
/// Identifier of a vendor.
pub type VendorId = u64;
/// Identifier shared by the color/size variants of one product.
pub type GroupId = u64;

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub item_id: ItemId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub category_name: String,
    pub vendor_id: VendorId,
    #[serde(default)]
    pub vendor_name: String,
    /// Variant group; `None` for items without variants.
    #[serde(default)]
    pub group_id: Option<GroupId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub is_available: bool,
    /// Average review stars; `None` until the item has been reviewed.
    #[serde(default)]
    pub stars_avg: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl CatalogItem {
    /// Create an in-stock item with no category, vendor, or reviews.
    pub fn new<S: Into<String>>(
        item_id: ItemId,
        title: S,
        price: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        CatalogItem {
            item_id,
            category_id: 0,
            category_name: String::new(),
            vendor_id: 0,
            vendor_name: String::new(),
            group_id: None,
            title: title.into(),
            description: None,
            keywords: None,
            price,
            list_price: None,
            stock: 1,
            is_available: true,
            stars_avg: None,
            review_count: 0,
            created_at,
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category_id: CategoryId, name: S) -> Self {
        self.category_id = category_id;
        self.category_name = name.into();
        self
    }

    pub fn with_vendor<S: Into<String>>(mut self, vendor_id: VendorId, name: S) -> Self {
        self.vendor_id = vendor_id;
        self.vendor_name = name.into();
        self
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: S) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_list_price(mut self, list_price: f64) -> Self {
        self.list_price = Some(list_price);
        self
    }

    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_stars(mut self, stars_avg: f64, review_count: u32) -> Self {
        self.stars_avg = Some(stars_avg);
        self.review_count = review_count;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Text of a named free-text field, if the item has it.
    pub fn text_field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => Some(self.title.as_str()),
            "description" => self.description.as_deref(),
            "keywords" => self.keywords.as_deref(),
            "categoryName" => Some(self.category_name.as_str()),
            "vendorName" => Some(self.vendor_name.as_str()),
            _ => None,
        }
    }

    /// Relative markdown against the list price, when one is known.
    pub fn discount(&self) -> Option<f64> {
        match self.list_price {
            Some(list) if list > 0.0 && self.price.is_finite() => Some((list - self.price) / list),
            _ => None,
        }
    }
}

impl Sortable for CatalogItem {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "itemId" | "id" => Some(SortValue::UInt(self.item_id)),
            "price" => Some(SortValue::Float(self.price)),
            "listPrice" => self.list_price.map(SortValue::Float),
            "discount" => self.discount().map(SortValue::Float),
            "stars" | "starsAvg" => self.stars_avg.map(SortValue::Float),
            "reviewCount" => Some(SortValue::Int(i64::from(self.review_count))),
            "stock" => Some(SortValue::Int(i64::from(self.stock))),
            "title" => Some(SortValue::Text(self.title.to_lowercase())),
            "createdAt" => Some(SortValue::Time(self.created_at)),
            _ => None,
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Matchable for CatalogItem {
    fn match_key(&self) -> u64 {
        self.item_id
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        CatalogItem::text_field(self, name)
    }
}

/// A variant attribute shared by every item of a group, e.g. `(42, "Color", "Red")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantFacet {
    pub group_id: GroupId,
    pub dimension: String,
    pub value: String,
}

impl VariantFacet {
    pub fn new<D: Into<String>, V: Into<String>>(group_id: GroupId, dimension: D, value: V) -> Self {
        VariantFacet {
            group_id,
            dimension: dimension.into(),
            value: value.into(),
        }
    }
}

/// Per-size stock of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeStock {
    pub item_id: ItemId,
    pub size_name: String,
    pub qty: u32,
}

impl SizeStock {
    pub fn new<S: Into<String>>(item_id: ItemId, size_name: S, qty: u32) -> Self {
        SizeStock {
            item_id,
            size_name: size_name.into(),
            qty,
        }
    }
}

/// A free-form specification attribute of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedParameter {
    pub item_id: ItemId,
    pub name: String,
    pub value: String,
}

impl NamedParameter {
    pub fn new<N: Into<String>, V: Into<String>>(item_id: ItemId, name: N, value: V) -> Self {
        NamedParameter {
            item_id,
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An image attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemImage {
    pub item_id: ItemId,
    pub url: String,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub position: u32,
}

/// Review aggregate for one item. `stars_histogram[i]` counts reviews with `i + 1` stars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub review_count: u32,
    pub stars_histogram: [u32; 5],
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn item() -> CatalogItem {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        CatalogItem::new(7, "Trail Runner", 80.0, created)
            .with_description("Lightweight running shoe")
            .with_list_price(100.0)
    }

    #[test]
    fn test_text_fields() {
        let item = item();
        assert_eq!(item.text_field("title"), Some("Trail Runner"));
        assert_eq!(item.text_field("description"), Some("Lightweight running shoe"));
        assert_eq!(item.text_field("keywords"), None);
        assert_eq!(item.text_field("nonexistent"), None);
    }

    #[test]
    fn test_sort_values() {
        let item = item();
        assert_eq!(item.sort_value("price"), Some(SortValue::Float(80.0)));
        assert_eq!(item.sort_value("stars"), None);
        assert_eq!(item.sort_value("discount"), Some(SortValue::Float(0.2)));
        assert_eq!(item.sort_value("color"), None);
    }

    #[test]
    fn test_large_item_ids_sort_numerically() -> crate::error::Result<()> {
        use crate::query::sort::{SortSpec, sort};

        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let items = vec![
            CatalogItem::new(u64::MAX, "Last", 1.0, created),
            CatalogItem::new(1, "First", 1.0, created),
            CatalogItem::new(1 << 63, "Middle", 1.0, created),
        ];
        let sorted = sort(&items, &SortSpec::parse("itemId_asc")?);
        let ids: Vec<ItemId> = sorted.iter().map(|item| item.item_id).collect();
        assert_eq!(ids, vec![1, 1 << 63, u64::MAX]);
        Ok(())
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "itemId": 1, "categoryId": 2, "vendorId": 3, "title": "Mug",
            "price": 9.5, "createdAt": "2024-01-01T00:00:00Z"
        }"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();
        assert!(item.is_available);
        assert_eq!(item.stock, 0);
        assert_eq!(item.group_id, None);
        assert_eq!(item.stars_avg, None);
    }
}
