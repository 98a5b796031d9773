//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::Serialize;

use crate::catalog::item::CatalogItem;
use crate::cli::args::{BazaarArgs, OutputFormat};
use crate::error::Result;
use crate::feed::record::ActivityRecord;
use crate::query::matcher::FieldMatch;
use crate::search::aggregation::{CategoryCount, VendorCount};
use crate::search::cursor::CursorPage;
use crate::search::engine::{CatalogHit, CatalogSearchResult};
use crate::search::facet::{Facets, ValueCount};

/// Price bucket labels, aligned with the aggregation histogram.
const PRICE_LABELS: [&str; 5] = ["<= 25", "25 - 50", "50 - 100", "100 - 200", "> 200"];

/// Rating bucket labels, aligned with the aggregation histogram.
const RATING_LABELS: [&str; 4] = [">= 4", "3 - 4", "2 - 3", "< 2"];

/// A result that can also be rendered as plain text.
pub trait HumanReadable: Serialize {
    fn to_human(&self) -> String;
}

/// Result structure for catalog search.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub page: usize,
    #[serde(flatten)]
    pub result: CatalogSearchResult,
}

impl SearchOutput {
    pub fn new(page: usize, result: CatalogSearchResult) -> Self {
        SearchOutput { page, result }
    }
}

/// Result structure for a feed page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOutput {
    #[serde(flatten)]
    pub page: CursorPage<ActivityRecord>,
    /// `TYPE:ID` token for `--cursor`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl From<CursorPage<ActivityRecord>> for FeedOutput {
    fn from(page: CursorPage<ActivityRecord>) -> Self {
        let next_cursor = page.next_cursor().map(|cursor| cursor.to_string());
        FeedOutput { page, next_cursor }
    }
}

/// Result structure for facet listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetsOutput {
    pub total_count: usize,
    pub categories: Vec<CategoryCount>,
    pub vendors: Vec<VendorCount>,
    pub prices: [u64; 5],
    pub ratings: [u64; 4],
    pub filters: Facets,
}

impl From<CatalogSearchResult> for FacetsOutput {
    fn from(result: CatalogSearchResult) -> Self {
        FacetsOutput {
            total_count: result.total_count,
            categories: result.categories,
            vendors: result.vendors,
            prices: result.prices,
            ratings: result.ratings,
            filters: result.filters,
        }
    }
}

impl HumanReadable for SearchOutput {
    fn to_human(&self) -> String {
        let result = &self.result;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} items match (page {}, sorted by {}{})",
            result.total_count,
            self.page,
            result.sort,
            if result.has_next_page { ", more pages" } else { "" }
        );
        let _ = writeln!(out, "═══════════════");
        for (i, hit) in result.batch.iter().enumerate() {
            write_hit(&mut out, i + 1, hit);
        }
        write_aggregations(
            &mut out,
            &result.categories,
            &result.vendors,
            &result.prices,
            &result.ratings,
        );
        out
    }
}

impl HumanReadable for FeedOutput {
    fn to_human(&self) -> String {
        let page = &self.page;
        let mut out = String::new();
        let _ = writeln!(out, "{} records in feed", page.total_count);
        let _ = writeln!(out, "═══════════════");
        for record in &page.batch {
            let id = record
                .id()
                .map_or_else(|| "-".to_string(), |id| id.to_string());
            let _ = writeln!(
                out,
                "{} {:<14} #{:<6} author {:<6} {}",
                record.created_at().format("%Y-%m-%d %H:%M"),
                record.kind().as_str(),
                id,
                record.author_id(),
                record.body()
            );
        }
        match (&self.next_cursor, page.has_next_page) {
            (Some(cursor), true) => {
                let _ = writeln!(out, "\nNext page: --cursor {cursor}");
            }
            _ => {
                let _ = writeln!(out, "\nEnd of feed");
            }
        }
        out
    }
}

impl HumanReadable for FacetsOutput {
    fn to_human(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} items match", self.total_count);
        write_aggregations(&mut out, &self.categories, &self.vendors, &self.prices, &self.ratings);
        write_values(&mut out, "Colors", &self.filters.colors);
        write_values(&mut out, "Sizes", &self.filters.sizes);
        for (name, values) in &self.filters.parameters {
            write_values(&mut out, name, values);
        }
        out
    }
}

fn write_hit(out: &mut String, rank: usize, hit: &CatalogHit) {
    let item = &hit.item;
    let _ = writeln!(out);
    let _ = writeln!(out, "{rank}. {} [#{}]", item.title, item.item_id);
    let _ = writeln!(out, "─────────────");
    let _ = write!(out, "   {:.2}", item.price);
    if let Some(list) = item.list_price {
        let _ = write!(out, " (list {list:.2})");
    }
    if let Some(stars) = item.stars_avg {
        let _ = write!(out, "  {stars:.1} stars");
    }
    let _ = writeln!(out, "  {} reviews", hit.review_count);
    let _ = writeln!(out, "   {} / {}", item.category_name, item.vendor_name);
    if let Some(image) = &hit.primary_image {
        let _ = writeln!(out, "   image: {image}");
    }
    for field in &hit.highlights {
        let _ = writeln!(out, "   {}: {}", field.field, highlight(&hit.item, field));
    }
}

/// The field text with each span wrapped in brackets.
fn highlight(item: &CatalogItem, field: &FieldMatch) -> String {
    let Some(text) = item.text_field(&field.field) else {
        return String::new();
    };
    let mut marked = String::new();
    for (i, c) in text.chars().enumerate() {
        if field.spans.iter().any(|span| span.start == i) {
            marked.push('[');
        }
        marked.push(c);
        if field.spans.iter().any(|span| span.end == i + 1) {
            marked.push(']');
        }
    }
    marked
}

fn write_aggregations(
    out: &mut String,
    categories: &[CategoryCount],
    vendors: &[VendorCount],
    prices: &[u64; 5],
    ratings: &[u64; 4],
) {
    let _ = writeln!(out, "\nCategories:");
    for category in categories {
        let _ = writeln!(out, "  {:<24} {}", category.name, category.count);
    }
    let _ = writeln!(out, "Vendors:");
    for vendor in vendors {
        let marker = if vendor.present { "*" } else { " " };
        let _ = writeln!(out, " {marker}{:<24} {}", vendor.name, vendor.count);
    }
    let _ = writeln!(out, "Prices:");
    for (label, count) in PRICE_LABELS.iter().zip(prices) {
        let _ = writeln!(out, "  {label:<24} {count}");
    }
    let _ = writeln!(out, "Ratings:");
    for (label, count) in RATING_LABELS.iter().zip(ratings) {
        let _ = writeln!(out, "  {label:<24} {count}");
    }
}

fn write_values(out: &mut String, name: &str, values: &[ValueCount]) {
    let _ = writeln!(out, "{name}:");
    for entry in values {
        let _ = writeln!(out, "  {:<24} {}", entry.value, entry.count);
    }
}

/// Output a result in the specified format.
pub fn output_result<T: HumanReadable>(message: &str, result: &T, args: &BazaarArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: HumanReadable>(message: &str, result: &T, args: &BazaarArgs) -> Result<()> {
    if args.verbosity() > 1 {
        println!("{message}");
        println!();
    }
    print!("{}", result.to_human());
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &BazaarArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::query::matcher::Span;

    #[test]
    fn test_highlight_marks_spans() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let item = CatalogItem::new(1, "Rain Jacket", 10.0, created);
        let field = FieldMatch {
            field: "title".into(),
            edits: 0,
            score: 0.0,
            spans: vec![Span { start: 5, end: 11 }],
        };
        assert_eq!(highlight(&item, &field), "Rain [Jacket]");
    }

    #[test]
    fn test_feed_output_cursor_token() {
        let page: CursorPage<ActivityRecord> = CursorPage {
            batch: Vec::new(),
            total_count: 12,
            has_next_page: true,
            end_cursor: Some(10),
            end_cursor_type: Some("Review".into()),
        };
        let output = FeedOutput::from(page);
        assert_eq!(output.next_cursor.as_deref(), Some("Review:10"));
        assert!(output.to_human().contains("--cursor Review:10"));
    }
}
