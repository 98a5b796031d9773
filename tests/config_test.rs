//! Loading engine configuration from disk.

use std::fs;

use bazaar::catalog::{CatalogItem, CatalogSnapshot, NoDisplayData, SizeStock};
use bazaar::config::EngineConfig;
use bazaar::error::{EngineError, Result};
use bazaar::feed::FeedEngine;
use bazaar::query::FilterSpec;
use bazaar::search::{CatalogQuery, CatalogQueryEngine};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

fn write_config(dir: &TempDir, json: &str) -> Result<std::path::PathBuf> {
    let path = dir.path().join("bazaar.json");
    fs::write(&path, json)?;
    Ok(path)
}

#[test]
fn test_config_file_overrides_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = write_config(
        &dir,
        r#"{
            "facets": {"size_synonyms": {"petite": "XS"}},
            "pagination": {"catalog_page_size": 2, "default_sort": "price_asc"}
        }"#,
    )?;
    let config = EngineConfig::from_file(&path)?;
    assert_eq!(config.pagination.catalog_page_size, 2);
    assert_eq!(config.pagination.feed_page_size, 10);

    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let items = (1..=3)
        .map(|id| CatalogItem::new(id, "Skirt", 40.0 - id as f64, created))
        .collect();
    let sizes = vec![SizeStock::new(1, "Petite", 1)];
    let snapshot = CatalogSnapshot::new(items, Vec::new(), Vec::new(), sizes);

    let engine = CatalogQueryEngine::new(config)?;
    let result = engine.search(&snapshot, &CatalogQuery::default(), &NoDisplayData)?;
    let ids: Vec<u64> = result.batch.iter().map(|hit| hit.item.item_id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(result.sort, "price_asc");

    // The configured synonym replaces the default table.
    assert_eq!(result.filters.size_count("XS"), Some(1));
    let by_alias = engine.search(
        &snapshot,
        &CatalogQuery::new(FilterSpec::new().size("petite")),
        &NoDisplayData,
    )?;
    assert_eq!(by_alias.total_count, 1);
    Ok(())
}

#[test]
fn test_invalid_config_file() -> Result<()> {
    let dir = TempDir::new()?;

    let path = write_config(&dir, r#"{"matcher": {"span_threshold": -0.5}}"#)?;
    assert!(matches!(EngineConfig::from_file(&path), Err(EngineError::Config(_))));

    let path = write_config(&dir, "{ not json")?;
    assert!(matches!(EngineConfig::from_file(&path), Err(EngineError::Json(_))));

    let missing = dir.path().join("missing.json");
    assert!(matches!(EngineConfig::from_file(&missing), Err(EngineError::Io(_))));

    let path = write_config(&dir, r#"{"pagination": {"feed_sort": "newest"}}"#)?;
    let config = EngineConfig::from_file(&path)?;
    assert!(matches!(FeedEngine::new(&config), Err(EngineError::Config(_))));
    Ok(())
}
