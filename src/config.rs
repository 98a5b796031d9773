//! Engine configuration.
//!
//! Facet constants (blacklist, size synonyms, canonical size order) live here
//! and are handed to the stages that need them at construction time.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Top-level configuration for the catalog and feed engines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Text matcher configuration.
    pub matcher: MatcherConfig,

    /// Facet extraction configuration.
    pub facets: FacetConfig,

    /// Page sizes, default sort tokens and cursor settings.
    pub pagination: PaginationConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON string. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        self.matcher.validate()?;
        self.facets.validate()?;
        self.pagination.validate()
    }
}

/// Configuration for the fuzzy text matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Item text fields the query is matched against, in priority order.
    pub fields: Vec<String>,

    /// Score threshold for inclusion filtering (0.0 = exact, 1.0 = anything).
    pub index_threshold: f64,

    /// Stricter score threshold used when producing highlight spans.
    pub span_threshold: f64,

    /// Minimum length, in characters, of a highlight span.
    pub min_match_len: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            fields: vec![
                "title".to_string(),
                "description".to_string(),
                "keywords".to_string(),
            ],
            index_threshold: 0.2,
            span_threshold: 0.1,
            min_match_len: 3,
        }
    }
}

impl MatcherConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("index_threshold", self.index_threshold),
            ("span_threshold", self.span_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::config(format!(
                    "matcher.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.min_match_len == 0 {
            return Err(EngineError::config("matcher.min_match_len must be positive"));
        }
        if self.fields.is_empty() {
            return Err(EngineError::config("matcher.fields must not be empty"));
        }
        Ok(())
    }
}

/// Configuration for facet extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacetConfig {
    /// Parameter names never offered as facets (compared case-insensitively).
    pub parameter_blacklist: BTreeSet<String>,

    /// Size aliases mapped to their canonical name (keys compared case-insensitively).
    pub size_synonyms: BTreeMap<String, String>,

    /// Canonical size names in display order.
    pub canonical_sizes: Vec<String>,

    /// Variant dimension name that carries colors.
    pub color_dimension: String,

    /// Maximum number of named-parameter dimensions returned.
    pub max_dimensions: usize,
}

impl Default for FacetConfig {
    fn default() -> Self {
        let parameter_blacklist = ["Id", "SKU", "EAN", "Warranty", "Weight", "Barcode"]
            .into_iter()
            .map(String::from)
            .collect();

        let size_synonyms = [
            ("extra extra small", "XXS"),
            ("2xs", "XXS"),
            ("extra small", "XS"),
            ("small", "S"),
            ("medium", "M"),
            ("large", "L"),
            ("extra large", "XL"),
            ("extra extra large", "XXL"),
            ("2xl", "XXL"),
            ("3xl", "XXXL"),
        ]
        .into_iter()
        .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
        .collect();

        FacetConfig {
            parameter_blacklist,
            size_synonyms,
            canonical_sizes: ["XXS", "XS", "S", "M", "L", "XL", "XXL", "XXXL"]
                .into_iter()
                .map(String::from)
                .collect(),
            color_dimension: "Color".to_string(),
            max_dimensions: 13,
        }
    }
}

impl FacetConfig {
    fn validate(&self) -> Result<()> {
        if self.color_dimension.trim().is_empty() {
            return Err(EngineError::config("facets.color_dimension must not be empty"));
        }
        Ok(())
    }
}

/// Pagination defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size for catalog search.
    pub catalog_page_size: usize,

    /// Page size for activity feeds.
    pub feed_page_size: usize,

    /// Sort token used when a catalog sort token is absent or malformed.
    pub default_sort: String,

    /// Sort token used by the feed orchestrator.
    pub feed_sort: String,

    /// Candidate id field names, tried in order when a record's own id is missing.
    pub cursor_id_fields: Vec<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            catalog_page_size: 5,
            feed_page_size: 10,
            default_sort: "createdAt_desc".to_string(),
            feed_sort: "createdAt_desc".to_string(),
            cursor_id_fields: ["reviewId", "answerId", "commentId", "id"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PaginationConfig {
    fn validate(&self) -> Result<()> {
        if self.catalog_page_size == 0 || self.feed_page_size == 0 {
            return Err(EngineError::config("page sizes must be positive"));
        }
        Ok(())
    }
}
