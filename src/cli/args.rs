//! Command line argument parsing for the Bazaar CLI using clap.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::catalog::item::{CategoryId, VendorId};
use crate::error::{EngineError, Result};
use crate::query::filter::FilterSpec;

/// Bazaar - faceted catalog search and activity feeds
#[derive(Parser, Debug, Clone)]
#[command(name = "bazaar")]
#[command(about = "Faceted, fuzzy catalog search and cursor-paginated activity feeds")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BazaarArgs {
    /// Verbosity level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", env = "BAZAAR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl BazaarArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search a catalog file
    Search(SearchArgs),

    /// Show one page of an activity feed
    Feed(FeedArgs),

    /// Show the facets and aggregations of a catalog file
    Facets(FacetsArgs),
}

/// Filter flags shared by `search` and `facets`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Fuzzy text query
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Restrict to one category
    #[arg(long)]
    pub category: Option<CategoryId>,

    /// Vendor ids to keep (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub vendor: Vec<VendorId>,

    /// Colors to keep (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub color: Vec<String>,

    /// Sizes to keep (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub size: Vec<String>,

    /// Minimum price
    #[arg(long)]
    pub price_min: Option<f64>,

    /// Maximum price
    #[arg(long)]
    pub price_max: Option<f64>,

    /// Minimum average rating
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Include items that are out of stock
    #[arg(long)]
    pub out_of_stock: bool,

    /// Named parameter selection, repeatable (e.g. --param Material=Cotton)
    #[arg(long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,
}

impl FilterArgs {
    /// Build the filter these flags describe.
    pub fn to_filter_spec(&self) -> Result<FilterSpec> {
        let mut parameters: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for param in &self.params {
            let (name, value) = param.split_once('=').ok_or_else(|| {
                EngineError::invalid_argument(format!("--param '{param}' is not NAME=VALUE"))
            })?;
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                return Err(EngineError::invalid_argument(format!(
                    "--param '{param}' needs both a name and a value"
                )));
            }
            parameters
                .entry(name.to_string())
                .or_default()
                .insert(value.to_string());
        }

        Ok(FilterSpec {
            query: self.query.clone(),
            category_id: self.category,
            vendor_ids: self.vendor.iter().copied().collect(),
            colors: self.color.iter().cloned().collect(),
            sizes: self.size.iter().cloned().collect(),
            price_min: self.price_min,
            price_max: self.price_max,
            min_rating: self.min_rating,
            include_out_of_stock: self.out_of_stock,
            parameters,
        })
    }
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Catalog file (JSON)
    #[arg(value_name = "CATALOG_FILE")]
    pub catalog: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Sort token, e.g. price_asc or createdAt_desc
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Page size (default from configuration)
    #[arg(long)]
    pub page_size: Option<usize>,
}

/// Arguments for the activity feed
#[derive(Parser, Debug, Clone)]
pub struct FeedArgs {
    /// Activity file (JSON with reviews, answers and comments)
    #[arg(value_name = "ACTIVITY_FILE")]
    pub activity: PathBuf,

    /// Cursor of the last record seen, as TYPE:ID
    #[arg(long)]
    pub cursor: Option<String>,

    /// Page size (default from configuration)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Sort token (default from configuration)
    #[arg(short, long)]
    pub sort: Option<String>,
}

/// Arguments for facet listing
#[derive(Parser, Debug, Clone)]
pub struct FacetsArgs {
    /// Catalog file (JSON)
    #[arg(value_name = "CATALOG_FILE")]
    pub catalog: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
