//! Command implementations for the Bazaar CLI.

use std::path::Path;
use std::time::Instant;

use log::info;

use crate::catalog::memory::MemoryCatalog;
use crate::catalog::snapshot::CatalogSnapshot;
use crate::catalog::source::FetchScope;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::feed::engine::{FeedEngine, FeedQuery};
use crate::feed::record::ActivityLog;
use crate::search::cursor::Cursor;
use crate::search::engine::{CatalogQuery, CatalogQueryEngine};

/// Execute a CLI command.
pub fn execute_command(args: BazaarArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    match &args.command {
        Command::Search(search_args) => search_catalog(search_args, config, &args),
        Command::Feed(feed_args) => show_feed(feed_args, config, &args),
        Command::Facets(facets_args) => show_facets(facets_args, config, &args),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            EngineConfig::from_file(path)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<(MemoryCatalog, CatalogSnapshot)> {
    info!("Loading catalog from: {}", path.display());
    let catalog = MemoryCatalog::from_file(path)?;
    let snapshot = CatalogSnapshot::fetch(&catalog, &FetchScope::all())?;
    Ok((catalog, snapshot))
}

/// Run a catalog search.
fn search_catalog(args: &SearchArgs, config: EngineConfig, cli_args: &BazaarArgs) -> Result<()> {
    let (catalog, snapshot) = load_snapshot(&args.catalog)?;
    let engine = CatalogQueryEngine::new(config)?;

    let query = CatalogQuery {
        filter: args.filter.to_filter_spec()?,
        sort: args.sort.clone(),
        page: args.page,
        page_size: args.page_size,
    };

    let start_time = Instant::now();
    let result = engine.search(&snapshot, &query, &catalog)?;
    info!("Search took {:?}", start_time.elapsed());

    output_result("Search results", &SearchOutput::new(query.page, result), cli_args)
}

/// Show one feed page.
fn show_feed(args: &FeedArgs, config: EngineConfig, cli_args: &BazaarArgs) -> Result<()> {
    info!("Loading activity from: {}", args.activity.display());
    let log = ActivityLog::from_file(&args.activity)?;
    let engine = FeedEngine::new(&config)?;

    let query = FeedQuery {
        cursor: args.cursor.as_deref().map(str::parse::<Cursor>).transpose()?,
        limit: args.limit,
        sort: args.sort.clone(),
    };
    let page = engine.feed_log(log, &query)?;

    output_result("Activity feed", &FeedOutput::from(page), cli_args)
}

/// Show facets and aggregations without the result page.
fn show_facets(args: &FacetsArgs, config: EngineConfig, cli_args: &BazaarArgs) -> Result<()> {
    let (catalog, snapshot) = load_snapshot(&args.catalog)?;
    let engine = CatalogQueryEngine::new(config)?;

    let query = CatalogQuery::new(args.filter.to_filter_spec()?);
    let result = engine.search(&snapshot, &query, &catalog)?;

    output_result("Facets", &FacetsOutput::from(result), cli_args)
}
