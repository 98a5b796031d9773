//! Activity feed orchestration: merge, sort, cursor-paginate.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::feed::record::{ActivityLog, ActivityRecord, Answer, Review, ReviewComment};
use crate::query::sort::{SortSpec, sort};
use crate::search::cursor::{Cursor, CursorPage, CursorPaginator};

/// A feed page request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedQuery {
    /// Last record the caller has seen; `None` for the first page.
    pub cursor: Option<Cursor>,
    /// Overrides the configured feed page size.
    pub limit: Option<usize>,
    /// Overrides the configured feed sort token.
    pub sort: Option<String>,
}

impl FeedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn sort<S: Into<String>>(mut self, token: S) -> Self {
        self.sort = Some(token.into());
        self
    }
}

/// Merges reviews, answers and comments into one cursor-paginated feed.
#[derive(Debug, Clone)]
pub struct FeedEngine {
    paginator: CursorPaginator,
    default_sort: SortSpec,
    page_size: usize,
}

impl FeedEngine {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let default_sort = SortSpec::parse(&config.pagination.feed_sort)
            .map_err(|e| EngineError::config(format!("pagination.feed_sort: {e}")))?;
        Ok(FeedEngine {
            paginator: CursorPaginator::new(&config.pagination),
            default_sort,
            page_size: config.pagination.feed_page_size,
        })
    }

    /// Tag every record with its kind and concatenate them.
    pub fn merge(
        reviews: Vec<Review>,
        answers: Vec<Answer>,
        comments: Vec<ReviewComment>,
    ) -> Vec<ActivityRecord> {
        let mut merged = Vec::with_capacity(reviews.len() + answers.len() + comments.len());
        merged.extend(reviews.into_iter().map(ActivityRecord::from));
        merged.extend(answers.into_iter().map(ActivityRecord::from));
        merged.extend(comments.into_iter().map(ActivityRecord::from));
        merged
    }

    /// Merge the three tables, sort, and return the page after `query.cursor`.
    pub fn feed(
        &self,
        reviews: Vec<Review>,
        answers: Vec<Answer>,
        comments: Vec<ReviewComment>,
        query: &FeedQuery,
    ) -> Result<CursorPage<ActivityRecord>> {
        let merged = Self::merge(reviews, answers, comments);
        self.paginate(&merged, query)
    }

    /// Build a feed page from an [`ActivityLog`].
    pub fn feed_log(&self, log: ActivityLog, query: &FeedQuery) -> Result<CursorPage<ActivityRecord>> {
        self.feed(log.reviews, log.answers, log.comments, query)
    }

    /// Sort already-merged records and return the page after `query.cursor`.
    pub fn paginate(
        &self,
        records: &[ActivityRecord],
        query: &FeedQuery,
    ) -> Result<CursorPage<ActivityRecord>> {
        let spec = SortSpec::parse_or(query.sort.as_deref(), &self.default_sort);
        let limit = query.limit.unwrap_or(self.page_size);
        let sorted = sort(records, &spec);
        debug!("sorted {} feed records by {spec}", sorted.len());

        let page = self.paginator.paginate(&sorted, query.cursor.as_ref(), limit)?;
        info!(
            "feed page: {} of {} records, next page: {}",
            page.batch.len(),
            page.total_count,
            page.has_next_page
        );
        Ok(page)
    }
}
