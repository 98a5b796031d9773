//! Keyset pagination over heterogeneous record sequences.
//!
//! A cursor names the last record the caller saw by `(id, type)`. The next
//! page starts right after that record; a cursor that names no record in the
//! sequence is an error, never a silent restart.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::{EngineError, Result};

/// Position of the last record a caller has seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
    pub last_seen_id: u64,
    pub last_seen_type: String,
}

impl Cursor {
    pub fn new<S: Into<String>>(last_seen_id: u64, last_seen_type: S) -> Self {
        Cursor {
            last_seen_id,
            last_seen_type: last_seen_type.into(),
        }
    }
}

/// `Answer:42`
impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.last_seen_type, self.last_seen_id)
    }
}

impl FromStr for Cursor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        let (record_type, id) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| EngineError::invalid_argument(format!("cursor '{s}' is not type:id")))?;
        if record_type.is_empty() {
            return Err(EngineError::invalid_argument(format!(
                "cursor '{s}' has no record type"
            )));
        }
        let id = id
            .parse::<u64>()
            .map_err(|e| EngineError::invalid_argument(format!("cursor '{s}' has a bad id: {e}")))?;
        Ok(Cursor::new(id, record_type))
    }
}

/// Identity projection of a record for cursor matching.
pub trait CursorKey {
    /// Type discriminant of the record.
    fn record_type(&self) -> &str;

    /// Name of the record's own id field.
    fn primary_id_field(&self) -> &str;

    /// Value of a named id field, `None` when the record has no such id.
    fn id_field(&self, name: &str) -> Option<u64>;
}

/// One page of a keyset-paginated sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub batch: Vec<T>,
    pub total_count: usize,
    pub has_next_page: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_cursor_type: Option<String>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        CursorPage {
            batch: Vec::new(),
            total_count: 0,
            has_next_page: false,
            end_cursor: None,
            end_cursor_type: None,
        }
    }

    /// Cursor to request the page after this one.
    pub fn next_cursor(&self) -> Option<Cursor> {
        match (self.end_cursor, &self.end_cursor_type) {
            (Some(id), Some(record_type)) => Some(Cursor::new(id, record_type.clone())),
            _ => None,
        }
    }
}

/// Slices sorted record sequences by cursor.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    id_fields: Vec<String>,
}

impl CursorPaginator {
    pub fn new(config: &PaginationConfig) -> Self {
        CursorPaginator {
            id_fields: config.cursor_id_fields.clone(),
        }
    }

    /// Id of a record: its own id field, else the first candidate field that
    /// resolves.
    pub fn resolve_id<T: CursorKey>(&self, record: &T) -> Option<u64> {
        record.id_field(record.primary_id_field()).or_else(|| {
            self.id_fields
                .iter()
                .find_map(|field| record.id_field(field))
        })
    }

    /// Position of the record a cursor names. A record's own id wins over a
    /// fallback id, so an id borrowed from a parent never shadows a sibling.
    fn locate<T: CursorKey>(&self, sorted: &[T], record_type: &str, id: u64) -> Option<usize> {
        let of_type = |record: &&T| record.record_type() == record_type;
        sorted
            .iter()
            .position(|record| of_type(&record) && record.id_field(record.primary_id_field()) == Some(id))
            .or_else(|| {
                sorted
                    .iter()
                    .position(|record| of_type(&record) && self.resolve_id(record) == Some(id))
            })
    }

    /// Whether the record at `position` has a cursor that names another record.
    fn is_shadowed<T: CursorKey>(&self, sorted: &[T], position: usize) -> bool {
        let record = &sorted[position];
        self.resolve_id(record)
            .is_some_and(|id| self.locate(sorted, record.record_type(), id) != Some(position))
    }

    /// Return up to `limit` records following `cursor` (or from the start).
    ///
    /// A page never ends on a record whose cursor would resolve elsewhere. It
    /// stops at the last record before it instead, or when the shadowed record
    /// opens the page, runs on to the next record that resolves to itself.
    pub fn paginate<T: CursorKey + Clone>(
        &self,
        sorted: &[T],
        cursor: Option<&Cursor>,
        limit: usize,
    ) -> Result<CursorPage<T>> {
        if limit == 0 {
            return Err(EngineError::invalid_argument("limit must be positive"));
        }

        let start = match cursor {
            None => 0,
            Some(cursor) => {
                let position = self
                    .locate(sorted, &cursor.last_seen_type, cursor.last_seen_id)
                    .ok_or_else(|| {
                        EngineError::invalid_cursor(cursor.last_seen_id, cursor.last_seen_type.as_str())
                    })?;
                position + 1
            }
        };

        let mut end = start.saturating_add(limit).min(sorted.len());
        if end > start && self.is_shadowed(sorted, end - 1) {
            end = match (start..end - 1).rev().find(|&p| !self.is_shadowed(sorted, p)) {
                Some(p) => p + 1,
                None => (end..sorted.len())
                    .find(|&p| !self.is_shadowed(sorted, p))
                    .map_or(sorted.len(), |p| p + 1),
            };
            debug!("cursor page moved its end to {end} to avoid an ambiguous cursor");
        }

        let batch = sorted[start..end].to_vec();
        let Some(last) = batch.last() else {
            return Ok(CursorPage::empty());
        };

        let end_cursor = self.resolve_id(last);
        let end_cursor_type = end_cursor.map(|_| last.record_type().to_string());
        Ok(CursorPage {
            total_count: sorted.len(),
            has_next_page: end < sorted.len(),
            end_cursor,
            end_cursor_type,
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rec {
        kind: &'static str,
        id: Option<u64>,
        parent: u64,
    }

    impl CursorKey for Rec {
        fn record_type(&self) -> &str {
            self.kind
        }

        fn primary_id_field(&self) -> &str {
            "commentId"
        }

        fn id_field(&self, name: &str) -> Option<u64> {
            match name {
                "commentId" => self.id,
                "reviewId" => Some(self.parent),
                _ => None,
            }
        }
    }

    fn rec(kind: &'static str, id: u64) -> Rec {
        Rec {
            kind,
            id: Some(id),
            parent: 0,
        }
    }

    fn paginator() -> CursorPaginator {
        CursorPaginator::new(&PaginationConfig::default())
    }

    #[test]
    fn test_cursor_token() -> Result<()> {
        let cursor: Cursor = "ReviewComment:17".parse()?;
        assert_eq!(cursor, Cursor::new(17, "ReviewComment"));
        assert_eq!(cursor.to_string(), "ReviewComment:17");
        assert!("17".parse::<Cursor>().is_err());
        assert!(":17".parse::<Cursor>().is_err());
        assert!("Review:abc".parse::<Cursor>().is_err());
        Ok(())
    }

    #[test]
    fn test_same_id_different_type() -> Result<()> {
        let records = vec![rec("Review", 1), rec("Answer", 1), rec("Review", 2)];
        let page = paginator().paginate(&records, Some(&Cursor::new(1, "Answer")), 5)?;
        assert_eq!(page.batch, vec![rec("Review", 2)]);
        assert_eq!(page.total_count, 3);
        assert!(!page.has_next_page);
        Ok(())
    }

    #[test]
    fn test_unknown_cursor_is_error() {
        let records = vec![rec("Review", 1)];
        let result = paginator().paginate(&records, Some(&Cursor::new(1, "Answer")), 5);
        assert!(matches!(result, Err(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_empty_results() -> Result<()> {
        let empty: Vec<Rec> = Vec::new();
        assert_eq!(paginator().paginate(&empty, None, 5)?, CursorPage::empty());

        // Cursor on the last record.
        let records = vec![rec("Review", 1), rec("Review", 2)];
        let page = paginator().paginate(&records, Some(&Cursor::new(2, "Review")), 5)?;
        assert_eq!(page, CursorPage::empty());
        Ok(())
    }

    #[test]
    fn test_id_fallback() -> Result<()> {
        let orphan = Rec {
            kind: "ReviewComment",
            id: None,
            parent: 9,
        };
        let records = vec![rec("ReviewComment", 1), orphan];
        let page = paginator().paginate(&records, None, 5)?;
        assert_eq!(page.next_cursor(), Some(Cursor::new(9, "ReviewComment")));

        let page = paginator().paginate(&records, Some(&Cursor::new(9, "ReviewComment")), 5)?;
        assert!(page.batch.is_empty());
        Ok(())
    }

    fn comment(id: Option<u64>, parent: u64) -> Rec {
        Rec {
            kind: "ReviewComment",
            id,
            parent,
        }
    }

    #[test]
    fn test_own_id_wins_over_parent_id() -> Result<()> {
        let records = vec![comment(None, 4), comment(Some(4), 9), comment(Some(5), 9)];
        let page = paginator().paginate(&records, Some(&Cursor::new(4, "ReviewComment")), 5)?;
        assert_eq!(page.batch, vec![comment(Some(5), 9)]);
        Ok(())
    }

    #[test]
    fn test_walk_with_colliding_ids_visits_every_record() -> Result<()> {
        let records = vec![
            comment(None, 4),
            comment(Some(4), 9),
            comment(Some(5), 9),
            comment(Some(6), 9),
            comment(None, 6),
            comment(Some(7), 9),
        ];
        for limit in 1..=records.len() {
            let mut seen = Vec::new();
            let mut cursor = None;
            for _ in 0..records.len() + 1 {
                let page = paginator().paginate(&records, cursor.as_ref(), limit)?;
                seen.extend(page.batch.iter().cloned());
                if !page.has_next_page {
                    break;
                }
                cursor = page.next_cursor();
            }
            assert_eq!(seen, records, "limit {limit}");
        }
        Ok(())
    }

    #[test]
    fn test_zero_limit() {
        let records = vec![rec("Review", 1)];
        assert!(paginator().paginate(&records, None, 0).is_err());
    }
}
