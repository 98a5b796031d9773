//! Offset pagination.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// One page of a sorted sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub batch: Vec<T>,
    pub total_count: usize,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    pub fn empty(total_count: usize) -> Self {
        Page {
            batch: Vec::new(),
            total_count,
            has_next_page: false,
        }
    }
}

/// Slice page `page` (1-indexed) of `page_size` items out of `sorted`.
///
/// Pages past the end, and page 0, come back empty. `page_size` must be positive.
pub fn paginate<T: Clone>(sorted: &[T], page: usize, page_size: usize) -> Result<Page<T>> {
    if page_size == 0 {
        return Err(EngineError::invalid_argument("page size must be positive"));
    }
    let total_count = sorted.len();
    let Some(offset) = page
        .checked_sub(1)
        .and_then(|index| index.checked_mul(page_size))
    else {
        return Ok(Page::empty(total_count));
    };
    if offset >= total_count {
        return Ok(Page::empty(total_count));
    }

    let end = offset.saturating_add(page_size).min(total_count);
    Ok(Page {
        batch: sorted[offset..end].to_vec(),
        total_count,
        has_next_page: offset + page_size < total_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages() -> Result<()> {
        let items: Vec<u32> = (1..=12).collect();

        let first = paginate(&items, 1, 5)?;
        assert_eq!(first.batch, vec![1, 2, 3, 4, 5]);
        assert_eq!(first.total_count, 12);
        assert!(first.has_next_page);

        let last = paginate(&items, 3, 5)?;
        assert_eq!(last.batch, vec![11, 12]);
        assert!(!last.has_next_page);

        let exact = paginate(&items[..10], 2, 5)?;
        assert_eq!(exact.batch, vec![6, 7, 8, 9, 10]);
        assert!(!exact.has_next_page);
        Ok(())
    }

    #[test]
    fn test_out_of_range() -> Result<()> {
        let items: Vec<u32> = (1..=3).collect();
        let page = paginate(&items, 4, 5)?;
        assert!(page.batch.is_empty());
        assert_eq!(page.total_count, 3);
        assert!(!page.has_next_page);

        assert!(paginate(&items, 0, 5)?.batch.is_empty());
        assert!(paginate(&items, usize::MAX, 5)?.batch.is_empty());
        assert!(matches!(
            paginate(&items, 1, 0),
            Err(EngineError::InvalidArgument(_))
        ));
        Ok(())
    }
}
