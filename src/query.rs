//! Query stages: text matching, sorting and filtering.

pub mod filter;
pub mod matcher;
pub mod sort;

pub use self::filter::{Dimension, FilterEngine, FilterOutcome, FilterSpec, PredicateMatrix};
pub use self::matcher::{MatchMode, MatchResult, Matchable, TextMatcher};
pub use self::sort::{SortDirection, SortSpec, SortValue, Sortable, sort};
