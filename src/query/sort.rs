//! Multi-record sorting driven by `field_direction` tokens.
//!
//! The comparator looks up the requested field on both records. A record that
//! lacks the field compares equal to anything, so it keeps its place relative
//! to its neighbours. When both values are equal the records fall back to
//! `createdAt` descending, whatever the requested direction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

lazy_static! {
    static ref SORT_TOKEN: Regex =
        Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)_(?i:(asc|desc))$").expect("valid sort token regex");
}

/// A value a record exposes for sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
    Bool(bool),
}

impl SortValue {
    /// Order two values of compatible kinds. Integers and floats compare
    /// numerically; other kind mismatches and NaN are incomparable.
    pub fn compare(&self, other: &SortValue) -> Option<Ordering> {
        match (self, other) {
            (SortValue::Int(a), SortValue::Int(b)) => Some(a.cmp(b)),
            (SortValue::UInt(a), SortValue::UInt(b)) => Some(a.cmp(b)),
            (SortValue::Int(a), SortValue::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (SortValue::UInt(a), SortValue::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (SortValue::UInt(a), SortValue::Float(b)) => (*a as f64).partial_cmp(b),
            (SortValue::Float(a), SortValue::UInt(b)) => a.partial_cmp(&(*b as f64)),
            (SortValue::Float(a), SortValue::Float(b)) => a.partial_cmp(b),
            (SortValue::Int(a), SortValue::Float(b)) => (*a as f64).partial_cmp(b),
            (SortValue::Float(a), SortValue::Int(b)) => a.partial_cmp(&(*b as f64)),
            (SortValue::Text(a), SortValue::Text(b)) => Some(a.cmp(b)),
            (SortValue::Time(a), SortValue::Time(b)) => Some(a.cmp(b)),
            (SortValue::Bool(a), SortValue::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Records the sort engine can order.
///
/// Every sortable record carries a creation time; it is the tiebreak.
pub trait Sortable {
    /// Value of a named field, `None` when the record has no such field.
    fn sort_value(&self, field: &str) -> Option<SortValue>;

    /// Creation time of the record.
    fn created_at(&self) -> DateTime<Utc>;
}

impl<T: Sortable + ?Sized> Sortable for &T {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        (**self).sort_value(field)
    }

    fn created_at(&self) -> DateTime<Utc> {
        (**self).created_at()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A parsed `field_direction` sort token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new<S: Into<String>>(field: S, direction: SortDirection) -> Self {
        SortSpec {
            field: field.into(),
            direction,
        }
    }

    /// Parse a token such as `"createdAt_desc"` or `"price_asc"`.
    pub fn parse(token: &str) -> Result<Self> {
        let captures = SORT_TOKEN
            .captures(token.trim())
            .ok_or_else(|| EngineError::malformed_sort(format!("'{token}' is not field_direction")))?;

        let direction = if captures[2].eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        Ok(SortSpec::new(&captures[1], direction))
    }

    /// Parse `token`, falling back to `default` when it is absent or malformed.
    pub fn parse_or(token: Option<&str>, default: &SortSpec) -> SortSpec {
        match token.map(SortSpec::parse) {
            None => default.clone(),
            Some(Ok(spec)) => spec,
            Some(Err(e)) => {
                warn!("{e}; sorting by {default}");
                default.clone()
            }
        }
    }

    /// Compare two records under this spec.
    pub fn compare<T: Sortable + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        let (Some(left), Some(right)) = (a.sort_value(&self.field), b.sort_value(&self.field))
        else {
            return Ordering::Equal;
        };

        match left.compare(&right) {
            None => Ordering::Equal,
            Some(Ordering::Equal) => b.created_at().cmp(&a.created_at()),
            Some(order) => match self.direction {
                SortDirection::Asc => order,
                SortDirection::Desc => order.reverse(),
            },
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.field, self.direction.as_str())
    }
}

impl FromStr for SortSpec {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        SortSpec::parse(s)
    }
}

/// Return a sorted copy of `items`. Equal records keep their input order.
pub fn sort<T: Sortable + Clone>(items: &[T], spec: &SortSpec) -> Vec<T> {
    let mut sorted = items.to_vec();
    merge_sort_by(&mut sorted, |a, b| spec.compare(a, b));
    sorted
}

/// Stable top-down merge sort.
///
/// Records missing the sort key compare equal to everything, which is not a
/// total order; `slice::sort_by` may panic on such comparators.
fn merge_sort_by<T: Clone, F>(items: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return;
    }
    let mut buffer = items.to_vec();
    merge_sort_into(items, &mut buffer, &mut compare);
}

fn merge_sort_into<T: Clone, F>(items: &mut [T], buffer: &mut [T], compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    {
        let (left, right) = items.split_at_mut(mid);
        let (left_buf, right_buf) = buffer.split_at_mut(mid);
        merge_sort_into(left, left_buf, compare);
        merge_sort_into(right, right_buf, compare);
    }

    let (mut i, mut j) = (0, mid);
    for slot in buffer.iter_mut() {
        let take_left = j >= len || (i < mid && compare(&items[j], &items[i]) != Ordering::Less);
        if take_left {
            *slot = items[i].clone();
            i += 1;
        } else {
            *slot = items[j].clone();
            j += 1;
        }
    }
    items.clone_from_slice(buffer);
}
