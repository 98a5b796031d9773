//! Edit-distance algorithms for approximate substring matching.
//!
//! The matcher needs to know how closely a query occurs *somewhere inside* a
//! longer text, and where. That is Levenshtein distance with free leading and
//! trailing text (Sellers' algorithm): the first DP row is all zeros so a match
//! may start at any text position, and every column's last cell is a candidate
//! match end.

use std::cmp::min;

/// An approximate occurrence of a pattern inside a text.
///
/// Offsets are character positions; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstringMatch {
    /// First character of the occurrence.
    pub start: usize,
    /// One past the last character of the occurrence.
    pub end: usize,
    /// Number of edits needed to turn the occurrence into the pattern.
    pub edits: usize,
}

impl SubstringMatch {
    /// Length of the occurrence in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the occurrence covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn overlaps(&self, other: &SubstringMatch) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Minimum number of edits needed to find `pattern` anywhere in `text`.
///
/// An empty pattern occurs everywhere with zero edits.
pub fn best_substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0; m + 1];
    let mut best = prev[m];

    for &tc in text {
        curr[0] = 0;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != tc);
            curr[i] = min(
                min(
                    prev[i] + 1,     // skip text char
                    curr[i - 1] + 1, // skip pattern char
                ),
                prev[i - 1] + cost, // substitution
            );
        }
        best = min(best, curr[m]);
        if best == 0 {
            break;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

/// Find non-overlapping occurrences of `pattern` in `text` within `max_edits`.
///
/// Better occurrences (fewer edits, then earlier, then shorter) win when two
/// candidates overlap. The returned list is ordered by start position.
pub fn substring_matches(pattern: &[char], text: &[char], max_edits: usize) -> Vec<SubstringMatch> {
    let m = pattern.len();
    if m == 0 || text.is_empty() {
        return Vec::new();
    }

    // Each cell tracks its distance and the text column the alignment started at.
    let mut prev: Vec<(usize, usize)> = (0..=m).map(|i| (i, 0)).collect();
    let mut curr = vec![(0, 0); m + 1];
    let mut candidates = Vec::new();

    for (j, &tc) in text.iter().enumerate() {
        curr[0] = (0, j + 1);
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != tc);
            let diagonal = (prev[i - 1].0 + cost, prev[i - 1].1);
            let left = (prev[i].0 + 1, prev[i].1);
            let up = (curr[i - 1].0 + 1, curr[i - 1].1);

            let mut cell = diagonal;
            if left.0 < cell.0 {
                cell = left;
            }
            if up.0 < cell.0 {
                cell = up;
            }
            curr[i] = cell;
        }

        let (edits, start) = curr[m];
        if edits <= max_edits && start <= j {
            candidates.push(SubstringMatch {
                start,
                end: j + 1,
                edits,
            });
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    candidates.sort_by(|a, b| {
        a.edits
            .cmp(&b.edits)
            .then_with(|| a.start.cmp(&b.start))
            .then_with(|| a.len().cmp(&b.len()))
    });

    let mut accepted: Vec<SubstringMatch> = Vec::new();
    for candidate in candidates {
        if accepted.iter().all(|kept| !kept.overlaps(&candidate)) {
            accepted.push(candidate);
        }
    }
    accepted.sort_by_key(|found| found.start);
    accepted
}
