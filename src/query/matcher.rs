//! Fuzzy text matching over configurable item fields.
//!
//! A query is scored against each field by the fewest edits needed to find it
//! somewhere inside the field text, divided by the query length (0.0 is an
//! exact occurrence). A field matches when its score is within the mode's
//! threshold. Multi-word queries that do not match as a phrase fall back to
//! matching every word on its own, in any field.
//!
//! The matcher never ranks: indices come back as a set, spans keyed by item id.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::config::MatcherConfig;
use crate::util::levenshtein::{best_substring_distance, substring_matches};

/// Score used in place of 0.0 when combining field scores multiplicatively.
const EXACT_SCORE: f64 = 0.001;

/// Records the matcher can read text from.
pub trait Matchable {
    /// Key the spans result is indexed by.
    fn match_key(&self) -> u64;

    /// Text of a named field, if present.
    fn text_field(&self, name: &str) -> Option<&str>;
}

impl<T: Matchable + ?Sized> Matchable for &T {
    fn match_key(&self) -> u64 {
        (**self).match_key()
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        (**self).text_field(name)
    }
}

/// What the matcher reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Loose threshold, positions of matching items only.
    Indices,
    /// Strict threshold, per-field character ranges for highlighting.
    Spans,
}

/// A half-open character range inside a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Spans found in one field of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    /// Edits of the best occurrence(s) in this field.
    pub edits: usize,
    pub score: f64,
    pub spans: Vec<Span>,
}

/// All matching fields of one item, best field first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMatch {
    /// Product of the field scores; lower is better.
    pub score: f64,
    pub fields: Vec<FieldMatch>,
}

/// Output of [`TextMatcher::match_items`].
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Indices(BTreeSet<usize>),
    Spans(BTreeMap<u64, ItemMatch>),
}

/// A normalized query: the whole phrase plus its individual words.
#[derive(Debug, Clone)]
struct Pattern {
    phrase: Vec<char>,
    words: Vec<Vec<char>>,
}

impl Pattern {
    fn parse(query: &str) -> Option<Self> {
        let words: Vec<Vec<char>> = query
            .unicode_words()
            .map(|word| word.chars().map(fold_char).collect())
            .collect();
        let phrase: Vec<char> = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .map(fold_char)
            .collect();
        if phrase.is_empty() {
            return None;
        }
        Some(Pattern { phrase, words })
    }
}

/// Lowercase one char to one char so offsets in the folded text stay valid.
fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Per-field evaluation of one pattern against one text.
#[derive(Debug, Clone)]
struct FieldEval {
    edits: usize,
    score: f64,
    spans: Vec<Span>,
}

/// Approximate matcher over a fixed field list.
#[derive(Debug, Clone)]
pub struct TextMatcher {
    fields: Vec<String>,
    index_threshold: f64,
    span_threshold: f64,
    min_match_len: usize,
}

impl TextMatcher {
    pub fn new(config: &MatcherConfig) -> Self {
        TextMatcher {
            fields: config.fields.clone(),
            index_threshold: config.index_threshold,
            span_threshold: config.span_threshold,
            min_match_len: config.min_match_len,
        }
    }

    /// Fields the matcher reads, in priority order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Match `query` against `items` in the given mode.
    pub fn match_items<T: Matchable>(&self, items: &[T], query: &str, mode: MatchMode) -> MatchResult {
        match mode {
            MatchMode::Indices => MatchResult::Indices(self.match_indices(items, query)),
            MatchMode::Spans => MatchResult::Spans(self.match_spans(items, query)),
        }
    }

    /// Positions of the items whose fields match the query loosely.
    ///
    /// A blank query matches nothing.
    pub fn match_indices<T: Matchable>(&self, items: &[T], query: &str) -> BTreeSet<usize> {
        let Some(pattern) = Pattern::parse(query) else {
            return BTreeSet::new();
        };

        items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.item_matches(*item, &pattern, self.index_threshold))
            .map(|(position, _)| position)
            .collect()
    }

    /// Highlight spans per item id for items that match strictly.
    ///
    /// Items without a span of at least `min_match_len` characters are absent.
    pub fn match_spans<T: Matchable>(&self, items: &[T], query: &str) -> BTreeMap<u64, ItemMatch> {
        let mut result = BTreeMap::new();
        let Some(pattern) = Pattern::parse(query) else {
            return result;
        };
        if pattern.phrase.len() < self.min_match_len {
            return result;
        }

        for item in items {
            let mut fields = self.phrase_fields(item, &pattern.phrase, self.span_threshold, true);
            if fields.is_empty() && pattern.words.len() > 1 {
                fields = self.word_fields(item, &pattern.words, self.span_threshold, true);
            }
            fields.retain(|(_, eval)| !eval.spans.is_empty());
            if fields.is_empty() {
                continue;
            }

            let score = combine_scores(fields.iter().map(|(_, eval)| eval.score));
            let mut matches: Vec<FieldMatch> = fields
                .into_iter()
                .map(|(field, eval)| FieldMatch {
                    field: field.to_string(),
                    edits: eval.edits,
                    score: eval.score,
                    spans: eval.spans,
                })
                .collect();
            // Stable: equal edits keep field priority order.
            matches.sort_by_key(|found| found.edits);

            result.insert(item.match_key(), ItemMatch { score, fields: matches });
        }

        result
    }

    fn item_matches<T: Matchable>(&self, item: &T, pattern: &Pattern, threshold: f64) -> bool {
        if !self.phrase_fields(item, &pattern.phrase, threshold, false).is_empty() {
            return true;
        }
        pattern.words.len() > 1 && !self.word_fields(item, &pattern.words, threshold, false).is_empty()
    }

    /// Fields in which the whole phrase occurs within `threshold`.
    fn phrase_fields<'a, T: Matchable>(
        &'a self,
        item: &T,
        phrase: &[char],
        threshold: f64,
        with_spans: bool,
    ) -> Vec<(&'a str, FieldEval)> {
        self.fields
            .iter()
            .filter_map(|field| {
                let text: Vec<char> = item.text_field(field)?.chars().map(fold_char).collect();
                self.evaluate(phrase, &text, threshold, with_spans)
                    .map(|eval| (field.as_str(), eval))
            })
            .collect()
    }

    /// Fields matched word by word. Every word must occur in some field,
    /// otherwise nothing matches.
    fn word_fields<'a, T: Matchable>(
        &'a self,
        item: &T,
        words: &[Vec<char>],
        threshold: f64,
        with_spans: bool,
    ) -> Vec<(&'a str, FieldEval)> {
        let texts: Vec<(&str, Vec<char>)> = self
            .fields
            .iter()
            .filter_map(|field| {
                let text = item.text_field(field)?;
                Some((field.as_str(), text.chars().map(fold_char).collect()))
            })
            .collect();

        let mut per_field: Vec<Option<FieldEval>> = vec![None; texts.len()];
        for word in words {
            let mut found = false;
            for (slot, (_, text)) in per_field.iter_mut().zip(&texts) {
                let Some(eval) = self.evaluate(word, text, threshold, with_spans) else {
                    continue;
                };
                found = true;
                if let Some(existing) = slot.as_mut() {
                    existing.edits += eval.edits;
                    existing.score = existing.score.max(eval.score);
                    existing.spans.extend(eval.spans);
                } else {
                    *slot = Some(eval);
                }
            }
            if !found {
                return Vec::new();
            }
        }

        texts
            .iter()
            .zip(per_field)
            .filter_map(|((field, _), eval)| {
                eval.map(|mut eval| {
                    eval.spans.sort_by_key(|span| (span.start, span.end));
                    eval.spans.dedup();
                    (*field, eval)
                })
            })
            .collect()
    }

    fn evaluate(
        &self,
        pattern: &[char],
        text: &[char],
        threshold: f64,
        with_spans: bool,
    ) -> Option<FieldEval> {
        if pattern.is_empty() || text.is_empty() {
            return None;
        }
        let max_edits = (threshold * pattern.len() as f64 + 1e-9).floor() as usize;

        if !with_spans {
            let edits = best_substring_distance(pattern, text);
            return (edits <= max_edits).then(|| FieldEval {
                edits,
                score: edits as f64 / pattern.len() as f64,
                spans: Vec::new(),
            });
        }

        let found = substring_matches(pattern, text, max_edits);
        let edits = found.iter().map(|m| m.edits).min()?;
        let spans = found
            .iter()
            .filter(|m| m.len() >= self.min_match_len)
            .map(|m| Span { start: m.start, end: m.end })
            .collect();
        Some(FieldEval {
            edits,
            score: edits as f64 / pattern.len() as f64,
            spans,
        })
    }
}

fn combine_scores<I: Iterator<Item = f64>>(scores: I) -> f64 {
    scores.fold(1.0, |total, score| {
        total * if score == 0.0 { EXACT_SCORE } else { score }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        id: u64,
        title: &'static str,
        body: Option<&'static str>,
    }

    impl Matchable for Doc {
        fn match_key(&self) -> u64 {
            self.id
        }

        fn text_field(&self, name: &str) -> Option<&str> {
            match name {
                "title" => Some(self.title),
                "description" => self.body,
                _ => None,
            }
        }
    }

    fn docs() -> Vec<Doc> {
        vec![
            Doc { id: 10, title: "Waterproof Rain Jacket", body: Some("Breathable shell") },
            Doc { id: 11, title: "Denim Jeans", body: None },
            Doc { id: 12, title: "Rain Boots", body: Some("Rubber boots for a rainy jacket-free day") },
            Doc { id: 13, title: "Winter Jakcet", body: None },
        ]
    }

    fn matcher() -> TextMatcher {
        TextMatcher::new(&MatcherConfig {
            fields: vec!["title".to_string(), "description".to_string()],
            ..MatcherConfig::default()
        })
    }

    #[test]
    fn test_indices_tolerate_typos() {
        // A swapped pair costs two edits, more than a six-letter query allows.
        let found = matcher().match_indices(&docs(), "jacket");
        assert_eq!(found, BTreeSet::from([0, 2]));

        // Thirteen characters allow two edits, enough for the swapped pair.
        let found = matcher().match_indices(&docs(), "winter jacket");
        assert_eq!(found, BTreeSet::from([3]));
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert!(matcher().match_indices(&docs(), "   ").is_empty());
        assert!(matcher().match_spans(&docs(), "").is_empty());
    }

    #[test]
    fn test_word_fallback_requires_every_word() {
        let found = matcher().match_indices(&docs(), "boots rubber");
        assert_eq!(found, BTreeSet::from([2]));

        let found = matcher().match_indices(&docs(), "boots leather");
        assert!(found.is_empty());
    }

    #[test]
    fn test_spans_keyed_by_id_and_ordered_by_edits() {
        let spans = matcher().match_spans(&docs(), "rain");
        assert_eq!(spans.keys().copied().collect::<Vec<_>>(), vec![10, 12]);

        let boots = &spans[&12];
        assert_eq!(boots.fields[0].field, "title");
        assert_eq!(boots.fields[0].spans, vec![Span { start: 0, end: 4 }]);
        assert_eq!(boots.fields[1].field, "description");
        assert_eq!(boots.fields[1].spans, vec![Span { start: 19, end: 23 }]);
    }

    #[test]
    fn test_spans_require_min_length() {
        assert!(matcher().match_spans(&docs(), "ra").is_empty());
    }

    #[test]
    fn test_deterministic() {
        let first = matcher().match_items(&docs(), "rain jacket", MatchMode::Spans);
        let second = matcher().match_items(&docs(), "rain jacket", MatchMode::Spans);
        assert_eq!(first, second);
    }
}
