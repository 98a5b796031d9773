//! Activity records: reviews, answers and review comments.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::item::ItemId;
use crate::error::Result;
use crate::query::sort::{SortValue, Sortable};
use crate::search::cursor::CursorKey;

/// Identifier of a user.
pub type AuthorId = u64;

/// Discriminant of an [`ActivityRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Review,
    Answer,
    ReviewComment,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Review => "Review",
            RecordType::Answer => "Answer",
            RecordType::ReviewComment => "ReviewComment",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub review_id: Option<u64>,
    pub item_id: ItemId,
    pub author_id: AuthorId,
    pub stars: u8,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// An answer to a product question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default)]
    pub answer_id: Option<u64>,
    pub question_id: u64,
    pub author_id: AuthorId,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A comment on a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    #[serde(default)]
    pub comment_id: Option<u64>,
    pub review_id: u64,
    pub author_id: AuthorId,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of an activity feed, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivityRecord {
    Review(Review),
    Answer(Answer),
    ReviewComment(ReviewComment),
}

impl ActivityRecord {
    pub fn kind(&self) -> RecordType {
        match self {
            ActivityRecord::Review(_) => RecordType::Review,
            ActivityRecord::Answer(_) => RecordType::Answer,
            ActivityRecord::ReviewComment(_) => RecordType::ReviewComment,
        }
    }

    /// The record's own id, when it has one.
    pub fn id(&self) -> Option<u64> {
        match self {
            ActivityRecord::Review(review) => review.review_id,
            ActivityRecord::Answer(answer) => answer.answer_id,
            ActivityRecord::ReviewComment(comment) => comment.comment_id,
        }
    }

    pub fn author_id(&self) -> AuthorId {
        match self {
            ActivityRecord::Review(review) => review.author_id,
            ActivityRecord::Answer(answer) => answer.author_id,
            ActivityRecord::ReviewComment(comment) => comment.author_id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ActivityRecord::Review(review) => review.created_at,
            ActivityRecord::Answer(answer) => answer.created_at,
            ActivityRecord::ReviewComment(comment) => comment.created_at,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            ActivityRecord::Review(review) => &review.body,
            ActivityRecord::Answer(answer) => &answer.body,
            ActivityRecord::ReviewComment(comment) => &comment.body,
        }
    }
}

impl From<Review> for ActivityRecord {
    fn from(review: Review) -> Self {
        ActivityRecord::Review(review)
    }
}

impl From<Answer> for ActivityRecord {
    fn from(answer: Answer) -> Self {
        ActivityRecord::Answer(answer)
    }
}

impl From<ReviewComment> for ActivityRecord {
    fn from(comment: ReviewComment) -> Self {
        ActivityRecord::ReviewComment(comment)
    }
}

impl Sortable for ActivityRecord {
    fn sort_value(&self, field: &str) -> Option<SortValue> {
        match field {
            "createdAt" => Some(SortValue::Time(self.created_at())),
            "authorId" => Some(SortValue::UInt(self.author_id())),
            "id" => self.id().map(SortValue::UInt),
            "type" => Some(SortValue::Text(self.kind().as_str().to_string())),
            "stars" => match self {
                ActivityRecord::Review(review) => Some(SortValue::Int(i64::from(review.stars))),
                _ => None,
            },
            _ => None,
        }
    }

    fn created_at(&self) -> DateTime<Utc> {
        ActivityRecord::created_at(self)
    }
}

impl CursorKey for ActivityRecord {
    fn record_type(&self) -> &str {
        self.kind().as_str()
    }

    fn primary_id_field(&self) -> &str {
        match self {
            ActivityRecord::Review(_) => "reviewId",
            ActivityRecord::Answer(_) => "answerId",
            ActivityRecord::ReviewComment(_) => "commentId",
        }
    }

    fn id_field(&self, name: &str) -> Option<u64> {
        match (self, name) {
            (_, "id") => self.id(),
            (ActivityRecord::Review(review), "reviewId") => review.review_id,
            (ActivityRecord::Review(review), "itemId") => Some(review.item_id),
            (ActivityRecord::Answer(answer), "answerId") => answer.answer_id,
            (ActivityRecord::Answer(answer), "questionId") => Some(answer.question_id),
            (ActivityRecord::ReviewComment(comment), "commentId") => comment.comment_id,
            (ActivityRecord::ReviewComment(comment), "reviewId") => Some(comment.review_id),
            _ => None,
        }
    }
}

/// The three record tables a feed is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLog {
    pub reviews: Vec<Review>,
    pub answers: Vec<Answer>,
    pub comments: Vec<ReviewComment>,
}

impl ActivityLog {
    /// Load an activity log from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn len(&self) -> usize {
        self.reviews.len() + self.answers.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
