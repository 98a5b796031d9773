//! Activity feeds merged from reviews, answers and review comments.

pub mod engine;
pub mod record;

pub use self::engine::{FeedEngine, FeedQuery};
pub use self::record::{
    ActivityLog, ActivityRecord, Answer, AuthorId, RecordType, Review, ReviewComment,
};
