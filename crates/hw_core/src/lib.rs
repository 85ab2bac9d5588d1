pub mod checkpoint;
pub mod error;
pub mod formatter;
pub mod poster;
pub mod relevance;
pub mod source;
pub mod storage;
pub mod types;

pub use checkpoint::{Checkpoint, FeedCategory, FeedCursors, POSTED_HISTORY_LIMIT};
pub use error::{Error, Result};
pub use formatter::{format_post, MAX_TWEET_LENGTH};
pub use poster::Poster;
pub use relevance::{RelevanceMatcher, TermSets};
pub use source::{ArticleSource, FetchOutcome, FetchRequest};
pub use storage::CheckpointStore;
pub use types::{Article, Concept, ConceptLabel};
