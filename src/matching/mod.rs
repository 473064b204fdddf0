//! Fuzzy matching of free-text media labels against the catalog.

mod models;
mod resolver;
mod similarity;
mod title_parser;

pub use models::{Confidence, MatchResult, ParsedTitle, QualityTier, UNKNOWN_ARTIST};
pub use resolver::{match_score, quality_tier, MatchResolver, ResolveError, TrackResolver};
pub use similarity::{levenshtein_distance, similarity};
pub use title_parser::TitleParser;
