//! Title matching strategies
//!
//! Candidate search for the song-pick step. Two strategies share the
//! [`TitleMatcher`] interface:
//!
//! - **Weighted** (`weighted`): token-aware edit-distance scoring, compiled
//!   in with the `fuzzy` cargo feature
//! - **Substring** (`substring`): case-insensitive containment with a flat
//!   score of 100, the degraded mode
//!
//! The strategy is chosen once at startup by [`select_matcher`].

mod substring;
#[cfg(feature = "fuzzy")]
mod weighted;

pub use substring::SubstringMatcher;
#[cfg(feature = "fuzzy")]
pub use weighted::{weighted_ratio, WeightedMatcher};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

/// Maximum number of catalog candidates offered on the pick step
pub const PICK_LIMIT: usize = 10;

/// Minimum similarity score for a catalog title to be offered
pub const PICK_SCORE_CUTOFF: u8 = 50;

/// A catalog title with its similarity to the query (0–100)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredTitle {
    pub title: String,
    pub score: u8,
}

/// Ranks catalog titles against a free-text query
///
/// Implementations return at most `limit` entries, each scoring at least
/// `score_cutoff`, in descending score order. Equal scores keep their
/// position from `titles`. A `limit` of 0 yields nothing.
pub trait TitleMatcher: Send + Sync + fmt::Debug {
    /// Strategy name for logs and health output
    fn name(&self) -> &'static str;

    fn find(&self, query: &str, titles: &[String], limit: usize, score_cutoff: u8)
        -> Vec<ScoredTitle>;
}

/// Configured matching strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MatcherKind {
    #[default]
    Weighted,
    Substring,
}

/// Pick the matcher for this process
///
/// Asking for `weighted` in a build without the `fuzzy` feature falls back
/// to substring matching with a warning.
pub fn select_matcher(kind: MatcherKind) -> Arc<dyn TitleMatcher> {
    let matcher: Arc<dyn TitleMatcher> = match kind {
        MatcherKind::Substring => Arc::new(SubstringMatcher),
        MatcherKind::Weighted => weighted_or_fallback(),
    };
    info!(matcher = matcher.name(), "Title matcher selected");
    matcher
}

#[cfg(feature = "fuzzy")]
fn weighted_or_fallback() -> Arc<dyn TitleMatcher> {
    Arc::new(WeightedMatcher)
}

#[cfg(not(feature = "fuzzy"))]
fn weighted_or_fallback() -> Arc<dyn TitleMatcher> {
    warn!("Built without the `fuzzy` feature, falling back to substring matching");
    Arc::new(SubstringMatcher)
}

/// Keep entries at or above the cutoff, order by score (stable), cap at `limit`
pub(crate) fn rank(mut scored: Vec<ScoredTitle>, limit: usize, score_cutoff: u8) -> Vec<ScoredTitle> {
    if score_cutoff > 100 {
        warn!(score_cutoff, "Score cutoff above 100 can never match");
    }
    scored.retain(|entry| entry.score >= score_cutoff);
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(title: &str, score: u8) -> ScoredTitle {
        ScoredTitle {
            title: title.to_string(),
            score,
        }
    }

    #[test]
    fn test_rank_filters_sorts_and_limits() {
        let ranked = rank(
            vec![
                scored("a", 40),
                scored("b", 90),
                scored("c", 70),
                scored("d", 90),
                scored("e", 50),
            ],
            3,
            50,
        );
        assert_eq!(ranked, vec![scored("b", 90), scored("d", 90), scored("c", 70)]);
    }

    #[test]
    fn test_rank_zero_limit() {
        assert!(rank(vec![scored("a", 100)], 0, 0).is_empty());
    }

    #[test]
    fn test_select_substring() {
        assert_eq!(select_matcher(MatcherKind::Substring).name(), "substring");
    }

    #[cfg(feature = "fuzzy")]
    #[test]
    fn test_select_weighted() {
        assert_eq!(select_matcher(MatcherKind::Weighted).name(), "weighted");
    }

    #[cfg(not(feature = "fuzzy"))]
    #[test]
    fn test_select_weighted_without_feature_degrades() {
        assert_eq!(select_matcher(MatcherKind::Weighted).name(), "substring");
    }
}
