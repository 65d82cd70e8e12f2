//! Weighted token-aware similarity
//!
//! Scores a query against a title by taking the best of several views of the
//! two strings: plain edit distance, token-sorted and token-set comparisons,
//! and (when lengths differ a lot) best-substring alignment. Alternative views
//! are discounted so that a plain exact match always wins.
//!
//! Base similarity is `strsim::normalized_levenshtein` scaled to 0–100.

use std::collections::BTreeSet;

use super::{rank, ScoredTitle, TitleMatcher};

/// Discount applied to token-rearranged comparisons
const UNBASE_SCALE: f64 = 0.95;
/// Discount applied to substring alignment for moderately different lengths
const PARTIAL_SCALE: f64 = 0.9;
/// Discount applied to substring alignment when one string is > 8x the other
const LONG_PARTIAL_SCALE: f64 = 0.6;

/// Similarity ranking on [`weighted_ratio`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMatcher;

impl TitleMatcher for WeightedMatcher {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn find(
        &self,
        query: &str,
        titles: &[String],
        limit: usize,
        score_cutoff: u8,
    ) -> Vec<ScoredTitle> {
        if limit == 0 {
            return Vec::new();
        }

        let scored = titles
            .iter()
            .map(|title| ScoredTitle {
                title: title.clone(),
                score: weighted_ratio(query, title),
            })
            .collect();

        rank(scored, limit, score_cutoff)
    }
}

/// Similarity of `query` and `choice` on a 0–100 scale
///
/// Both inputs are normalised first (lowercase, punctuation to spaces,
/// whitespace collapsed). Empty after normalisation scores 0.
pub fn weighted_ratio(query: &str, choice: &str) -> u8 {
    let a = normalize(query);
    let b = normalize(choice);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let base = ratio(&a, &b);
    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let best = if len_ratio < 1.5 {
        base.max(ratio(&sorted_tokens(&a), &sorted_tokens(&b)) * UNBASE_SCALE)
            .max(token_set(&a, &b, ratio) * UNBASE_SCALE)
    } else {
        let partial_scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        base.max(partial_ratio(&a, &b) * partial_scale)
            .max(partial_ratio(&sorted_tokens(&a), &sorted_tokens(&b)) * UNBASE_SCALE * partial_scale)
            .max(token_set(&a, &b, partial_ratio) * UNBASE_SCALE * partial_scale)
    };

    best.round().clamp(0.0, 100.0) as u8
}

fn normalize(input: &str) -> String {
    let mut mapped = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_alphanumeric() {
            mapped.extend(c.to_lowercase());
        } else {
            mapped.push(' ');
        }
    }
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best `ratio` of the shorter string against every equal-length window of the longer
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    if width == long_chars.len() {
        return ratio(short, long);
    }

    let mut best = 0.0_f64;
    for window in long_chars.windows(width) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Compare shared tokens against each side's full token set, keep the best
fn token_set(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |tokens: Vec<&str>| tokens.join(" ");
    let shared = join(tokens_a.intersection(&tokens_b).copied().collect());
    let only_a = join(tokens_a.difference(&tokens_b).copied().collect());
    let only_b = join(tokens_b.difference(&tokens_a).copied().collect());

    let combine = |rest: &str| format!("{} {}", shared, rest).trim().to_string();
    let combined_a = combine(&only_a);
    let combined_b = combine(&only_b);

    scorer(&shared, &combined_a)
        .max(scorer(&shared, &combined_b))
        .max(scorer(&combined_a, &combined_b))
}
