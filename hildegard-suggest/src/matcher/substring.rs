//! Case-insensitive substring matching (degraded mode)

use super::{rank, ScoredTitle, TitleMatcher};

/// Every title containing the query scores 100; catalog order is kept
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl TitleMatcher for SubstringMatcher {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn find(
        &self,
        query: &str,
        titles: &[String],
        limit: usize,
        score_cutoff: u8,
    ) -> Vec<ScoredTitle> {
        let needle = query.to_lowercase();
        let hits = titles
            .iter()
            .filter(|title| title.to_lowercase().contains(&needle))
            .map(|title| ScoredTitle {
                title: title.clone(),
                score: 100,
            })
            .collect();

        rank(hits, limit, score_cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles() -> Vec<String> {
        ["Resta Con Noi", "Alleluia", "Resta qui con noi", "Noi canteremo"]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_case_insensitive_containment_in_catalog_order() {
        let hits = SubstringMatcher.find("NOI", &titles(), 10, 50);
        let found: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();

        assert_eq!(found, vec!["Resta Con Noi", "Resta qui con noi", "Noi canteremo"]);
        assert!(hits.iter().all(|h| h.score == 100));
    }

    #[test]
    fn test_limit_applies() {
        let hits = SubstringMatcher.find("resta", &titles(), 1, 50);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Resta Con Noi");
    }

    #[test]
    fn test_no_match() {
        assert!(SubstringMatcher.find("gloria", &titles(), 10, 50).is_empty());
    }
}
