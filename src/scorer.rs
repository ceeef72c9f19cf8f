//! Similarity scoring between an item's search text and the query.

use std::collections::BTreeSet;

/// Scores how well `query` matches `term`, from 0 to 100.
///
/// Implementations are deterministic and return 100 when the query is
/// contained in the term (under their own case policy).
pub trait Scorer {
    fn score(&self, term: &str, query: &str) -> u8;
}

/// Case-sensitive substring test: 100 on containment, 0 otherwise.
#[derive(Debug, Default)]
pub struct ExactScorer;

impl Scorer for ExactScorer {
    fn score(&self, term: &str, query: &str) -> u8 {
        if term.contains(query) { 100 } else { 0 }
    }
}

/// Case-insensitive fuzzy scorer.
///
/// A query contained in the term, ignoring case, scores 100. Otherwise
/// both strings are lowercased and reduced to alphanumeric tokens; the
/// score is the best of a plain ratio, a partial (best window) ratio, a
/// sorted-token ratio and a token-set ratio. Terms shorter than the query
/// score 0.
#[derive(Debug, Default)]
pub struct FuzzyScorer;

impl Scorer for FuzzyScorer {
    fn score(&self, term: &str, query: &str) -> u8 {
        if term.to_lowercase().contains(&query.to_lowercase()) {
            return 100;
        }
        if term.chars().count() < query.chars().count() {
            return 0;
        }
        let term = normalize(term);
        let query = normalize(query);
        if term.is_empty() || query.is_empty() {
            return 0;
        }

        [
            ratio(&term, &query),
            partial_ratio(&term, &query),
            token_sort_ratio(&term, &query),
            token_set_ratio(&term, &query),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

/// Lowercase, replace everything but alphanumerics with spaces, collapse
/// whitespace.
fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn chars_ratio(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let matched = 2 * lcs_len(a, b);
    ((matched * 100 + total / 2) / total) as u8
}

/// Indel similarity: `2 * lcs / (len(a) + len(b))`, as a percentage.
fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    chars_ratio(&a, &b)
}

/// Best [`ratio`] of the shorter string against every same-length window
/// of the longer one.
fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut best = 0;
    for window in long.windows(short.len()) {
        best = best.max(chars_ratio(&short, window));
        if best == 100 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

fn token_set_ratio(a: &str, b: &str) -> u8 {
    let a: BTreeSet<&str> = a.split_whitespace().collect();
    let b: BTreeSet<&str> = b.split_whitespace().collect();

    let common = a.intersection(&b).copied().collect::<Vec<_>>().join(" ");
    let only_a = a.difference(&b).copied().collect::<Vec<_>>().join(" ");
    let only_b = b.difference(&a).copied().collect::<Vec<_>>().join(" ");

    let join = |rest: &str| match (common.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => common.clone(),
        (false, false) => format!("{common} {rest}"),
    };
    let with_a = join(&only_a);
    let with_b = join(&only_b);

    let mut best = ratio(&with_a, &with_b);
    if !common.is_empty() {
        best = best.max(ratio(&common, &with_a)).max(ratio(&common, &with_b));
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOREM: &str = "Lorem ipsum dolor sit amet, consetetur sadipscing \
                         elitr, sed diam nonumy eirmod tempor invidunt ut \
                         labore et dolore magna aliquyam erat, sed diam \
                         voluptua.";

    fn fuzzy(query: &str) -> u8 {
        FuzzyScorer.score(LOREM, query)
    }

    #[test]
    fn exact_is_case_sensitive_containment() {
        assert_eq!(ExactScorer.score("ipsum dolor", "ipsum"), 100);
        assert_eq!(ExactScorer.score("ipsum dolor", "Ipsum"), 0);
        assert_eq!(ExactScorer.score("ipsum dolor", "amet"), 0);
    }

    #[test]
    fn fuzzy_containment_scores_100() {
        assert_eq!(fuzzy("ipsum"), 100);
        assert_eq!(fuzzy("ipsum consetetur"), 100);
    }

    #[test]
    fn fuzzy_containment_of_punctuation_scores_100() {
        assert_eq!(FuzzyScorer.score("a-b", "-"), 100);
        assert_eq!(FuzzyScorer.score("C#/.NET notes", "/"), 100);
        assert_eq!(FuzzyScorer.score("x, y", ", "), 100);
    }

    #[test]
    fn fuzzy_empty_query_is_contained() {
        assert_eq!(FuzzyScorer.score("draft v2", ""), 100);
    }

    #[test]
    fn fuzzy_ignores_case() {
        assert_eq!(fuzzy("iPsuM"), 100);
        assert_eq!(fuzzy("IPSUM"), 100);
    }

    #[test]
    fn fuzzy_near_misses_score_between_50_and_100() {
        let queries =
            ["ipsum conseteur", "ipsum-conseteur", "ipum", "ipum labore"];
        for query in queries {
            let s = fuzzy(query);
            assert!(50 < s && s < 100, "{query}: {s}");
        }
    }

    #[test]
    fn fuzzy_term_shorter_than_query_is_zero() {
        assert_eq!(FuzzyScorer.score("abc", "abcdef"), 0);
    }

    #[test]
    fn fuzzy_is_deterministic() {
        assert_eq!(fuzzy("dolore magna"), fuzzy("dolore magna"));
    }

    #[test]
    fn ratio_of_identical_strings() {
        assert_eq!(ratio("hello", "hello"), 100);
        assert_eq!(ratio("abcd", "wxyz"), 0);
    }

    #[test]
    fn partial_ratio_finds_window() {
        assert_eq!(partial_ratio("xx hello yy", "hello"), 100);
    }

    #[test]
    fn token_set_ignores_order_and_extras() {
        assert_eq!(token_set_ratio("b a c", "c a"), 100);
    }
}
