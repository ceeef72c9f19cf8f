use std::{collections::HashMap, sync::LazyLock};

use regex::Regex;
use tracing::trace;

/// Splits run-together words ("homepage" -> "home page") so the scorer
/// sees separate tokens.
pub trait Segmenter {
    fn segment(&self, text: &str) -> String;

    /// The separator split every segmenter can fall back to.
    fn fallback(&self, text: &str) -> String {
        split_separators(text)
    }
}

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[/_\-.:,;]").expect("separator regex is valid")
});

/// Split on `/ _ - . : , ;` and join the pieces with single spaces.
pub fn split_separators(text: &str) -> String {
    SEPARATORS.split(text).collect::<Vec<_>>().join(" ")
}

/// Segments by splitting on separators only.
#[derive(Debug, Default)]
pub struct SeparatorSegmenter;

impl Segmenter for SeparatorSegmenter {
    fn segment(&self, text: &str) -> String {
        self.fallback(text)
    }
}

/// Word counts backing [`WordSegmenter`], one `word\tcount` per line.
const UNIGRAMS: &str = include_str!("../data/unigrams.tsv");

/// Corpus size the unigram counts were taken from.
const CORPUS_TOTAL: f64 = 1_024_908_267_229.0;

/// Longest candidate word considered.
const MAX_WORD_LEN: usize = 24;

/// Longest alphanumeric run segmented; longer runs fail over to the
/// separator split.
pub const MAX_RUN_LEN: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("run of {0} characters is too long to segment")]
pub struct SegmentError(pub usize);

/// Unigram word segmentation: each run of alphanumerics is split into
/// the word sequence with the highest probability under the embedded
/// frequency list. Output is lowercase.
#[derive(Debug)]
pub struct WordSegmenter {
    log_probs: HashMap<String, f64>,
}

impl Default for WordSegmenter {
    fn default() -> Self {
        Self::from_unigrams(UNIGRAMS)
    }
}

impl WordSegmenter {
    /// Build from `word\tcount` lines. Malformed lines are skipped.
    pub fn from_unigrams(table: &str) -> Self {
        let log_probs = table
            .lines()
            .filter_map(|line| {
                let (word, count) = line.split_once('\t')?;
                let count: f64 = count.trim().parse().ok()?;
                let log_prob = (count / CORPUS_TOTAL).log10();
                Some((word.trim().to_lowercase(), log_prob))
            })
            .collect();
        Self { log_probs }
    }

    pub fn try_segment(&self, text: &str) -> Result<String, SegmentError> {
        let lowered = text.to_lowercase();
        let mut words = Vec::new();
        for run in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|run| !run.is_empty())
        {
            let chars: Vec<char> = run.chars().collect();
            if chars.len() > MAX_RUN_LEN {
                return Err(SegmentError(chars.len()));
            }
            words.extend(self.segment_run(&chars));
        }
        Ok(words.join(" "))
    }

    fn score(&self, word: &str, len: usize) -> f64 {
        match self.log_probs.get(word) {
            Some(&p) => p,
            // Unknown words are penalised by length.
            None => 1.0 - CORPUS_TOTAL.log10() - len as f64,
        }
    }

    fn segment_run(&self, chars: &[char]) -> Vec<String> {
        let n = chars.len();
        // best[i] = (score, start of last word) for the prefix chars[..i]
        let mut best: Vec<(f64, usize)> = vec![(f64::NEG_INFINITY, 0); n + 1];
        best[0] = (0.0, 0);

        for end in 1..=n {
            for start in end.saturating_sub(MAX_WORD_LEN)..end {
                let word: String = chars[start..end].iter().collect();
                let candidate = best[start].0 + self.score(&word, end - start);
                if candidate > best[end].0 {
                    best[end] = (candidate, start);
                }
            }
        }

        let mut words = Vec::new();
        let mut end = n;
        while end > 0 {
            let start = best[end].1;
            words.push(chars[start..end].iter().collect());
            end = start;
        }
        words.reverse();
        words
    }
}

impl Segmenter for WordSegmenter {
    fn segment(&self, text: &str) -> String {
        self.try_segment(text).unwrap_or_else(|e| {
            trace!(error = %e, "falling back to separator split");
            self.fallback(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_split_all_listed_characters() {
        assert_eq!(
            split_separators("a/b_c-d.e:f,g;h"),
            "a b c d e f g h"
        );
    }

    #[test]
    fn separators_leave_plain_words() {
        assert_eq!(split_separators("plain words"), "plain words");
    }

    #[test]
    fn separator_segmenter_uses_fallback() {
        assert_eq!(SeparatorSegmenter.segment("my_file.pdf"), "my file pdf");
    }

    #[test]
    fn word_segmenter_splits_known_words() {
        let seg = WordSegmenter::default();
        assert_eq!(seg.segment("homepage"), "home page");
        assert_eq!(seg.segment("FreeSoftware"), "free software");
        assert_eq!(
            seg.segment("machinelearning_notes"),
            "machine learning notes"
        );
    }

    #[test]
    fn word_segmenter_keeps_spaced_words() {
        let seg = WordSegmenter::default();
        assert_eq!(seg.segment("open access"), "open access");
    }

    #[test]
    fn word_segmenter_falls_back_on_long_runs() {
        let seg = WordSegmenter::default();
        let long = format!("{}_tail", "x".repeat(MAX_RUN_LEN + 1));
        assert!(seg.try_segment(&long).is_err());
        assert_eq!(seg.segment(&long), split_separators(&long));
    }

    #[test]
    fn custom_table() {
        let seg = WordSegmenter::from_unigrams(
            "foo\t1000000000\nbar\t1000000000\nbad line\n",
        );
        assert_eq!(seg.segment("foobar"), "foo bar");
    }
}
