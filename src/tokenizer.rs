use std::sync::LazyLock;

use regex::Regex;

/// Splits page text into the units that become individual items.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits on every `.`.
#[derive(Debug, Default)]
pub struct PeriodTokenizer;

impl Tokenizer for PeriodTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split('.')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("sentence regex is valid")
});

/// Splits after sentence-final punctuation followed by whitespace, so
/// decimals and abbreviations inside words stay intact.
#[derive(Debug, Default)]
pub struct SentenceTokenizer;

impl Tokenizer for SentenceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for end in SENTENCE_END.find_iter(text) {
            push_trimmed(&mut sentences, &text[start..end.end()]);
            start = end.end();
        }
        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}
