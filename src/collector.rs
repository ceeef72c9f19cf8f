use crate::{
    item::{Item, Match, RENDER_WIDTH},
    scorer::Scorer,
    text_util,
};

type Observer<'a> = Box<dyn FnMut(&Match) + 'a>;

/// Scores items against the query and keeps those that clear the
/// threshold, in the order they were found.
pub struct MatchCollector<'a> {
    scorer: &'a dyn Scorer,
    threshold: u8,
    matches: Vec<Match>,
    observer: Option<Observer<'a>>,
}

impl<'a> MatchCollector<'a> {
    pub fn new(scorer: &'a dyn Scorer, threshold: u8) -> Self {
        Self {
            scorer,
            threshold,
            matches: Vec::new(),
            observer: None,
        }
    }

    /// Call `observer` with every accepted match, before
    /// [`consider`](Self::consider) returns.
    pub fn with_observer(mut self, observer: impl FnMut(&Match) + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Score `item` against `query`; keep it if the score reaches the
    /// threshold.
    pub fn consider(&mut self, item: Item, query: &str) -> Option<&Match> {
        let score = self.scorer.score(item.term().search(), query);
        if score < self.threshold {
            return None;
        }

        let found = Match::new(score, item);
        if let Some(observer) = self.observer.as_mut() {
            observer(&found);
        }
        self.matches.push(found);
        self.matches.last()
    }

    /// Accepted matches in the order they were found.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Sort by descending score (ties keep their order) and format the
    /// result list.
    pub fn render(&mut self) -> String {
        self.matches.sort_by(|a, b| b.cmp(a));

        let rule = text_util::rule(RENDER_WIDTH);
        let mut out = String::new();
        out.push_str(&rule);
        out.push('\n');
        for found in &self.matches {
            out.push_str(&found.to_string());
            out.push('\n');
        }
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!("{} results found.", self.matches.len()));
        out
    }
}
