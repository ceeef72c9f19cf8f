//! Capability registry: one resolved implementation per capability kind.
//!
//! Implementations are registered by selector name in an explicit table.
//! Resolution filters the table by an optional selector and insists on
//! exactly one candidate; the winner is built once and memoized, so every
//! later lookup of that kind returns the same instance regardless of the
//! selector passed.

use std::{cell::OnceCell, fmt};

use tracing::debug;

use crate::{
    error::Result,
    reader::{DocumentReader, LopdfReader},
    scorer::{ExactScorer, FuzzyScorer, Scorer},
    segmenter::{Segmenter, SeparatorSegmenter, WordSegmenter},
    surface::{PlainSurface, ProgressSurface, Surface},
    tokenizer::{PeriodTokenizer, SentenceTokenizer, Tokenizer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Reader,
    Tokenizer,
    Segmenter,
    Scorer,
    Surface,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reader => "reader",
            Self::Tokenizer => "tokenizer",
            Self::Segmenter => "segmenter",
            Self::Scorer => "scorer",
            Self::Surface => "surface",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no {kind} implementation matches {}", selector_label(.selector))]
    NoCandidate {
        kind: CapabilityKind,
        selector: Option<String>,
        available: Vec<String>,
    },

    #[error(
        "more than one {kind} implementation matches {}: {}",
        selector_label(.selector),
        .candidates.join(", ")
    )]
    Ambiguous {
        kind: CapabilityKind,
        selector: Option<String>,
        candidates: Vec<String>,
    },

    #[error("failed to construct {kind} implementation '{name}': {message}")]
    Construction {
        kind: CapabilityKind,
        name: String,
        message: String,
    },
}

fn selector_label(selector: &Option<String>) -> String {
    match selector {
        Some(s) => format!("'{s}'"),
        None => "(no selector)".to_string(),
    }
}

type Constructor<T> = Box<dyn Fn() -> Result<Box<T>>>;

/// Registered candidates and the memoized winner for one capability kind.
pub struct Slot<T: ?Sized> {
    kind: CapabilityKind,
    candidates: Vec<(String, Constructor<T>)>,
    resolved: OnceCell<(String, Box<T>)>,
}

impl<T: ?Sized> Slot<T> {
    fn new(kind: CapabilityKind) -> Self {
        Self {
            kind,
            candidates: Vec::new(),
            resolved: OnceCell::new(),
        }
    }

    fn register(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<T>> + 'static,
    ) {
        self.candidates.push((name.into(), Box::new(build)));
    }

    pub fn names(&self) -> Vec<String> {
        self.candidates.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Name of the resolved implementation, if resolution already ran.
    pub fn resolved_name(&self) -> Option<&str> {
        self.resolved.get().map(|(name, _)| name.as_str())
    }

    /// Indices of candidates matching `selector`. An exact
    /// (case-insensitive) name match narrows to that name; otherwise every
    /// name containing the selector matches.
    fn matching(&self, selector: Option<&str>) -> Vec<usize> {
        let Some(selector) = selector else {
            return (0..self.candidates.len()).collect();
        };
        let wanted = selector.to_lowercase();
        let exact: Vec<usize> = self
            .candidates
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name.to_lowercase() == wanted)
            .map(|(i, _)| i)
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        self.candidates
            .iter()
            .enumerate()
            .filter(|(_, (name, _))| name.to_lowercase().contains(&wanted))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn resolve(&self, selector: Option<&str>) -> Result<&T> {
        if let Some((_, instance)) = self.resolved.get() {
            return Ok(instance.as_ref());
        }

        let matching = self.matching(selector);
        let index = match matching.as_slice() {
            [single] => *single,
            [] => {
                return Err(ResolutionError::NoCandidate {
                    kind: self.kind,
                    selector: selector.map(str::to_string),
                    available: self.names(),
                }
                .into());
            }
            many => {
                return Err(ResolutionError::Ambiguous {
                    kind: self.kind,
                    selector: selector.map(str::to_string),
                    candidates: many
                        .iter()
                        .map(|&i| self.candidates[i].0.clone())
                        .collect(),
                }
                .into());
            }
        };

        let (name, build) = &self.candidates[index];
        let instance = build().map_err(|e| ResolutionError::Construction {
            kind: self.kind,
            name: name.clone(),
            message: e.to_string(),
        })?;
        debug!(kind = %self.kind, %name, "capability resolved");

        let (_, instance) =
            self.resolved.get_or_init(|| (name.clone(), instance));
        Ok(instance.as_ref())
    }
}

/// Which implementation to pick for each capability kind. `None` means
/// "whatever is registered, as long as it is unique".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selectors {
    pub reader: Option<String>,
    pub tokenizer: Option<String>,
    pub segmenter: Option<String>,
    pub scorer: Option<String>,
    pub surface: Option<String>,
}

/// Borrowed handles to the resolved implementations of a run.
#[derive(Clone, Copy)]
pub struct Capabilities<'a> {
    pub reader: &'a dyn DocumentReader,
    pub tokenizer: &'a dyn Tokenizer,
    pub segmenter: &'a dyn Segmenter,
    pub scorer: &'a dyn Scorer,
    pub surface: &'a dyn Surface,
}

/// The explicit registration table, constructed once per process and
/// passed to the pipeline by reference.
pub struct CapabilityRegistry {
    readers: Slot<dyn DocumentReader>,
    tokenizers: Slot<dyn Tokenizer>,
    segmenters: Slot<dyn Segmenter>,
    scorers: Slot<dyn Scorer>,
    surfaces: Slot<dyn Surface>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CapabilityRegistry {
    /// A registry with no candidates at all.
    pub fn empty() -> Self {
        Self {
            readers: Slot::new(CapabilityKind::Reader),
            tokenizers: Slot::new(CapabilityKind::Tokenizer),
            segmenters: Slot::new(CapabilityKind::Segmenter),
            scorers: Slot::new(CapabilityKind::Scorer),
            surfaces: Slot::new(CapabilityKind::Surface),
        }
    }

    /// A registry holding every built-in implementation.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_reader("lopdf", || Ok(Box::new(LopdfReader)));
        registry.register_tokenizer("period", || Ok(Box::new(PeriodTokenizer)));
        registry
            .register_tokenizer("sentence", || Ok(Box::new(SentenceTokenizer)));
        registry.register_segmenter("separators", || {
            Ok(Box::new(SeparatorSegmenter))
        });
        registry.register_segmenter("wordsegment", || {
            Ok(Box::new(WordSegmenter::default()))
        });
        registry.register_scorer("exact", || Ok(Box::new(ExactScorer)));
        registry.register_scorer("fuzzy", || Ok(Box::new(FuzzyScorer)));
        registry.register_surface("plain", || Ok(Box::new(PlainSurface)));
        registry.register_surface("progress", || {
            Ok(Box::new(ProgressSurface::default()))
        });
        registry
    }

    pub fn register_reader(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<dyn DocumentReader>> + 'static,
    ) {
        self.readers.register(name, build);
    }

    pub fn register_tokenizer(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<dyn Tokenizer>> + 'static,
    ) {
        self.tokenizers.register(name, build);
    }

    pub fn register_segmenter(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<dyn Segmenter>> + 'static,
    ) {
        self.segmenters.register(name, build);
    }

    pub fn register_scorer(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<dyn Scorer>> + 'static,
    ) {
        self.scorers.register(name, build);
    }

    pub fn register_surface(
        &mut self,
        name: impl Into<String>,
        build: impl Fn() -> Result<Box<dyn Surface>> + 'static,
    ) {
        self.surfaces.register(name, build);
    }

    pub fn reader(
        &self,
        selector: Option<&str>,
    ) -> Result<&dyn DocumentReader> {
        self.readers.resolve(selector)
    }

    pub fn tokenizer(&self, selector: Option<&str>) -> Result<&dyn Tokenizer> {
        self.tokenizers.resolve(selector)
    }

    pub fn segmenter(&self, selector: Option<&str>) -> Result<&dyn Segmenter> {
        self.segmenters.resolve(selector)
    }

    pub fn scorer(&self, selector: Option<&str>) -> Result<&dyn Scorer> {
        self.scorers.resolve(selector)
    }

    pub fn surface(&self, selector: Option<&str>) -> Result<&dyn Surface> {
        self.surfaces.resolve(selector)
    }

    /// Resolve every capability kind at once.
    pub fn resolve_all(
        &self,
        selectors: &Selectors,
    ) -> Result<Capabilities<'_>> {
        Ok(Capabilities {
            reader: self.reader(selectors.reader.as_deref())?,
            tokenizer: self.tokenizer(selectors.tokenizer.as_deref())?,
            segmenter: self.segmenter(selectors.segmenter.as_deref())?,
            scorer: self.scorer(selectors.scorer.as_deref())?,
            surface: self.surface(selectors.surface.as_deref())?,
        })
    }

    /// `(kind, resolved implementation name)` for every resolved kind.
    pub fn resolved(&self) -> Vec<(CapabilityKind, &str)> {
        [
            (CapabilityKind::Reader, self.readers.resolved_name()),
            (CapabilityKind::Tokenizer, self.tokenizers.resolved_name()),
            (CapabilityKind::Segmenter, self.segmenters.resolved_name()),
            (CapabilityKind::Scorer, self.scorers.resolved_name()),
            (CapabilityKind::Surface, self.surfaces.resolved_name()),
        ]
        .into_iter()
        .filter_map(|(kind, name)| name.map(|n| (kind, n)))
        .collect()
    }
}
