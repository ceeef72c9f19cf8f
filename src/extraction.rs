//! Turns one document into a lazy sequence of [`Item`]s.
//!
//! The sequence is produced in four stages, always in this order:
//! filesystem info, metadata, page contents and page annotations (the
//! last two only when contents are included). Every stage except the
//! first is backed by the [`CacheStore`]: a cache hit replays the stored
//! items without touching the reader, a miss drives the reader page by
//! page and persists what it produced once the stage has been fully
//! consumed.
//!
//! The document is opened on the first cache miss and closed when the
//! sequence ends or is dropped, whichever comes first.

use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
};

use tracing::{debug, trace, warn};

use crate::{
    cache::{CacheStore, ItemSequence},
    error::{Error, Result},
    fingerprint::{ExtractionFlags, ExtractorKind, Fingerprint},
    item::{Item, Term},
    reader::{DocumentReader, Fragment, OpenDocument},
    registry::Capabilities,
    segmenter::Segmenter,
    tokenizer::Tokenizer,
};

pub const DIRNAME_CATEGORY: &str = "Dirname";
pub const FILENAME_CATEGORY: &str = "Filename";
pub const METADATA_CATEGORY: &str = "Metadata";

/// The capabilities and settings needed to extract items from documents.
#[derive(Clone, Copy)]
pub struct Extractor<'a> {
    reader: &'a dyn DocumentReader,
    tokenizer: &'a dyn Tokenizer,
    segmenter: &'a dyn Segmenter,
    flags: ExtractionFlags,
    cache: &'a CacheStore,
}

impl<'a> Extractor<'a> {
    pub fn new(
        reader: &'a dyn DocumentReader,
        tokenizer: &'a dyn Tokenizer,
        segmenter: &'a dyn Segmenter,
        flags: ExtractionFlags,
        cache: &'a CacheStore,
    ) -> Self {
        Self {
            reader,
            tokenizer,
            segmenter,
            flags,
            cache,
        }
    }

    pub fn from_capabilities(
        caps: Capabilities<'a>,
        flags: ExtractionFlags,
        cache: &'a CacheStore,
    ) -> Self {
        Self::new(caps.reader, caps.tokenizer, caps.segmenter, flags, cache)
    }

    /// The item sequence of the document at `path`.
    ///
    /// Nothing is read until the sequence is pulled. Errors end the
    /// sequence: after yielding an `Err` the iterator returns `None`.
    pub fn items(&self, path: &Path) -> DocumentItems<'a> {
        let mut stages = VecDeque::from([Stage::FileInfo, Stage::Metadata]);
        if self.flags.include_contents {
            stages.extend([Stage::Contents, Stage::Annotations]);
        }
        DocumentItems {
            extractor: *self,
            path: path.to_path_buf(),
            stages,
            cursor: None,
            document: None,
            finished: false,
        }
    }

    fn term(&self, text: String) -> Term {
        if self.flags.segmentize {
            let search = self.segmenter.segment(&text);
            Term::derived(text, search)
        } else {
            Term::verbatim(text)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FileInfo,
    Metadata,
    Contents,
    Annotations,
}

impl Stage {
    fn extractor_kind(self) -> Option<ExtractorKind> {
        match self {
            Self::FileInfo => None,
            Self::Metadata => Some(ExtractorKind::Metadata),
            Self::Contents => Some(ExtractorKind::Contents),
            Self::Annotations => Some(ExtractorKind::Annotations),
        }
    }
}

/// Position inside the current stage.
enum Cursor {
    /// Items already in memory: filesystem info or a cache replay.
    Ready(std::vec::IntoIter<Item>),
    /// Items still to be pulled from the reader.
    Live(LiveStage),
}

/// A stage being extracted from the open document.
struct LiveStage {
    kind: ExtractorKind,
    fingerprint: Fingerprint,
    /// Next page to fetch.
    page: usize,
    metadata_fetched: bool,
    category: String,
    pending: VecDeque<Fragment>,
    produced: Vec<Item>,
}

impl LiveStage {
    fn new(fingerprint: Fingerprint) -> Self {
        Self {
            kind: fingerprint.kind(),
            fingerprint,
            page: 0,
            metadata_fetched: false,
            category: String::new(),
            pending: VecDeque::new(),
            produced: Vec::new(),
        }
    }

    /// Pull the next item. `Ok(None)` means the stage is exhausted.
    fn next_item(
        &mut self,
        extractor: &Extractor<'_>,
        path: &Path,
        document: &mut Option<OpenDocument>,
    ) -> Result<Option<Item>> {
        loop {
            while let Some(fragment) = self.pending.pop_front() {
                match fragment {
                    Ok(text) => {
                        let item = Item::new(
                            Some(path.to_path_buf()),
                            self.category.clone(),
                            extractor.term(text),
                        );
                        self.produced.push(item.clone());
                        return Ok(Some(item));
                    }
                    Err(e) => {
                        trace!(
                            path = %path.display(),
                            category = %self.category,
                            error = %e,
                            "dropping item"
                        );
                    }
                }
            }

            if !self.refill(extractor, path, document)? {
                return Ok(None);
            }
        }
    }

    /// Fetch the next batch of fragments. Returns `false` once the
    /// document has nothing more for this stage.
    fn refill(
        &mut self,
        extractor: &Extractor<'_>,
        path: &Path,
        document: &mut Option<OpenDocument>,
    ) -> Result<bool> {
        let doc = open_document(document, extractor.reader, path)?;

        match self.kind {
            ExtractorKind::Metadata => {
                if self.metadata_fetched {
                    return Ok(false);
                }
                self.metadata_fetched = true;
                self.category = METADATA_CATEGORY.to_string();
                self.pending = doc
                    .handle()
                    .metadata()?
                    .into_iter()
                    .map(|(_, value)| value)
                    .collect();
            }
            ExtractorKind::Contents | ExtractorKind::Annotations => {
                let total = doc.page_count();
                if self.page >= total {
                    return Ok(false);
                }
                let page = self.page;
                self.page += 1;
                self.category = format!(
                    "{} of page {}/{total}",
                    self.kind,
                    doc.page_number(page)
                );

                self.pending = if self.kind == ExtractorKind::Contents {
                    match doc.handle().page_text(page)? {
                        Ok(text) => extractor
                            .tokenizer
                            .tokenize(&text)
                            .into_iter()
                            .map(Ok)
                            .collect(),
                        Err(e) => VecDeque::from([Err(e)]),
                    }
                } else {
                    doc.handle().page_annotations(page)?.into()
                };
            }
        }
        Ok(true)
    }
}

fn open_document<'d>(
    slot: &'d mut Option<OpenDocument>,
    reader: &dyn DocumentReader,
    path: &Path,
) -> Result<&'d mut OpenDocument> {
    if slot.is_none() {
        *slot = Some(OpenDocument::open(reader, path)?);
    }
    slot.as_mut()
        .ok_or_else(|| Error::reader(path, "document is not open"))
}

/// Lazy item sequence of one document. See [`Extractor::items`].
pub struct DocumentItems<'a> {
    extractor: Extractor<'a>,
    path: PathBuf,
    stages: VecDeque<Stage>,
    cursor: Option<Cursor>,
    document: Option<OpenDocument>,
    finished: bool,
}

impl DocumentItems<'_> {
    /// Whether the document is currently open.
    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    fn begin(&self, stage: Stage) -> Result<Cursor> {
        let Some(kind) = stage.extractor_kind() else {
            return Ok(Cursor::Ready(self.file_info().into_iter()));
        };

        let fingerprint =
            Fingerprint::new(kind, &self.path, self.extractor.flags);
        if let Some(sequence) = self.extractor.cache.load(&fingerprint)? {
            debug!(
                path = %self.path.display(),
                %kind,
                items = sequence.items.len(),
                "replaying cached stage"
            );
            return Ok(Cursor::Ready(sequence.items.into_iter()));
        }

        debug!(path = %self.path.display(), %kind, "extracting stage");
        Ok(Cursor::Live(LiveStage::new(fingerprint)))
    }

    fn file_info(&self) -> Vec<Item> {
        let dirname = self
            .path
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let filename = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        vec![
            Item::new(
                Some(self.path.clone()),
                DIRNAME_CATEGORY,
                Term::verbatim(dirname),
            ),
            Item::new(
                Some(self.path.clone()),
                FILENAME_CATEGORY,
                Term::verbatim(filename),
            ),
        ]
    }

    /// Persist a fully drained live stage. Failing to write the cache
    /// does not fail the extraction.
    fn complete(&self, stage: LiveStage) {
        let sequence = ItemSequence::extracted(stage.produced);
        let cache = self.extractor.cache;
        if let Err(e) = cache.store(&stage.fingerprint, &sequence) {
            warn!(
                path = %self.path.display(),
                kind = %stage.kind,
                error = %e,
                "failed to write cache entry"
            );
        }
    }

    fn advance(&mut self) -> Result<Option<Item>> {
        loop {
            match &mut self.cursor {
                None => {
                    let Some(stage) = self.stages.pop_front() else {
                        return Ok(None);
                    };
                    self.cursor = Some(self.begin(stage)?);
                }
                Some(Cursor::Ready(items)) => {
                    if let Some(item) = items.next() {
                        return Ok(Some(item));
                    }
                    self.cursor = None;
                }
                Some(Cursor::Live(stage)) => {
                    let next = stage.next_item(
                        &self.extractor,
                        &self.path,
                        &mut self.document,
                    )?;
                    if next.is_some() {
                        return Ok(next);
                    }
                    if let Some(Cursor::Live(stage)) = self.cursor.take() {
                        self.complete(stage);
                    }
                }
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.cursor = None;
        self.stages.clear();
        if let Some(document) = self.document.take() {
            document.close();
            trace!(path = %self.path.display(), "document closed");
        }
    }
}

impl Iterator for DocumentItems<'_> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}
