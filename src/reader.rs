//! Document reader capability and the `lopdf` backend.

use std::path::Path;

use lopdf::{Dictionary, Document as PdfDocument, Object, ObjectId};
use tracing::trace;

use crate::{
    error::{Error, Result},
    text_util,
};

/// A single text fragment failed to decode. The fragment is dropped; the
/// rest of the document is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("undecodable text: {0}")]
pub struct ItemError(pub String);

/// Text that may have failed to decode.
pub type Fragment = std::result::Result<String, ItemError>;

/// Opens documents. One implementation is active per run.
pub trait DocumentReader {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>>;
}

/// An open document.
///
/// Pages are addressed by their zero-based index in `0..page_count()`.
/// Callers never use a handle after [`close`](Self::close); the
/// [`OpenDocument`] guard enforces that.
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Document-level `(key, value)` pairs.
    fn metadata(&mut self) -> Result<Vec<(String, Fragment)>>;

    /// Page text with line breaks normalised to spaces.
    fn page_text(&mut self, page: usize) -> Result<Fragment>;

    /// Annotation contents on a page. Annotations without text are
    /// omitted.
    fn page_annotations(&mut self, page: usize) -> Result<Vec<Fragment>>;

    /// One-based page number shown to users.
    fn page_number(&self, page: usize) -> usize {
        page + 1
    }

    fn close(&mut self);
}

/// Scoped ownership of a [`DocumentHandle`]: the handle is closed exactly
/// once, either explicitly or when the guard goes out of scope.
pub struct OpenDocument {
    handle: Box<dyn DocumentHandle>,
    closed: bool,
}

impl OpenDocument {
    pub fn open(reader: &dyn DocumentReader, path: &Path) -> Result<Self> {
        let handle = reader.open(path)?;
        trace!(path = %path.display(), "document opened");
        Ok(Self {
            handle,
            closed: false,
        })
    }

    pub fn handle(&mut self) -> &mut dyn DocumentHandle {
        self.handle.as_mut()
    }

    pub fn page_count(&self) -> usize {
        self.handle.page_count()
    }

    pub fn page_number(&self, page: usize) -> usize {
        self.handle.page_number(page)
    }

    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.handle.close();
        }
    }
}

impl Drop for OpenDocument {
    fn drop(&mut self) {
        self.release();
    }
}

// -- lopdf backend --

/// PDF reader backed by `lopdf`.
#[derive(Debug, Default)]
pub struct LopdfReader;

impl DocumentReader for LopdfReader {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>> {
        let doc = PdfDocument::load(path).map_err(|e| Error::reader(path, e))?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
        Ok(Box::new(LopdfDocument {
            path: path.to_path_buf(),
            doc: Some(doc),
            pages,
        }))
    }
}

struct LopdfDocument {
    path: std::path::PathBuf,
    doc: Option<PdfDocument>,
    pages: Vec<(u32, ObjectId)>,
}

impl LopdfDocument {
    fn doc(&self) -> Result<&PdfDocument> {
        self.doc
            .as_ref()
            .ok_or_else(|| Error::reader(&self.path, "document already closed"))
    }

    fn page(&self, page: usize) -> Result<(u32, ObjectId)> {
        self.pages.get(page).copied().ok_or_else(|| {
            Error::reader(&self.path, format!("page index {page} out of range"))
        })
    }
}

impl DocumentHandle for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn metadata(&mut self) -> Result<Vec<(String, Fragment)>> {
        let doc = self.doc()?;
        let Ok(info) = doc.trailer.get(b"Info") else {
            return Ok(Vec::new());
        };
        let Ok((_, info)) = doc.dereference(info) else {
            return Ok(Vec::new());
        };
        let Ok(info) = info.as_dict() else {
            return Ok(Vec::new());
        };

        Ok(info
            .iter()
            .filter_map(|(key, value)| {
                let (_, value) = doc.dereference(value).ok()?;
                let bytes = value.as_str().ok()?;
                Some((
                    String::from_utf8_lossy(key).into_owned(),
                    decode_pdf_string(bytes),
                ))
            })
            .collect())
    }

    fn page_text(&mut self, page: usize) -> Result<Fragment> {
        let (number, _) = self.page(page)?;
        Ok(self
            .doc()?
            .extract_text(&[number])
            .map(|text| text_util::normalize_newlines(&text))
            .map_err(|e| ItemError(e.to_string())))
    }

    fn page_annotations(&mut self, page: usize) -> Result<Vec<Fragment>> {
        let (_, id) = self.page(page)?;
        let doc = self.doc()?;
        let page_dict = doc
            .get_dictionary(id)
            .map_err(|e| Error::reader(&self.path, e))?;

        Ok(annotation_dicts(doc, page_dict)
            .into_iter()
            .filter_map(|annot| {
                let (_, contents) =
                    doc.dereference(annot.get(b"Contents").ok()?).ok()?;
                let bytes = contents.as_str().ok()?;
                Some(decode_pdf_string(bytes))
            })
            .filter(|fragment| {
                fragment.as_ref().map_or(true, |s| !s.trim().is_empty())
            })
            .collect())
    }

    fn page_number(&self, page: usize) -> usize {
        self.pages
            .get(page)
            .map_or(page + 1, |(number, _)| *number as usize)
    }

    fn close(&mut self) {
        self.doc = None;
    }
}

fn annotation_dicts<'a>(
    doc: &'a PdfDocument,
    page: &'a Dictionary,
) -> Vec<&'a Dictionary> {
    let Ok(annots) = page.get(b"Annots") else {
        return Vec::new();
    };
    let Ok((_, annots)) = doc.dereference(annots) else {
        return Vec::new();
    };
    let Ok(annots) = annots.as_array() else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|annot: &Object| {
            let (_, annot) = doc.dereference(annot).ok()?;
            annot.as_dict().ok()
        })
        .collect()
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with or without
/// BOM, otherwise Latin-1.
pub fn decode_pdf_string(bytes: &[u8]) -> Fragment {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        if rest.len() % 2 != 0 {
            return Err(ItemError("odd-length UTF-16 string".into()));
        }
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units)
            .map_err(|e| ItemError(e.to_string()));
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}
