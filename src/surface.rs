use std::{
    cell::{Cell, RefCell},
    path::Path,
};

use kdam::{Bar, BarExt, tqdm};
use tracing::debug;

use crate::item::Match;

/// Progress and result display for a run.
///
/// Methods take `&self`; implementations keep their display state behind
/// interior mutability so the surface can be shared with the match
/// observer while a run is in progress.
pub trait Surface {
    /// Called once before the first document, with the document count.
    fn enter(&self, _total: usize) {}

    /// Called once after the run, on every exit path.
    fn exit(&self) {}

    /// A document is about to be searched.
    fn advance(&self, path: &Path);

    /// A match was accepted.
    fn on_new_match(&self, found: &Match);

    /// Display the final rendered result list.
    fn show_results(&self, rendered: &str);
}

/// An entered surface. Leaves it when dropped.
pub struct SurfaceSession<'a> {
    surface: &'a dyn Surface,
}

impl<'a> SurfaceSession<'a> {
    pub fn enter(surface: &'a dyn Surface, total: usize) -> Self {
        surface.enter(total);
        Self { surface }
    }

    /// Pass `paths` through unchanged, announcing each one to the surface
    /// as it is pulled.
    pub fn progress<I>(&self, paths: I) -> impl Iterator<Item = I::Item> + 'a
    where
        I: IntoIterator,
        I::IntoIter: 'a,
        I::Item: AsRef<Path>,
    {
        let surface = self.surface;
        paths.into_iter().inspect(move |path| surface.advance(path.as_ref()))
    }
}

impl Drop for SurfaceSession<'_> {
    fn drop(&mut self) {
        self.surface.exit();
    }
}

// -- progress bar --

/// A `kdam` progress bar on stderr; the bar's description names the
/// current file and its postfix counts matches.
#[derive(Default)]
pub struct ProgressSurface {
    bar: RefCell<Option<Bar>>,
    matches: Cell<usize>,
}

impl ProgressSurface {
    fn finish(&self) {
        if let Some(mut bar) = self.bar.borrow_mut().take() {
            let _ = bar.refresh();
            eprintln!();
        }
    }
}

impl Surface for ProgressSurface {
    fn enter(&self, total: usize) {
        self.matches.set(0);
        *self.bar.borrow_mut() = Some(tqdm!(total = total, desc = "Searching"));
    }

    fn exit(&self) {
        self.finish();
    }

    fn advance(&self, path: &Path) {
        if let Some(bar) = self.bar.borrow_mut().as_mut() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            bar.set_description(format!("File {name}"));
            let _ = bar.update(1);
        }
    }

    fn on_new_match(&self, _found: &Match) {
        let count = self.matches.get() + 1;
        self.matches.set(count);
        if let Some(bar) = self.bar.borrow_mut().as_mut() {
            bar.set_postfix(format!("matches={count}"));
            let _ = bar.refresh();
        }
    }

    fn show_results(&self, rendered: &str) {
        self.finish();
        println!("{rendered}");
    }
}

// -- plain --

/// No progress display; matches are printed as soon as they are found.
#[derive(Debug, Default)]
pub struct PlainSurface;

impl Surface for PlainSurface {
    fn advance(&self, path: &Path) {
        debug!(path = %path.display(), "searching");
    }

    fn on_new_match(&self, found: &Match) {
        println!("{found}");
    }

    fn show_results(&self, rendered: &str) {
        println!("{rendered}");
    }
}
