//! Working document and its coupling to the history timeline
//!
//! [`Document`] holds the immutable source and the current working payload.
//! [`Workspace`] owns a document together with its [`History`] and is the
//! only place `current` is reassigned: on load, on a committed result, and
//! on history navigation.

use crate::binary::BinaryRef;
use crate::error::DocumentError;
use crate::history::{History, HistoryEntry};
use tracing::debug;

/// Label of the root history entry created on load
pub const ORIGINAL_LABEL: &str = "Original";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Loaded {
    original: BinaryRef,
    current: BinaryRef,
}

/// Source image plus current working image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    loaded: Option<Loaded>,
}

impl Document {
    /// Document with nothing loaded
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a source image is present
    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The immutable source
    ///
    /// # Errors
    /// `NotLoaded` before the first load
    pub fn original(&self) -> Result<&BinaryRef, DocumentError> {
        self.loaded
            .as_ref()
            .map(|l| &l.original)
            .ok_or(DocumentError::NotLoaded)
    }

    /// The current working payload
    ///
    /// # Errors
    /// `NotLoaded` before the first load
    pub fn current(&self) -> Result<&BinaryRef, DocumentError> {
        self.loaded
            .as_ref()
            .map(|l| &l.current)
            .ok_or(DocumentError::NotLoaded)
    }

    fn load(&mut self, source: BinaryRef) {
        self.loaded = Some(Loaded {
            original: source.clone(),
            current: source,
        });
    }

    fn set_current(&mut self, current: BinaryRef) -> Result<(), DocumentError> {
        let loaded = self.loaded.as_mut().ok_or(DocumentError::NotLoaded)?;
        loaded.current = current;
        Ok(())
    }
}

/// A document and its edit timeline, mutated together
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    document: Document,
    history: History,
}

impl Workspace {
    /// Empty workspace
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The document
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The timeline
    #[inline]
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Load a new source
    ///
    /// Sets both `original` and `current` and resets the timeline to a single
    /// [`ORIGINAL_LABEL`] entry with the cursor on it.
    pub fn load(&mut self, source: BinaryRef) {
        debug!(name = source.name(), hash = %source.hash().short(), "loading document");
        self.document.load(source.clone());
        self.history = History::rooted(HistoryEntry::new(ORIGINAL_LABEL, source));
    }

    /// Record a successful operation result
    ///
    /// Truncates the undone branch, appends the entry, and makes its result
    /// the current payload.
    ///
    /// # Errors
    /// `NotLoaded` if no document is present; nothing changes in that case
    pub fn commit(
        &mut self,
        label: impl Into<String>,
        result: BinaryRef,
    ) -> Result<&HistoryEntry, DocumentError> {
        self.document.set_current(result.clone())?;
        Ok(self.history.append(HistoryEntry::new(label, result)))
    }

    /// Step back and restore that entry's payload
    ///
    /// # Errors
    /// `NothingToUndo` at the root or on an empty timeline
    pub fn undo(&mut self) -> Result<&HistoryEntry, DocumentError> {
        let result = self.history.undo()?.result().clone();
        self.restore(result)
    }

    /// Step forward and restore that entry's payload
    ///
    /// # Errors
    /// `NothingToRedo` at the last entry
    pub fn redo(&mut self) -> Result<&HistoryEntry, DocumentError> {
        let result = self.history.redo()?.result().clone();
        self.restore(result)
    }

    /// Jump to an entry and restore its payload
    ///
    /// # Errors
    /// `IndexOutOfRange` outside the timeline
    pub fn goto(&mut self, index: usize) -> Result<&HistoryEntry, DocumentError> {
        let result = self.history.goto(index)?.result().clone();
        self.restore(result)
    }

    /// Empty the timeline; the document is left as displayed
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn restore(&mut self, result: BinaryRef) -> Result<&HistoryEntry, DocumentError> {
        self.document.set_current(result)?;
        self.history.active().ok_or(DocumentError::NotLoaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image(name: &str) -> BinaryRef {
        BinaryRef::new(name, name.as_bytes().to_vec())
    }

    #[test]
    fn unloaded_document_reports_precondition() {
        let doc = Document::new();
        assert!(!doc.is_loaded());
        assert_eq!(doc.original().unwrap_err(), DocumentError::NotLoaded);
        assert_eq!(doc.current().unwrap_err(), DocumentError::NotLoaded);
    }

    #[test]
    fn load_sets_original_and_current() {
        let mut ws = Workspace::new();
        ws.load(image("source.png"));
        assert_eq!(ws.document().original().unwrap().name(), "source.png");
        assert_eq!(ws.document().current().unwrap().name(), "source.png");
        assert_eq!(ws.history().labels(), vec![ORIGINAL_LABEL]);
        assert_eq!(ws.history().cursor(), Some(0));
    }

    #[test]
    fn commit_requires_document() {
        let mut ws = Workspace::new();
        let err = ws.commit("Crop", image("crop")).unwrap_err();
        assert_eq!(err, DocumentError::NotLoaded);
        assert!(ws.history().is_empty());
    }

    #[test]
    fn commit_updates_current_not_original() {
        let mut ws = Workspace::new();
        ws.load(image("source"));
        ws.commit("Crop", image("crop")).unwrap();
        assert_eq!(ws.document().original().unwrap().name(), "source");
        assert_eq!(ws.document().current().unwrap().name(), "crop");
    }

    #[test]
    fn navigation_restores_entry_payload() {
        let mut ws = Workspace::new();
        ws.load(image("source"));
        ws.commit("Crop", image("crop")).unwrap();
        ws.commit("Rotate", image("rotate")).unwrap();

        ws.undo().unwrap();
        assert_eq!(ws.document().current().unwrap().name(), "crop");
        ws.goto(0).unwrap();
        assert_eq!(ws.document().current().unwrap().name(), "source");
        ws.redo().unwrap();
        assert_eq!(ws.document().current().unwrap().name(), "crop");
    }

    #[test]
    fn failed_navigation_leaves_current() {
        let mut ws = Workspace::new();
        ws.load(image("source"));
        ws.commit("Crop", image("crop")).unwrap();
        assert!(ws.redo().is_err());
        assert!(ws.goto(5).is_err());
        assert_eq!(ws.document().current().unwrap().name(), "crop");
        assert_eq!(ws.history().cursor(), Some(1));
    }

    #[test]
    fn clear_history_keeps_document() {
        let mut ws = Workspace::new();
        ws.load(image("source"));
        ws.commit("Crop", image("crop")).unwrap();
        ws.clear_history();
        assert!(ws.history().is_empty());
        assert_eq!(ws.document().current().unwrap().name(), "crop");
        assert_eq!(ws.document().original().unwrap().name(), "source");
    }

    #[test]
    fn reload_resets_history() {
        let mut ws = Workspace::new();
        ws.load(image("first"));
        ws.commit("Crop", image("crop")).unwrap();
        ws.load(image("second"));
        assert_eq!(ws.history().len(), 1);
        assert_eq!(ws.document().current().unwrap().name(), "second");
    }
}
