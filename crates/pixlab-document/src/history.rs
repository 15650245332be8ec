//! Cursor-addressed edit history
//!
//! The timeline is an append-only log with an explicit cursor. Every change
//! goes through [`History::apply`], a pure function from the current
//! timeline and a [`Transition`] to the next timeline:
//!
//! - `Append` truncates everything after the cursor, then appends
//! - `Undo` / `Redo` / `Goto` move the cursor only
//! - `Clear` empties the log
//!
//! Entries are never mutated once created. The log uses a persistent vector,
//! so producing the next timeline shares structure with the previous one.

use crate::binary::BinaryRef;
use crate::error::DocumentError;
use chrono::{DateTime, Utc};
use im::Vector;

/// One immutable, labelled, timestamped snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    label: String,
    result: BinaryRef,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(label: impl Into<String>, result: BinaryRef) -> Self {
        Self::with_timestamp(label, result, Utc::now())
    }

    /// Create an entry with an explicit timestamp
    #[must_use]
    pub fn with_timestamp(
        label: impl Into<String>,
        result: BinaryRef,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            label: label.into(),
            result,
            created_at,
        }
    }

    /// Operation label shown in the history list
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Result payload of the operation
    #[inline]
    #[must_use]
    pub fn result(&self) -> &BinaryRef {
        &self.result
    }

    /// Creation time
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A change to the timeline
#[derive(Debug, Clone)]
pub enum Transition {
    /// Discard the undone branch and append a new entry
    Append(HistoryEntry),
    /// Move the cursor back one entry
    Undo,
    /// Move the cursor forward one entry
    Redo,
    /// Jump to an arbitrary entry
    Goto(usize),
    /// Empty the timeline
    Clear,
}

/// The session timeline: ordered entries plus a cursor
///
/// Invariant: `cursor` is `None` iff `entries` is empty, otherwise
/// `cursor < entries.len()`. The entry at the cursor is the visually
/// active state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vector<HistoryEntry>,
    cursor: Option<usize>,
}

impl History {
    /// Empty timeline
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeline holding a single root entry, cursor on it
    #[must_use]
    pub fn rooted(root: HistoryEntry) -> Self {
        Self::new().appended(root)
    }

    /// All entries in order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &Vector<HistoryEntry> {
        &self.entries
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the timeline is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cursor position, `None` when empty
    #[inline]
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The visually active entry
    #[must_use]
    pub fn active(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    /// Entry at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// An entry exists before the cursor
    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// An entry exists after the cursor
    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(c) if c + 1 < self.entries.len())
    }

    /// Labels of all entries, in order
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.label.clone()).collect()
    }

    /// Labels from the root up to and including the cursor
    #[must_use]
    pub fn active_labels(&self) -> Vec<String> {
        match self.cursor {
            Some(c) => self.entries.iter().take(c + 1).map(|e| e.label.clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Check a transition without applying it
    ///
    /// # Errors
    /// - `NothingToUndo` / `NothingToRedo` at the ends of the timeline
    /// - `IndexOutOfRange` for a `Goto` outside the timeline
    pub fn validate(&self, transition: &Transition) -> Result<(), DocumentError> {
        match transition {
            Transition::Append(_) | Transition::Clear => Ok(()),
            Transition::Undo if self.can_undo() => Ok(()),
            Transition::Undo => Err(DocumentError::NothingToUndo),
            Transition::Redo if self.can_redo() => Ok(()),
            Transition::Redo => Err(DocumentError::NothingToRedo),
            Transition::Goto(index) if *index < self.entries.len() => Ok(()),
            Transition::Goto(index) => Err(DocumentError::IndexOutOfRange {
                index: *index,
                len: self.entries.len(),
            }),
        }
    }

    /// Pure transition: compute the next timeline
    ///
    /// # Errors
    /// Same as [`History::validate`]; `self` is never modified.
    pub fn apply(&self, transition: Transition) -> Result<History, DocumentError> {
        self.validate(&transition)?;
        let next = match transition {
            Transition::Append(entry) => self.appended(entry),
            Transition::Undo => self.moved_to(self.cursor.map_or(0, |c| c - 1)),
            Transition::Redo => self.moved_to(self.cursor.map_or(0, |c| c + 1)),
            Transition::Goto(index) => self.moved_to(index),
            Transition::Clear => History::new(),
        };
        debug_assert!(next.invariants_hold());
        Ok(next)
    }

    /// Truncate after the cursor, append, move cursor to the new entry
    #[must_use]
    pub fn appended(&self, entry: HistoryEntry) -> History {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let mut entries = self.entries.clone();
        entries.truncate(keep);
        entries.push_back(entry);
        let cursor = Some(entries.len() - 1);
        History { entries, cursor }
    }

    fn moved_to(&self, index: usize) -> History {
        History {
            entries: self.entries.clone(),
            cursor: Some(index),
        }
    }

    /// Append in place; returns the new active entry
    pub fn append(&mut self, entry: HistoryEntry) -> &HistoryEntry {
        *self = self.appended(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Step back one entry
    ///
    /// # Errors
    /// `NothingToUndo` when the cursor is at the root or the timeline is empty
    pub fn undo(&mut self) -> Result<&HistoryEntry, DocumentError> {
        self.step(Transition::Undo)
    }

    /// Step forward one entry
    ///
    /// # Errors
    /// `NothingToRedo` when the cursor is at the last entry
    pub fn redo(&mut self) -> Result<&HistoryEntry, DocumentError> {
        self.step(Transition::Redo)
    }

    /// Jump to `index`
    ///
    /// # Errors
    /// `IndexOutOfRange` when `index >= len()`
    pub fn goto(&mut self, index: usize) -> Result<&HistoryEntry, DocumentError> {
        self.step(Transition::Goto(index))
    }

    /// Empty the timeline
    pub fn clear(&mut self) {
        *self = History::new();
    }

    fn step(&mut self, transition: Transition) -> Result<&HistoryEntry, DocumentError> {
        *self = self.apply(transition)?;
        // apply() only produces cursor moves onto existing entries here
        self.active().ok_or(DocumentError::NothingToUndo)
    }

    /// Cursor invariant check
    #[must_use]
    pub fn invariants_hold(&self) -> bool {
        match self.cursor {
            None => self.entries.is_empty(),
            Some(c) => c < self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(label: &str) -> HistoryEntry {
        HistoryEntry::new(label, BinaryRef::new(label, label.as_bytes().to_vec()))
    }

    fn timeline(labels: &[&str]) -> History {
        labels.iter().fold(History::new(), |h, l| h.appended(entry(l)))
    }

    #[test]
    fn empty_history_has_no_cursor() {
        let history = History::new();
        assert_eq!(history.cursor(), None);
        assert!(history.active().is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn rooted_history_has_cursor_zero() {
        let history = History::rooted(entry("Original"));
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(history.active().unwrap().label(), "Original");
    }

    #[test]
    fn append_moves_cursor_to_end() {
        let history = timeline(&["Original", "Crop", "Rotate"]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
    }

    #[test]
    fn append_after_undo_discards_branch() {
        let mut history = timeline(&["Original", "Crop", "Rotate"]);
        history.undo().unwrap();
        history.undo().unwrap();
        assert_eq!(history.cursor(), Some(0));

        history.append(entry("Sharpen"));
        assert_eq!(history.labels(), vec!["Original", "Sharpen"]);
        assert_eq!(history.cursor(), Some(1));
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_at_root_fails() {
        let mut history = History::rooted(entry("Original"));
        assert_eq!(history.undo().unwrap_err(), DocumentError::NothingToUndo);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn redo_at_end_fails() {
        let mut history = timeline(&["Original", "Crop"]);
        assert_eq!(history.redo().unwrap_err(), DocumentError::NothingToRedo);
    }

    #[test]
    fn undo_then_redo_round_trip() {
        let mut history = timeline(&["Original", "Crop"]);
        assert_eq!(history.undo().unwrap().label(), "Original");
        assert_eq!(history.redo().unwrap().label(), "Crop");
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn goto_bounds() {
        let mut history = timeline(&["Original", "Crop", "Rotate"]);
        assert_eq!(history.goto(1).unwrap().label(), "Crop");
        assert_eq!(
            history.goto(3).unwrap_err(),
            DocumentError::IndexOutOfRange { index: 3, len: 3 }
        );
        assert_eq!(history.cursor(), Some(1));
    }

    #[test]
    fn clear_empties_everything() {
        let mut history = timeline(&["Original", "Crop"]);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.undo().unwrap_err(), DocumentError::NothingToUndo);
        assert_eq!(history.redo().unwrap_err(), DocumentError::NothingToRedo);
    }

    #[test]
    fn append_after_clear_starts_new_root() {
        let mut history = timeline(&["Original", "Crop"]);
        history.clear();
        history.append(entry("Blur"));
        assert_eq!(history.labels(), vec!["Blur"]);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn apply_is_pure() {
        let history = timeline(&["Original", "Crop"]);
        let next = history.apply(Transition::Undo).unwrap();
        assert_eq!(history.cursor(), Some(1));
        assert_eq!(next.cursor(), Some(0));

        let failed = next.apply(Transition::Undo);
        assert!(failed.is_err());
        assert_eq!(next.cursor(), Some(0));
    }

    #[test]
    fn active_labels_stop_at_cursor() {
        let mut history = timeline(&["Original", "Crop", "Rotate"]);
        history.goto(1).unwrap();
        assert_eq!(history.active_labels(), vec!["Original", "Crop"]);
        assert_eq!(history.labels().len(), 3);
    }
}
