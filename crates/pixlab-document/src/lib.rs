//! PixelLab Document Model
//!
//! The leaf layer of an editing session:
//! - [`BinaryRef`]: opaque, content-hashed image payload
//! - [`Document`]: immutable source plus current working payload
//! - [`History`]: cursor-addressed, truncate-then-append timeline
//! - [`Workspace`]: a document and its history, mutated together
//!
//! # Example
//!
//! ```rust
//! use pixlab_document::{BinaryRef, Workspace};
//!
//! let mut ws = Workspace::new();
//! ws.load(BinaryRef::new("photo.png", b"...".to_vec()));
//! ws.commit("Grayscale", BinaryRef::new("gray.png", b"gray".to_vec())).unwrap();
//! ws.undo().unwrap();
//! assert_eq!(ws.history().cursor(), Some(0));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod binary;
mod document;
mod error;
mod hash;
mod history;

pub use binary::BinaryRef;
pub use document::{Document, Workspace, ORIGINAL_LABEL};
pub use error::DocumentError;
pub use hash::ContentHash;
pub use history::{History, HistoryEntry, Transition};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
