//! PixelLab Core
//!
//! Coordinates one interactive editing session against a stateless remote
//! image service:
//! - [`TransformationDispatcher`]: one table-driven remote call per apply,
//!   always against the original
//! - [`BatchOrchestrator`]: up to ten independent images, one call,
//!   all-or-nothing results
//! - [`ComparisonController`]: ephemeral side-by-side preview outside history
//! - [`BusyFlag`]: at most one remote-backed call in flight, others rejected
//! - [`EditorSession`]: the façade tying them to a document and its history
//!
//! # Example
//!
//! ```rust,no_run
//! use pixlab_core::{EditorConfig, EditorSession};
//! use pixlab_remote::{OperationId, Parameters};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let session = EditorSession::connect(EditorConfig::default())?;
//! session.load("photo.png", std::fs::read("photo.png")?)?;
//! session.apply(OperationId::Grayscale, &Parameters::new()).await?;
//! session.undo()?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod batch;
mod busy;
mod comparison;
mod config;
mod dispatcher;
mod editor;
mod error;
mod notify;
mod shortcuts;
mod tool;
mod view;

pub use batch::{BatchJob, BatchOrchestrator, BatchResult, JobId, SubmitOutcome};
pub use busy::{BusyFlag, BusyGuard};
pub use comparison::{ComparisonController, ComparisonSnapshot};
pub use config::{ConfigError, EditorConfig, ENV_BACKEND_URL, ENV_REQUEST_TIMEOUT};
pub use dispatcher::{Completed, Plan, TransformationDispatcher};
pub use editor::EditorSession;
pub use error::{EditorError, ErrorKind};
pub use notify::{Level, Notification};
pub use shortcuts::{Command, Shortcut, ShortcutError};
pub use tool::Tool;
pub use view::{BatchSummary, SessionView};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
