//! PixelLab Remote Contract
//!
//! Everything needed to talk to the stateless image service:
//! - [`CommandTable`]: operation id to endpoint, form fields and history label
//! - [`BatchRequest`] / [`decode_batch_response`]: the batch contract
//! - [`ExportRequest`], [`SessionReport`], [`ImageInfo`]: export and reporting
//! - [`RemoteService`]: the async seam the session dispatches through
//! - [`HttpRemote`]: the reqwest-backed implementation
//!
//! Parameter validation happens in [`CommandTable::prepare`], before any
//! request exists. A failed validation never reaches the network.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod batch;
mod error;
mod export;
mod http;
mod operation;
mod service;
mod table;

pub use batch::{decode_batch_response, BatchItem, BatchOperation, BatchRequest, MAX_BATCH_SIZE};
pub use error::RemoteError;
pub use export::{
    ExportFormat, ExportRequest, ExportedFile, ImageInfo, SessionReport, DEFAULT_QUALITY,
};
pub use http::{HttpRemote, HEIGHT_HEADER, WIDTH_HEADER};
pub use operation::{FormField, OperationId, Parameters};
pub use service::RemoteService;
pub use table::{endpoint_for, CommandTable, OperationContract, PreparedOperation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
