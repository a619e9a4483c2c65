//! Tick data model
//!
//! - **types**: TickRecord, TickSequence, TickBatch, TimeRange, FileInfo
//! - **error**: crate-level error type

pub mod error;
pub mod types;

pub use error::{TickError, TickResult};
pub use types::{FileId, FileInfo, Side, TickBatch, TickRecord, TickSequence, TimeRange};
