//! CRM → database location reconciliation.

pub mod error;
pub mod normalize;
pub mod pipeline;

pub use error::SyncError;
pub use normalize::normalize_location;
pub use pipeline::{run_full_sync, SyncOptions, SyncSummary, SYNC_TYPE_FULL};
