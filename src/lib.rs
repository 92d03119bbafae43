//! Toggl Invoice Library
//!
//! This library fetches a window of Toggl time entries, joins them with their
//! projects, clients, workspaces and user, bills them at a billable and a
//! non-billable hourly rate, and renders the result as an invoice PDF.

pub mod billing;
pub mod cli;
pub mod config;
pub mod envfile;
pub mod error;
pub mod helpers;
pub mod models;
pub mod service;
pub mod window;

pub use config::Config;
pub use error::{InvoiceError, Reference};
pub use service::InvoiceService;
pub use window::{Offset, TimeWindow};

// Re-export key types for convenience
pub use helpers::pdf::{InvoiceRenderer, PdfRenderer};
pub use helpers::toggl::{Resource, ResourceFetcher, TogglClient};
pub use models::invoice::{BilledEntry, EnrichedEntry, Invoice};
