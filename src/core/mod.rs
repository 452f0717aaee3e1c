//! Core abstractions shared by the provider, the store and the service

pub mod config;
pub mod deadline;
pub mod error;
pub mod log;
pub mod quotation;
pub mod store;

// Re-export main types for cleaner imports
pub use error::QuoteError;
pub use quotation::{QuoteProvider, Quotation};
pub use store::QuotationStore;
