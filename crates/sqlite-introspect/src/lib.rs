//! Live SQLite-backed implementation of `sqlch_core::SqlClassifier`. Keeps an
//! in-memory connection alive for the whole generator run, installs an
//! authorizer closure, and reports classification plus `PRAGMA table_info`
//! column metadata back to the Module Builder.

mod authorizer;
mod introspector;

pub use introspector::Introspector;
