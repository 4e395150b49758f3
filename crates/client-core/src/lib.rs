//! View-model layer for the desktop client: the HTTP client, form
//! validation, history paging, statistics aggregation, and the export
//! browser. Widget code stays thin and calls into this crate.

pub mod api;
pub mod exports;
pub mod form;
pub mod history;
pub mod stats;
pub mod time;
