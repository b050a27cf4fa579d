//! tradelog-dom: HTML host adapter for the tradelog pipeline.
//!
//! Loads saved trade-history pages into a `DomTree` and plays the live page:
//! lazy pages behind the load-more control, in-place reloads, mutation records.

pub mod html;
pub mod page;

pub use html::{parse_document, parse_file};
pub use page::HistoryPage;
