//! tradelog-core: extraction and deduplication pipeline for trade-history pages

pub mod document;
pub mod entry;
pub mod fields;
pub mod pagination;
pub mod scanner;
pub mod seen;
pub mod session;
pub mod text;
pub mod time;
pub mod toggle;
pub mod trade;
pub mod tree;
pub mod watcher;

pub use document::{Document, MutationRecord, Node, Pattern};
pub use entry::{build_entry, ParseOptions};
pub use pagination::{PaginationDriver, TickOutcome};
pub use scanner::{EntrySink, ScanReport, Scanner};
pub use seen::SeenKeys;
pub use session::{Session, SessionConfig};
pub use toggle::Toggle;
pub use trade::{derive_key, Direction, Side, TradeEntry, TradeItem};
pub use tree::{DomTree, NodeId, NodeRef};
pub use watcher::ChangeWatcher;
