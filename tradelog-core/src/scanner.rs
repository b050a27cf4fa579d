//! Scanner: block discovery, entry building and dedup filtering.
//!
//! "Enabled" gates emission, not discovery: a disabled scan still records
//! every key it builds, so toggling back on never resurfaces entries that
//! were already on the page.

use tracing::debug;

use crate::document::{select_all, Node, Pattern};
use crate::entry::{build_entry, ParseOptions};
use crate::seen::SeenKeys;
use crate::toggle::Toggle;
use crate::trade::TradeEntry;

pub const BLOCK_PATTERNS: &[Pattern] = &[
    Pattern::Class("tradehistory_event"),
    Pattern::Class("inventory_history_row"),
    Pattern::Class("tradehistory_event_row"),
];

/// Output boundary for newly discovered entries.
pub trait EntrySink {
    fn emit(&mut self, entry: TradeEntry);
}

impl EntrySink for Vec<TradeEntry> {
    fn emit(&mut self, entry: TradeEntry) {
        self.push(entry);
    }
}

impl<F: FnMut(TradeEntry)> EntrySink for F {
    fn emit(&mut self, entry: TradeEntry) {
        self(entry)
    }
}

/// Outcome of one scan pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub blocks: usize,
    pub new_keys: usize,
    pub emitted: usize,
}

#[derive(Debug, Default)]
pub struct Scanner {
    seen: SeenKeys,
    opts: ParseOptions,
}

impl Scanner {
    pub fn new(opts: ParseOptions) -> Self {
        Self {
            seen: SeenKeys::new(),
            opts,
        }
    }

    pub fn seen(&self) -> &SeenKeys {
        &self.seen
    }

    /// Scan every block under `root` in document order.
    pub fn scan<N, S>(&mut self, root: &N, toggle: &Toggle, sink: &mut S) -> ScanReport
    where
        N: Node,
        S: EntrySink + ?Sized,
    {
        let blocks = select_all(root, BLOCK_PATTERNS);
        let mut report = ScanReport {
            blocks: blocks.len(),
            ..ScanReport::default()
        };

        for block in &blocks {
            let entry = build_entry(block, &self.opts);
            let key = entry.key();
            if !self.seen.insert(key) {
                continue;
            }
            report.new_keys += 1;
            if toggle.is_enabled() {
                sink.emit(entry);
                report.emitted += 1;
            }
        }

        debug!(
            blocks = report.blocks,
            new_keys = report.new_keys,
            emitted = report.emitted,
            seen = self.seen.len(),
            "scan pass"
        );
        report
    }
}
