//! Entry builder: one `TradeEntry` per candidate block.

use chrono_tz::Tz;

use crate::document::{select_first, Node, Pattern};
use crate::fields::{extract_counterpart, extract_items, infer_direction};
use crate::text::{normalize, truncate_chars};
use crate::time::parse_timestamp;
use crate::trade::{TradeEntry, RAW_TEXT_LIMIT};

pub const DATE_PATTERNS: &[Pattern] = &[
    Pattern::Class("tradehistory_date"),
    Pattern::Class("tradehistory_timestamp"),
    Pattern::Class("date"),
];

/// Knobs for field parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Zone used for date text that carries no offset.
    pub timezone: Tz,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { timezone: Tz::UTC }
    }
}

/// Build an entry from a block. Never fails; unknown fields stay empty.
pub fn build_entry<N: Node>(block: &N, opts: &ParseOptions) -> TradeEntry {
    let date_text = select_first(block, DATE_PATTERNS)
        .map(|el| normalize(&el.text()))
        .unwrap_or_default();
    let timestamp = parse_timestamp(&date_text, opts.timezone);

    let text = block.text();
    let raw = normalize(&text);

    TradeEntry {
        timestamp,
        counterpart: extract_counterpart(block),
        direction: infer_direction(&text),
        items: extract_items(block),
        raw_text: truncate_chars(&raw, RAW_TEXT_LIMIT).to_string(),
    }
}
