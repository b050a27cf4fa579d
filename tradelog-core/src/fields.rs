//! Field parsers: heuristics over one trade block.
//!
//! Every function here is total. Missing structure turns into `None`, an empty
//! list or a default variant; nothing is surfaced to the caller as an error.

use crate::document::{closest, select_all, select_first, Node, Pattern};
use crate::text::normalize;
use crate::trade::{Direction, Side, TradeItem};

pub const PROFILE_LINK_PATTERNS: &[Pattern] = &[
    Pattern::LinkHrefContains("/profiles/"),
    Pattern::LinkHrefContains("/id/"),
];

pub const ITEM_PATTERNS: &[Pattern] = &[
    Pattern::Class("history_item"),
    Pattern::Class("tradehistory_item"),
    Pattern::Class("item"),
];

pub const EVENT_PATTERNS: &[Pattern] = &[Pattern::Class("tradehistory_event")];

pub const EVENT_LABEL_PATTERNS: &[Pattern] = &[
    Pattern::Class("tradehistory_event_description"),
    Pattern::Class("tradehistory_event_heading"),
];

/// Attributes consulted for an item name, highest priority first.
const ITEM_NAME_ATTRS: &[&str] = &["data-economy-item", "data-tooltip", "title", "data-title"];

/// Classify a whole block by keyword presence.
pub fn infer_direction(text: &str) -> Direction {
    let txt = text.to_lowercase();
    let received = txt.contains("received");
    let gave = txt.contains("given") || txt.contains("gave");

    if received && gave {
        Direction::Mixed
    } else if received {
        Direction::Received
    } else if gave || txt.contains("traded away") {
        Direction::Given
    } else {
        Direction::Unknown
    }
}

/// First profile-looking link: its visible text, else its address.
pub fn extract_counterpart<N: Node>(block: &N) -> Option<String> {
    let link = select_first(block, PROFILE_LINK_PATTERNS)?;
    let name = normalize(&link.text());
    if !name.is_empty() {
        return Some(name);
    }
    link.attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Items in document order; elements without a derivable name are skipped.
pub fn extract_items<N: Node>(block: &N) -> Vec<TradeItem> {
    select_all(block, ITEM_PATTERNS)
        .iter()
        .filter_map(|node| {
            let name = item_name(node)?;
            let event = closest(node, EVENT_PATTERNS);

            let app = event
                .as_ref()
                .and_then(|ev| select_first(ev, EVENT_LABEL_PATTERNS))
                .map(|label| normalize(&label.text()))
                .filter(|t| !t.is_empty());

            let side = match &event {
                Some(ev) if gives_away(&ev.text()) => Side::Out,
                _ => Side::In,
            };

            Some(TradeItem {
                name,
                app,
                quantity: 1,
                side,
            })
        })
        .collect()
}

fn item_name<N: Node>(node: &N) -> Option<String> {
    let raw = ITEM_NAME_ATTRS
        .iter()
        .filter_map(|a| node.attr(a))
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| node.text());

    let name = normalize(&raw);
    (!name.is_empty()).then_some(name)
}

fn gives_away(text: &str) -> bool {
    let txt = text.to_lowercase();
    txt.contains("traded away") || txt.contains("given")
}
