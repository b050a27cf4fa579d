//! Trade record model and dedup key.
//!
//! Design goals:
//! - serde-ready so sinks can ship entries as JSON/CSV without re-shaping
//! - `derive_key` is a pure function of the identifying fields; `raw_text` is
//!   diagnostic only and never takes part in identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::time::to_iso_millis;

/// Longest `raw_text` kept on an entry, in characters.
pub const RAW_TEXT_LIMIT: usize = 500;

/// Whole-entry classification of trade flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Received,
    Given,
    Mixed,
    Unknown,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Received => "received",
            Direction::Given => "given",
            Direction::Mixed => "mixed",
            Direction::Unknown => "unknown",
        }
    }
}

/// Which party holds the item after the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    In,
    Out,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::In => "in",
            Side::Out => "out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeItem {
    /// Cleaned, never empty.
    pub name: String,
    /// Game/application label, when the surrounding event names one.
    pub app: Option<String>,
    /// Always 1; repeated items are listed individually.
    pub quantity: u32,
    pub side: Side,
}

impl TradeItem {
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        Self {
            name: name.into(),
            app: None,
            quantity: 1,
            side,
        }
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }
}

/// One trade-history occurrence extracted from a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeEntry {
    /// `None` when the page's date text could not be parsed.
    #[serde(serialize_with = "serialize_iso_millis")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Display name (or profile address) of the trading partner.
    pub counterpart: Option<String>,
    pub direction: Direction,
    /// Document order.
    pub items: Vec<TradeItem>,
    /// Normalized block text, at most `RAW_TEXT_LIMIT` characters.
    pub raw_text: String,
}

fn serialize_iso_millis<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(dt) => s.serialize_some(&to_iso_millis(dt)),
        None => s.serialize_none(),
    }
}

impl TradeEntry {
    pub fn key(&self) -> String {
        derive_key(self)
    }
}

/// Canonical dedup key: `timestamp|counterpart|direction|name:side,...`.
pub fn derive_key(entry: &TradeEntry) -> String {
    let ts = entry
        .timestamp
        .as_ref()
        .map(to_iso_millis)
        .unwrap_or_else(|| "raw".to_string());
    let counterpart = entry.counterpart.as_deref().unwrap_or("n/a");
    let items = entry
        .items
        .iter()
        .map(|i| format!("{}:{}", i.name, i.side.as_str()))
        .collect::<Vec<_>>()
        .join(",");

    format!("{ts}|{counterpart}|{}|{items}", entry.direction.as_str())
}
