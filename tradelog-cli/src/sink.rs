//! Output sinks: where discovered entries go.
//!
//! stdout carries data only (JSON lines or CSV); the `log` format routes each
//! entry through tracing on stderr instead.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tradelog_core::time::to_iso_millis;
use tradelog_core::{EntrySink, TradeEntry, TradeItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per entry.
    Json,
    /// One CSV row per item.
    Csv,
    /// Structured log events on stderr.
    Log,
}

/// An `EntrySink` whose writes can fail; the first failure is kept for `finish`.
pub trait OutputSink: EntrySink {
    fn emitted(&self) -> usize;
    fn flush(&mut self) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

pub fn make_sink<W: Write + 'static>(format: OutputFormat, out: W) -> Box<dyn OutputSink> {
    match format {
        OutputFormat::Json => Box::new(JsonLinesSink::new(out)),
        OutputFormat::Csv => Box::new(CsvSink::new(out)),
        OutputFormat::Log => Box::new(LogSink::default()),
    }
}

pub struct JsonLinesSink<W: Write> {
    out: W,
    emitted: usize,
    error: Option<anyhow::Error>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            emitted: 0,
            error: None,
        }
    }

    fn write_entry(&mut self, entry: &TradeEntry) -> Result<()> {
        serde_json::to_writer(&mut self.out, entry).context("encode entry as JSON")?;
        self.out.write_all(b"\n").context("write entry")?;
        Ok(())
    }
}

impl<W: Write> EntrySink for JsonLinesSink<W> {
    fn emit(&mut self, entry: TradeEntry) {
        if self.error.is_some() {
            return;
        }
        match self.write_entry(&entry) {
            Ok(()) => self.emitted += 1,
            Err(e) => {
                warn!(error = %e, "output failed; dropping further entries");
                self.error = Some(e);
            }
        }
    }
}

impl<W: Write> OutputSink for JsonLinesSink<W> {
    fn emitted(&self) -> usize {
        self.emitted
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush().context("flush output")
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.flush()
    }
}

/// Flattened item row; entries without items still get one row.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    key: String,
    timestamp: String,
    counterpart: &'a str,
    direction: &'a str,
    item: &'a str,
    app: &'a str,
    side: &'a str,
    quantity: Option<u32>,
}

pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    emitted: usize,
    error: Option<anyhow::Error>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(out),
            emitted: 0,
            error: None,
        }
    }

    fn write_entry(&mut self, entry: &TradeEntry) -> Result<()> {
        let key = entry.key();
        let timestamp = entry.timestamp.as_ref().map(to_iso_millis).unwrap_or_default();
        let base = CsvRow {
            key,
            timestamp,
            counterpart: entry.counterpart.as_deref().unwrap_or(""),
            direction: entry.direction.as_str(),
            item: "",
            app: "",
            side: "",
            quantity: None,
        };

        if entry.items.is_empty() {
            self.writer.serialize(&base).context("write CSV row")?;
            return Ok(());
        }
        for item in &entry.items {
            let row = CsvRow {
                key: base.key.clone(),
                timestamp: base.timestamp.clone(),
                item: &item.name,
                app: item.app.as_deref().unwrap_or(""),
                side: item.side.as_str(),
                quantity: Some(item.quantity),
                ..base
            };
            self.writer.serialize(&row).context("write CSV row")?;
        }
        Ok(())
    }
}

impl<W: Write> EntrySink for CsvSink<W> {
    fn emit(&mut self, entry: TradeEntry) {
        if self.error.is_some() {
            return;
        }
        match self.write_entry(&entry) {
            Ok(()) => self.emitted += 1,
            Err(e) => {
                warn!(error = %e, "output failed; dropping further entries");
                self.error = Some(e);
            }
        }
    }
}

impl<W: Write> OutputSink for CsvSink<W> {
    fn emitted(&self) -> usize {
        self.emitted
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flush CSV output")
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.flush()
    }
}

#[derive(Debug, Default)]
pub struct LogSink {
    emitted: usize,
}

impl EntrySink for LogSink {
    fn emit(&mut self, entry: TradeEntry) {
        self.emitted += 1;
        let items = entry
            .items
            .iter()
            .map(describe_item)
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            target: "tradelog::entry",
            timestamp = entry.timestamp.as_ref().map(to_iso_millis).as_deref().unwrap_or("-"),
            counterpart = entry.counterpart.as_deref().unwrap_or("-"),
            direction = entry.direction.as_str(),
            items = %items,
            raw_text = %entry.raw_text,
            "trade"
        );
    }
}

/// `name (side)` or `name [app] (side)`.
fn describe_item(item: &TradeItem) -> String {
    match &item.app {
        Some(app) => format!("{} [{}] ({})", item.name, app, item.side.as_str()),
        None => format!("{} ({})", item.name, item.side.as_str()),
    }
}

impl OutputSink for LogSink {
    fn emitted(&self) -> usize {
        self.emitted
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tradelog_core::{Direction, Side};

    /// Writer that keeps its bytes reachable after being boxed.
    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn entry(items: Vec<TradeItem>) -> TradeEntry {
        TradeEntry {
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            counterpart: Some("Alice".to_string()),
            direction: Direction::Mixed,
            items,
            raw_text: "raw".to_string(),
        }
    }

    #[test]
    fn json_lines_one_object_per_entry() {
        let buf = Shared::default();
        let mut sink = make_sink(OutputFormat::Json, buf.clone());
        sink.emit(entry(vec![TradeItem::new("Widget A", Side::Out)]));
        sink.emit(entry(vec![]));
        sink.finish().unwrap();

        let text = buf.text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["items"][0]["name"], "Widget A");
        assert_eq!(sink.emitted(), 2);
    }

    #[test]
    fn csv_flattens_items() {
        let buf = Shared::default();
        let mut sink = make_sink(OutputFormat::Csv, buf.clone());
        sink.emit(entry(vec![
            TradeItem::new("Widget A", Side::Out).with_app("TF2"),
            TradeItem::new("Gadget B", Side::In),
        ]));
        sink.emit(entry(vec![]));
        sink.finish().unwrap();

        let text = buf.text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "key,timestamp,counterpart,direction,item,app,side,quantity");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with("Alice,mixed,Widget A,TF2,out,1"));
        assert!(lines[2].ends_with("Alice,mixed,Gadget B,,in,1"));
        assert!(lines[3].ends_with("Alice,mixed,,,,"));
    }

    #[test]
    fn log_items_carry_their_app() {
        let with_app = TradeItem::new("Key", Side::Out).with_app("Team Fortress 2");
        assert_eq!(describe_item(&with_app), "Key [Team Fortress 2] (out)");
        assert_eq!(describe_item(&TradeItem::new("Hat", Side::In)), "Hat (in)");

        let mut sink = make_sink(OutputFormat::Log, Shared::default());
        sink.emit(entry(vec![with_app]));
        assert_eq!(sink.emitted(), 1);
        sink.finish().unwrap();
    }
}
