use std::time::{Duration, Instant};

use chrono::{TimeZone, Utc};
use tradelog_core::{
    Direction, ParseOptions, Scanner, Session, SessionConfig, Side, TickOutcome, Toggle,
    TradeEntry,
};
use tradelog_dom::HistoryPage;

/// The worked example: one block carrying a date, a profile link and both
/// directions of flow, split across two event sub-blocks.
const EXAMPLE: &str = r##"<!doctype html>
<html><body>
  <div class="tradehistory_page">
    <div class="tradehistory_event_row">
      <div class="tradehistory_date">Jan 1, 2024</div>
      <div class="tradehistory_event">
        You gave <span class="history_item" title="Widget A">?</span> (traded away)
      </div>
      <a href="https://steamcommunity.com/profiles/76561198000000000">Alice</a>
      <div class="tradehistory_event">
        Alice received <span class="history_item" data-economy-item="Gadget B"></span>
      </div>
    </div>
  </div>
</body></html>"##;

fn page_with(events: &[(&str, &str)]) -> String {
    let rows: String = events
        .iter()
        .map(|(date, item)| {
            format!(
                r##"<div class="tradehistory_event">
                     <div class="tradehistory_date">{date}</div>
                     <div class="tradehistory_event_heading">Team Fortress 2</div>
                     You received <span class="history_item">{item}</span>
                   </div>"##
            )
        })
        .collect();
    format!(
        r##"<html><body><div class="tradehistory_events">{rows}</div>
           <a class="load_more_history" href="#">Load more</a></body></html>"##
    )
}

#[test]
fn end_to_end_example_entry() {
    let page = HistoryPage::new(EXAMPLE);
    let mut scanner = Scanner::new(ParseOptions::default());
    let mut out: Vec<TradeEntry> = Vec::new();
    let report = scanner.scan(&page.tree().root(), &Toggle::default(), &mut out);

    // The row and both nested events are all candidate blocks.
    assert_eq!(report.blocks, 3);
    let row = &out[0];
    assert_eq!(row.timestamp, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
    assert_eq!(row.counterpart.as_deref(), Some("Alice"));
    assert_eq!(row.direction, Direction::Mixed);

    let items: Vec<_> = row.items.iter().map(|i| (i.name.as_str(), i.side)).collect();
    assert_eq!(items, vec![("Widget A", Side::Out), ("Gadget B", Side::In)]);
    assert!(row.items.iter().all(|i| i.quantity == 1));
    assert!(row.raw_text.starts_with("Jan 1, 2024 You gave ?"));

    let json = serde_json::to_value(row).unwrap();
    assert_eq!(json["direction"], "mixed");
    assert_eq!(json["counterpart"], "Alice");
}

#[test]
fn scanning_twice_emits_nothing_new() {
    let page = HistoryPage::new(&page_with(&[("Jan 1, 2024", "Hat"), ("Jan 2, 2024", "Key")]));
    let mut scanner = Scanner::default();
    let mut out: Vec<TradeEntry> = Vec::new();

    assert_eq!(scanner.scan(&page.tree().root(), &Toggle::default(), &mut out).emitted, 2);
    assert_eq!(scanner.scan(&page.tree().root(), &Toggle::default(), &mut out).emitted, 0);
    assert_eq!(out[0].items[0].app.as_deref(), Some("Team Fortress 2"));
}

#[test]
fn rerender_of_same_content_is_deduplicated() {
    let html = page_with(&[("Jan 1, 2024", "Hat")]);
    let mut session = Session::new(HistoryPage::new(&html), SessionConfig::default());
    let mut out: Vec<TradeEntry> = Vec::new();
    session.init(&mut out);
    assert_eq!(out.len(), 1);

    let now = Instant::now();
    session.document_mut().reload(&html);
    assert!(session.pump(now));
    let report = session.poll(now + Duration::from_millis(200), &mut out).unwrap();
    assert_eq!(report.blocks, 1);
    assert_eq!(report.new_keys, 0);
    assert_eq!(out.len(), 1);
}

#[test]
fn gating_records_keys_while_disabled() {
    let html = page_with(&[("Jan 1, 2024", "Hat")]);
    let cfg = SessionConfig {
        start_enabled: false,
        ..SessionConfig::default()
    };
    let mut session = Session::new(HistoryPage::new(&html), cfg);
    let mut out: Vec<TradeEntry> = Vec::new();

    session.init(&mut out);
    assert!(out.is_empty());
    assert_eq!(session.seen_count(), 1);

    assert!(session.toggle());
    session.document_mut().reload(&html);
    let now = Instant::now();
    session.pump(now);
    session.poll(now + Duration::from_secs(1), &mut out);
    assert!(out.is_empty());
}

#[test]
fn lazy_pages_arrive_through_pagination() {
    let first = page_with(&[("Jan 3, 2024", "Crate")]);
    let second = page_with(&[("Jan 2, 2024", "Key"), ("Jan 3, 2024", "Crate")]);
    let third = page_with(&[("Jan 1, 2024", "Hat")]);
    let page = HistoryPage::new(&first).with_more_pages([second, third]);

    let cfg = SessionConfig {
        debounce: Duration::from_millis(50),
        load_more_interval: Duration::from_millis(500),
        ..SessionConfig::default()
    };
    let mut session = Session::new(page, cfg);
    let mut out: Vec<TradeEntry> = Vec::new();
    session.init(&mut out);

    let mut now = Instant::now();
    let mut outcomes = Vec::new();
    while session.load_more_present() {
        now += session.load_more_interval();
        outcomes.push(session.pagination_tick(now));
        if let Some(deadline) = session.next_deadline() {
            session.poll(deadline, &mut out);
        }
    }

    assert_eq!(outcomes, vec![TickOutcome::Activated, TickOutcome::Activated]);
    let names: Vec<_> = out.iter().map(|e| e.items[0].name.as_str()).collect();
    assert_eq!(names, vec!["Crate", "Key", "Hat"]);
    assert_eq!(session.document().remaining_pages(), 0);
    assert_eq!(session.pagination_tick(now), TickOutcome::Gone);
}

#[test]
fn hidden_load_more_is_left_alone() {
    let html = r##"<html><body>
        <div class="tradehistory_events"></div>
        <div style="display:none"><a class="load_more_button">More</a></div>
    </body></html>"##;
    let page = HistoryPage::new(html).with_more_pages([page_with(&[("Jan 1, 2024", "Hat")])]);
    let mut session = Session::new(page, SessionConfig::default());
    let mut out: Vec<TradeEntry> = Vec::new();
    session.init(&mut out);

    assert!(session.has_load_more());
    assert_eq!(session.pagination_tick(Instant::now()), TickOutcome::Hidden);
    assert_eq!(session.document().remaining_pages(), 1);
}
