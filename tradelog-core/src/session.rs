//! Session: the single init entry point tying the pipeline to one page.
//!
//! A session owns the page, the scanner (and with it the dedup store), the
//! change watcher, the pagination driver and the enabled flag. It is driven by
//! three kinds of external triggers, all delivered from one context:
//! - `init` once
//! - `pump` / `poll` for mutation notifications and the debounce deadline
//! - `pagination_tick` on every load-more interval

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::document::Document;
use crate::entry::ParseOptions;
use crate::pagination::{PaginationDriver, TickOutcome, DEFAULT_LOAD_MORE_INTERVAL};
use crate::scanner::{EntrySink, ScanReport, Scanner};
use crate::toggle::Toggle;
use crate::watcher::{ChangeWatcher, DEFAULT_DEBOUNCE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub debounce: Duration,
    pub load_more_interval: Duration,
    pub start_enabled: bool,
    pub parse: ParseOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            load_more_interval: DEFAULT_LOAD_MORE_INTERVAL,
            start_enabled: true,
            parse: ParseOptions::default(),
        }
    }
}

pub struct Session<D: Document> {
    doc: D,
    scanner: Scanner,
    watcher: ChangeWatcher,
    pagination: PaginationDriver<D::Id>,
    toggle: Toggle,
    initialized: bool,
}

impl<D: Document> Session<D> {
    pub fn new(doc: D, cfg: SessionConfig) -> Self {
        Self {
            doc,
            scanner: Scanner::new(cfg.parse),
            watcher: ChangeWatcher::new(cfg.debounce),
            pagination: PaginationDriver::new(cfg.load_more_interval),
            toggle: Toggle::new(cfg.start_enabled),
            initialized: false,
        }
    }

    /// Initial scan plus load-more binding. Safe to call again; later calls
    /// only retry the binding.
    pub fn init<S: EntrySink + ?Sized>(&mut self, sink: &mut S) -> ScanReport {
        let report = if self.initialized {
            ScanReport::default()
        } else {
            // Anything queued so far predates the initial scan, which covers it.
            self.doc.take_mutations();
            self.scan_now(sink)
        };
        self.pagination.init(&self.doc);
        if !self.initialized {
            info!(
                blocks = report.blocks,
                emitted = report.emitted,
                load_more = self.pagination.is_bound(),
                enabled = self.toggle.is_enabled(),
                "session initialized"
            );
        }
        self.initialized = true;
        report
    }

    /// Drain pending mutation records into the watcher. Returns true if armed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let records = self.doc.take_mutations();
        if records.is_empty() {
            return false;
        }
        let armed = self.watcher.observe(&records, now);
        if armed {
            debug!(records = records.len(), "mutation batch armed debounce");
        }
        armed
    }

    /// Run the debounced scan if its deadline has passed.
    pub fn poll<S: EntrySink + ?Sized>(&mut self, now: Instant, sink: &mut S) -> Option<ScanReport> {
        self.pump(now);
        if !self.watcher.poll(now) {
            return None;
        }
        debug!(fired = self.watcher.fired(), "debounce elapsed");
        Some(self.scan_now(sink))
    }

    /// One load-more interval tick; resulting mutations are pumped immediately.
    pub fn pagination_tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.pagination.tick(&mut self.doc, &self.toggle);
        if outcome == TickOutcome::Gone && self.pagination.activations() == 0 {
            warn!("load-more control vanished before it was ever activated");
        }
        self.pump(now);
        outcome
    }

    /// Scan immediately, bypassing the debounce.
    pub fn scan_now<S: EntrySink + ?Sized>(&mut self, sink: &mut S) -> ScanReport {
        self.scanner.scan(&self.doc.root(), &self.toggle, sink)
    }

    pub fn toggle(&mut self) -> bool {
        let enabled = self.toggle.toggle();
        info!(logging = self.toggle.label(), "toggled");
        enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.toggle.is_enabled() != enabled {
            self.toggle.set(enabled);
            info!(logging = self.toggle.label(), "toggled");
        }
    }

    /// "ON" / "OFF", for status lines.
    pub fn toggle_label(&self) -> &'static str {
        self.toggle.label()
    }

    pub fn is_enabled(&self) -> bool {
        self.toggle.is_enabled()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.watcher.deadline()
    }

    pub fn load_more_interval(&self) -> Duration {
        self.pagination.interval()
    }

    pub fn has_load_more(&self) -> bool {
        self.pagination.is_bound()
    }

    /// The bound load-more control is still in the tree.
    pub fn load_more_present(&self) -> bool {
        self.pagination
            .control()
            .is_some_and(|id| self.doc.node(id).is_some())
    }

    pub fn seen_count(&self) -> usize {
        self.scanner.seen().len()
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }
}
