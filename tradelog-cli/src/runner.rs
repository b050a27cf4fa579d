//! Live watch loop: one tokio task multiplexing every trigger of a session.
//!
//! Triggers: the debounce deadline, the load-more interval, stdin commands
//! (`t` toggles logging, `q` quits), optional file-follow polling and ctrl-c.
//! Everything runs on this single task, so the session needs no locking.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tradelog_core::Session;
use tradelog_dom::HistoryPage;

use crate::sink::OutputSink;

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Re-read this file and re-render the page whenever it changes.
    pub follow: Option<PathBuf>,
    pub follow_interval: Duration,
    /// Stop once nothing can produce new entries anymore.
    pub exit_when_idle: bool,
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending::<()>().await,
    }
}

fn is_idle(session: &Session<HistoryPage>) -> bool {
    !session.load_more_present()
        && session.next_deadline().is_none()
        && session.document().remaining_pages() == 0
}

pub async fn watch(
    mut session: Session<HistoryPage>,
    sink: &mut dyn OutputSink,
    opts: WatchOptions,
) -> Result<()> {
    let report = session.init(&mut *sink);
    sink.flush()?;
    eprintln!(
        "tradelog: watching ({} entries so far, logging {}). Commands: t = toggle, q = quit",
        report.emitted,
        session.toggle_label()
    );

    let mut load_more = tokio::time::interval(session.load_more_interval());
    load_more.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately; activation starts one interval in.
    load_more.tick().await;

    let mut follow_tick = tokio::time::interval(opts.follow_interval);
    follow_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut followed = match &opts.follow {
        Some(p) => Some(tokio::fs::read_to_string(p).await.with_context(|| format!("read {}", p.display()))?),
        None => None,
    };

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        if opts.exit_when_idle && opts.follow.is_none() && is_idle(&session) {
            info!("nothing left to load; exiting");
            break;
        }

        let deadline = session.next_deadline();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }

            _ = sleep_until_opt(deadline) => {
                if let Some(report) = session.poll(Instant::now(), &mut *sink) {
                    debug!(?report, "debounced scan");
                }
            }

            _ = load_more.tick(), if session.load_more_present() => {
                let outcome = session.pagination_tick(Instant::now());
                debug!(?outcome, "load-more tick");
            }

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(cmd)) => match cmd.trim() {
                    "t" | "toggle" => {
                        session.toggle();
                        eprintln!("tradelog: logging {}", session.toggle_label());
                    }
                    "q" | "quit" => break,
                    "" => {}
                    other => warn!(command = other, "unknown command (t = toggle, q = quit)"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },

            _ = follow_tick.tick(), if opts.follow.is_some() => {
                let Some(path) = &opts.follow else { continue };
                let html = match tokio::fs::read_to_string(path).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "follow read failed");
                        continue;
                    }
                };
                if followed.as_deref() != Some(html.as_str()) {
                    info!(path = %path.display(), "page changed on disk; re-rendering");
                    session.document_mut().reload(&html);
                    session.pump(Instant::now());
                    // Re-render replaced the load-more control; bind the new one.
                    session.init(&mut *sink);
                    followed = Some(html);
                }
            }
        }

        sink.flush()?;
    }

    sink.finish()?;
    info!(
        emitted = sink.emitted(),
        seen = session.seen_count(),
        pages = session.document().loaded_pages(),
        "watch finished"
    );
    Ok(())
}
