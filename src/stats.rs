//! Per-hour request counter persisted as a JSON file.
//!
//! The live map is mutex-guarded in memory; a background task flushes it to
//! disk on an interval and the server flushes once more at shutdown. The
//! file maps date ("dd.mm.yyyy") to hour-of-day ("HH") to completed-request
//! count.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type UsageMap = BTreeMap<String, BTreeMap<String, u64>>;

pub struct UsageStats {
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    counts: UsageMap,
    dirty: bool,
}

impl UsageStats {
    /// Load the counter file. A missing or unreadable file starts the
    /// counter empty rather than failing startup.
    pub fn load(path: impl Into<PathBuf>) -> UsageStats {
        let path = path.into();
        let counts = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "stats file unreadable, starting empty");
                    UsageMap::new()
                }
            },
            Err(_) => UsageMap::new(),
        };
        UsageStats {
            path,
            inner: Mutex::new(Inner {
                counts,
                dirty: false,
            }),
        }
    }

    /// Count one completed request against its calendar date and hour.
    pub fn record(&self, now: DateTime<Local>) {
        let date = now.format("%d.%m.%Y").to_string();
        let hour = now.format("%H").to_string();
        let mut inner = self.inner.lock().expect("stats lock poisoned");
        *inner
            .counts
            .entry(date)
            .or_default()
            .entry(hour)
            .or_insert(0) += 1;
        inner.dirty = true;
    }

    pub fn snapshot(&self) -> UsageMap {
        self.inner.lock().expect("stats lock poisoned").counts.clone()
    }

    /// Persist the whole map if it changed since the last flush.
    pub fn flush(&self) -> io::Result<()> {
        let serialized = {
            let mut inner = self.inner.lock().expect("stats lock poisoned");
            if !inner.dirty {
                return Ok(());
            }
            inner.dirty = false;
            serde_json::to_string(&inner.counts)?
        };
        std::fs::write(&self.path, serialized)
    }
}

/// Counts every completed request, success or failure.
pub async fn track_usage(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    state.stats.record(Local::now());
    response
}

/// Background flusher: persists the counter on a fixed interval.
pub fn spawn_flusher(stats: Arc<UsageStats>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            if let Err(err) = stats.flush() {
                tracing::warn!(%err, "stats flush failed");
            }
        }
    })
}
