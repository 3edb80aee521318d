// src/watch.rs
use std::path::Path;
use std::time::{Duration, Instant, SystemTime};

/// Quiet period after the last change before the pipeline re-runs.
pub const DEBOUNCE: Duration = Duration::from_millis(700);
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Collapses bursts of change notifications into a single trigger.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending_since: None }
    }

    /// Records a change, restarting the quiet period.
    pub fn notify(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// True once per burst, when the quiet period has elapsed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Polls `path` and calls `on_change` after each debounced burst of edits, until Ctrl-C.
pub async fn watch_file<F>(path: &Path, mut on_change: F)
where
    F: FnMut(),
{
    let mut last_seen = modified_at(path).await;
    let mut debouncer = Debouncer::new(DEBOUNCE);
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    tracing::info!("Watching {} for changes (Ctrl-C to stop)", path.display());

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Stopped watching {}", path.display());
                return;
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                let current = modified_at(path).await;
                if current != last_seen {
                    tracing::debug!("Change detected in {}", path.display());
                    last_seen = current;
                    debouncer.notify(now);
                }
                if debouncer.fire(now) {
                    on_change();
                }
            }
        }
    }
}
