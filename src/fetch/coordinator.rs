//! # Fetch cycles for the ticker values.
//!
//! ```text
//! run_cycle(now)
//!   generation += 1
//!   ├─ spawn price task ──► price channel ──► recv until generation matches (budget)
//!   ├─ sleep(settle)
//!   ├─ spawn height task ─► height channel ─► recv until generation matches (budget)
//!   └─ snapshot = { price, height, last_update = clock after both }
//! ```
//!
//! Each sub-fetch owns one long-lived channel. A task abandoned after its
//! budget may still send later; its result carries an old generation and is
//! dropped by the next cycle that reads the channel.
//!
//! Label fetches run on their own cadence but share the retry deadline: every
//! attempt of either kind pushes `next_attempt_ms` out by one backoff step,
//! drawn once per attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

use crate::clock::{Clock, Millis, elapsed};
use crate::config::FetchTimings;
use crate::error::FetchError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;

use super::labels::LabelSet;
use super::snapshot::{DataValue, ExternalDataSnapshot};
use super::source::DataSource;

/// Results queued per sub-fetch before a late sender waits.
const SLOT_CAPACITY: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubFetch {
    Price,
    BlockHeight,
}

impl SubFetch {
    fn as_str(self) -> &'static str {
        match self {
            SubFetch::Price => "price",
            SubFetch::BlockHeight => "block_height",
        }
    }
}

struct Tagged {
    generation: u64,
    result: Result<u64, FetchError>,
}

/// Single-writer slot of one sub-fetch.
struct Slot {
    tx: mpsc::Sender<Tagged>,
    rx: mpsc::Receiver<Tagged>,
}

impl Slot {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(SLOT_CAPACITY);
        Self { tx, rx }
    }
}

/// How one sub-fetch resolved within its cycle.
struct Resolved {
    value: DataValue<u64>,
    in_time: bool,
}

/// Refreshes [`ExternalDataSnapshot`] on a cadence.
pub struct FetchCoordinator {
    source: Arc<dyn DataSource>,
    clock: Arc<dyn Clock>,
    timings: FetchTimings,
    backoff: BackoffPolicy,
    bus: Bus,

    snapshot: ExternalDataSnapshot,
    generation: u64,
    force: bool,
    /// No attempt starts before this.
    next_attempt_ms: Option<Millis>,
    consecutive_failures: u32,
    labels: LabelSet,

    price: Slot,
    height: Slot,
}

impl FetchCoordinator {
    pub fn new(
        source: Arc<dyn DataSource>,
        clock: Arc<dyn Clock>,
        timings: FetchTimings,
        bus: Bus,
    ) -> Self {
        Self {
            source,
            clock,
            timings,
            backoff: BackoffPolicy::fixed_ms(timings.backoff_ms),
            bus,
            snapshot: ExternalDataSnapshot::default(),
            generation: 0,
            force: false,
            next_attempt_ms: None,
            consecutive_failures: 0,
            labels: LabelSet::default(),
            price: Slot::new(),
            height: Slot::new(),
        }
    }

    /// Replaces the minimum spacing between attempts (default: fixed `backoff_ms`).
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn snapshot(&self) -> &ExternalDataSnapshot {
        &self.snapshot
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// Marks the data stale and lets the next due check pass regardless of
    /// interval and backoff.
    pub fn force_refresh(&mut self) {
        self.force = true;
        self.snapshot.last_update_ms = None;
    }

    /// Whether a cycle should run at `now`.
    ///
    /// `consuming` is false when no screen shows the values; `link_up` comes
    /// from the network supervisor.
    pub fn due(&self, now: Millis, consuming: bool, link_up: bool) -> bool {
        if !consuming || !link_up {
            return false;
        }
        if self.force {
            return true;
        }
        if !self.retry_allowed(now) {
            return false;
        }
        let interval = if self.snapshot.has_gaps() {
            self.timings.error_retry_ms
        } else {
            self.timings.interval_ms
        };
        self.snapshot
            .last_update_ms
            .is_none_or(|at| elapsed(now, at) >= interval)
    }

    /// Whether a label fetch should run at `now`: not loaded yet, or loaded
    /// longer than `label_interval_ms` ago.
    pub fn labels_due(&self, now: Millis, link_up: bool) -> bool {
        if !link_up || !self.retry_allowed(now) {
            return false;
        }
        self.labels
            .last_update_ms
            .is_none_or(|at| elapsed(now, at) >= self.timings.label_interval_ms)
    }

    /// Fetches the product labels. On success the ticker values are forced
    /// stale so the next due check refreshes them too.
    pub async fn refresh_labels(&mut self, now: Millis) -> bool {
        let source = Arc::clone(&self.source);
        let task = tokio::spawn(async move { source.fetch_labels().await });

        let budget_ms = self.timings.label_timeout_ms;
        let result = match timeout(Duration::from_millis(budget_ms), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(FetchError::ChannelClosed),
            Err(_) => Err(FetchError::Timeout { budget_ms }),
        };
        self.schedule_next_attempt(now);

        let finished = self.clock.now_ms();
        match result {
            Ok(labels) => {
                let count = labels.len();
                self.labels.replace(labels, finished);
                info!(target: "switchcore::fetch", count, "labels updated");
                self.bus.publish(
                    Event::new(EventKind::LabelsUpdated, finished)
                        .with_reason(format!("{count} labels")),
                );
                self.force_refresh();
                true
            }
            Err(e) => {
                warn!(
                    target: "switchcore::fetch",
                    sub_fetch = "labels",
                    error = e.as_label(),
                    retryable = e.is_retryable(),
                    "label fetch failed"
                );
                self.bus.publish(
                    Event::new(EventKind::SubFetchFailed, finished)
                        .with_reason(format!("labels: {}", e.as_message())),
                );
                false
            }
        }
    }

    fn retry_allowed(&self, now: Millis) -> bool {
        self.next_attempt_ms.is_none_or(|at| now >= at)
    }

    fn schedule_next_attempt(&mut self, attempted_at: Millis) {
        let gap = self.backoff.next_ms(self.consecutive_failures);
        self.next_attempt_ms = Some(attempted_at.saturating_add(gap));
    }

    /// Runs one cycle: price, settle, height. Publishes the new snapshot once
    /// both sub-fetches resolved or ran out of budget.
    pub async fn run_cycle(&mut self, now: Millis) -> &ExternalDataSnapshot {
        self.generation += 1;
        let generation = self.generation;
        let forced = std::mem::take(&mut self.force);

        info!(target: "switchcore::fetch", generation, forced, "fetch cycle started");
        let mut started = Event::new(EventKind::FetchStarted, now).with_generation(generation);
        if forced {
            started = started.with_reason("forced");
        }
        self.bus.publish(started);

        let price = self.resolve(SubFetch::Price, generation).await;
        tokio::time::sleep(Duration::from_millis(self.timings.settle_ms)).await;
        let height = self.resolve(SubFetch::BlockHeight, generation).await;

        let finished = self.clock.now_ms();
        self.snapshot = ExternalDataSnapshot {
            price: price.value,
            block_height: height.value,
            price_ready: price.in_time,
            height_ready: height.in_time,
            last_update_ms: Some(finished),
            last_attempt_ms: Some(now),
        };
        if self.snapshot.has_gaps() {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        } else {
            self.consecutive_failures = 0;
        }
        self.schedule_next_attempt(now);

        let summary = format!(
            "price={} height={}",
            availability(price.value),
            availability(height.value)
        );
        info!(target: "switchcore::fetch", generation, %summary, "fetch cycle completed");
        self.bus.publish(
            Event::new(EventKind::FetchCompleted, finished)
                .with_generation(generation)
                .with_reason(summary),
        );
        &self.snapshot
    }

    fn spawn(&self, which: SubFetch, generation: u64) {
        let source = Arc::clone(&self.source);
        let tx = match which {
            SubFetch::Price => self.price.tx.clone(),
            SubFetch::BlockHeight => self.height.tx.clone(),
        };
        tokio::spawn(async move {
            let result = match which {
                SubFetch::Price => source.fetch_price().await,
                SubFetch::BlockHeight => source.fetch_block_height().await,
            };
            let _ = tx.send(Tagged { generation, result }).await;
        });
    }

    async fn resolve(&mut self, which: SubFetch, generation: u64) -> Resolved {
        self.spawn(which, generation);

        let budget_ms = self.timings.sub_fetch_timeout_ms;
        let deadline = Instant::now() + Duration::from_millis(budget_ms);
        let outcome = loop {
            let rx = match which {
                SubFetch::Price => &mut self.price.rx,
                SubFetch::BlockHeight => &mut self.height.rx,
            };
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(tagged)) if tagged.generation == generation => {
                    break Ok(tagged.result);
                }
                Ok(Some(stale)) => {
                    debug!(
                        target: "switchcore::fetch",
                        sub_fetch = which.as_str(),
                        stale = stale.generation,
                        current = generation,
                        "stale result discarded"
                    );
                    self.bus.publish(
                        Event::new(EventKind::StaleResultDiscarded, self.clock.now_ms())
                            .with_generation(stale.generation),
                    );
                }
                Ok(None) => break Ok(Err(FetchError::ChannelClosed)),
                Err(_) => break Err(FetchError::Timeout { budget_ms }),
            }
        };

        let (in_time, result) = match outcome {
            Ok(result) => (true, result),
            Err(timeout) => (false, Err(timeout)),
        };
        match result {
            Ok(v) => Resolved {
                value: DataValue::Available(v),
                in_time,
            },
            Err(e) => {
                warn!(
                    target: "switchcore::fetch",
                    sub_fetch = which.as_str(),
                    generation,
                    error = e.as_label(),
                    retryable = e.is_retryable(),
                    "sub-fetch failed"
                );
                self.bus.publish(
                    Event::new(EventKind::SubFetchFailed, self.clock.now_ms())
                        .with_generation(generation)
                        .with_reason(format!("{}: {}", which.as_str(), e.as_message())),
                );
                Resolved {
                    value: DataValue::Unavailable,
                    in_time,
                }
            }
        }
    }
}

fn availability(value: DataValue<u64>) -> &'static str {
    if value.is_available() {
        "available"
    } else {
        "unavailable"
    }
}
