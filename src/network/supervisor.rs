//! # Network resilience supervisor.
//!
//! Three fault domains, each on its own cadence, all advanced from the
//! foreground tick:
//!
//! ```text
//! tick(now)
//!   ├─ every link_check_ms      link_status()        ─► Link raised / cleared
//!   ├─ every internet_check_ms  http_probe() × N     ─► Internet raised / cleared
//!   └─ every tick (link up)     socket
//!        ├─ connected: ping every ping_interval_ms, pong deadline pong_timeout_ms
//!        └─ down: RetryRound (reconnect_socket per attempt) ─► Socket raised when exhausted
//! ```
//!
//! Only the internet check awaits (bounded by attempts × timeout + gaps).
//! Reconnect attempts are spread over ticks through [`RetryRound`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Millis, elapsed};
use crate::config::{Endpoints, NetworkTimings};
use crate::events::{Bus, Event, EventKind};
use crate::policies::{BackoffPolicy, RetryPolicy, RetryRound, RetryStep};

use super::health::{FaultKind, LinkHealth, LinkState};
use super::probe::ConnectivityProbe;

/// A change of one fault domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthTransition {
    Raised(FaultKind),
    Cleared(FaultKind),
}

/// Owner and single writer of [`LinkHealth`].
pub struct NetworkSupervisor {
    probe: Arc<dyn ConnectivityProbe>,
    endpoints: Endpoints,
    timings: NetworkTimings,
    reconnect: RetryPolicy,
    bus: Bus,

    health: LinkHealth,
    last_link_check: Option<Millis>,
    last_internet_check: Option<Millis>,
    last_socket_check: Option<Millis>,
    last_ping: Option<Millis>,
    socket_round: Option<RetryRound>,
}

fn due(last: Option<Millis>, period: Millis, now: Millis) -> bool {
    last.is_none_or(|t| elapsed(now, t) >= period)
}

impl NetworkSupervisor {
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        endpoints: Endpoints,
        timings: NetworkTimings,
        bus: Bus,
    ) -> Self {
        let reconnect = RetryPolicy::new(
            timings.socket_reconnect_attempts,
            BackoffPolicy::fixed_ms(timings.socket_reconnect_delay_ms),
        );
        Self {
            probe,
            endpoints,
            timings,
            reconnect,
            bus,
            health: LinkHealth::default(),
            last_link_check: None,
            last_internet_check: None,
            last_socket_check: None,
            last_ping: None,
            socket_round: None,
        }
    }

    /// Replaces the socket reconnect policy (default: N attempts, fixed delay).
    pub fn with_reconnect_policy(mut self, policy: RetryPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    pub fn health(&self) -> &LinkHealth {
        &self.health
    }

    pub fn link_up(&self) -> bool {
        self.health.link_up()
    }

    /// Reads the radio status without touching health or cadences.
    pub fn poll_link_status(&self) -> LinkState {
        self.probe.link_status()
    }

    /// Runs whatever checks are due at `now`.
    pub async fn tick(&mut self, now: Millis) -> Vec<HealthTransition> {
        let mut out = Vec::new();

        if due(self.last_link_check, self.timings.link_check_ms, now) {
            self.last_link_check = Some(now);
            self.check_link(now, &mut out);
        }
        if !self.health.link_up() {
            return out;
        }

        if due(self.last_internet_check, self.timings.internet_check_ms, now) {
            self.last_internet_check = Some(now);
            self.check_internet(now, &mut out).await;
        }
        if !self.health.is_broken(FaultKind::Internet) {
            self.supervise_socket(now, &mut out).await;
        }
        out
    }

    /// The socket layer reports a (re)connect.
    pub fn on_socket_connected(&mut self, now: Millis) -> Option<HealthTransition> {
        info!(target: "switchcore::network", now, "socket connected");
        self.health.socket_confirmed_once = true;
        self.health.waiting_for_pong = false;
        self.last_ping = Some(now);
        self.socket_round = None;
        self.clear(FaultKind::Socket, now)
    }

    /// The socket layer reports a disconnect; recovery starts on the next tick.
    pub fn on_socket_disconnected(&mut self, now: Millis) {
        info!(target: "switchcore::network", now, "socket disconnected");
        self.health.waiting_for_pong = false;
        self.last_socket_check = None;
    }

    pub fn on_pong(&mut self, now: Millis) {
        self.health.last_pong_ms = Some(now);
        self.health.waiting_for_pong = false;
    }

    fn check_link(&mut self, now: Millis, out: &mut Vec<HealthTransition>) {
        let status = self.probe.link_status();
        self.health.wifi = status;
        match status {
            LinkState::Connected => {
                if let Some(t) = self.clear(FaultKind::Link, now) {
                    // re-check reachability right away
                    self.last_internet_check = None;
                    out.push(t);
                }
            }
            LinkState::Connecting => {
                self.health.errors.bump(FaultKind::Link);
                out.extend(self.raise(FaultKind::Link, now));
            }
            LinkState::Disconnected => {
                self.health.errors.bump(FaultKind::Link);
                out.extend(self.raise(FaultKind::Link, now));
                self.socket_round = None;
                self.probe.begin_link_reconnect();
            }
        }
    }

    async fn check_internet(&mut self, now: Millis, out: &mut Vec<HealthTransition>) {
        let timeout = Duration::from_millis(self.timings.internet_attempt_timeout_ms);
        let gap = Duration::from_millis(self.timings.internet_attempt_gap_ms);
        let attempts = self.timings.internet_attempts.max(1);

        let mut reachable = false;
        for attempt in 1..=attempts {
            let probe = self
                .probe
                .http_probe(&self.endpoints.internet_probe_url, timeout);
            match tokio::time::timeout(timeout, probe).await {
                Ok(Some(status)) if status > 0 => {
                    debug!(target: "switchcore::network", attempt, status, "internet reachable");
                    reachable = true;
                    break;
                }
                Ok(other) => {
                    debug!(target: "switchcore::network", attempt, ?other, "internet probe failed")
                }
                Err(_) => debug!(target: "switchcore::network", attempt, "internet probe timed out"),
            }
            if attempt < attempts {
                tokio::time::sleep(gap).await;
            }
        }

        if reachable {
            self.health.internet_confirmed_once = true;
            out.extend(self.clear(FaultKind::Internet, now));
        } else {
            self.health.errors.bump(FaultKind::Internet);
            out.extend(self.raise(FaultKind::Internet, now));
            self.socket_round = None;
            self.probe.disconnect_socket();
        }
    }

    async fn supervise_socket(&mut self, now: Millis, out: &mut Vec<HealthTransition>) {
        if self.probe.socket_is_connected() {
            self.socket_round = None;
            self.health.socket_confirmed_once = true;
            out.extend(self.clear(FaultKind::Socket, now));
            self.keep_alive(now);
            return;
        }
        self.health.waiting_for_pong = false;

        if self.socket_round.is_none()
            && due(self.last_socket_check, self.timings.link_check_ms, now)
        {
            self.last_socket_check = Some(now);
            if !self.server_reachable().await {
                warn!(target: "switchcore::network", host = %self.endpoints.server_host, "server unreachable");
                self.health.errors.bump(FaultKind::Socket);
                out.extend(self.raise(FaultKind::Socket, now));
                return;
            }
            self.socket_round = Some(RetryRound::start(self.reconnect, now));
        }

        let Some(round) = self.socket_round.as_mut() else {
            return;
        };
        match round.poll(now) {
            RetryStep::Wait => {}
            RetryStep::Attempt { attempt, delay_ms } => {
                debug!(target: "switchcore::network", attempt, delay_ms, "socket reconnect");
                self.probe.reconnect_socket();
                self.bus.publish(
                    Event::new(EventKind::ReconnectScheduled, now)
                        .with_attempt(attempt)
                        .with_delay_ms(delay_ms),
                );
            }
            RetryStep::Exhausted => {
                let attempts = round.attempts();
                self.socket_round = None;
                self.last_socket_check = Some(now);
                warn!(target: "switchcore::network", attempts, "socket reconnect round exhausted");
                self.bus
                    .publish(Event::new(EventKind::ReconnectExhausted, now).with_attempt(attempts));
                self.health.errors.bump(FaultKind::Socket);
                out.extend(self.raise(FaultKind::Socket, now));
            }
        }
    }

    fn keep_alive(&mut self, now: Millis) {
        let Some(sent) = self.last_ping else {
            self.last_ping = Some(now);
            return;
        };
        if self.health.waiting_for_pong {
            let waited = elapsed(now, sent);
            if waited > self.timings.pong_timeout_ms {
                warn!(target: "switchcore::network", waited_ms = waited, "pong missed, dropping socket");
                self.health.waiting_for_pong = false;
                self.last_socket_check = None;
                self.probe.disconnect_socket();
                self.bus
                    .publish(Event::new(EventKind::PongMissed, now).with_delay_ms(waited));
            }
        } else if elapsed(now, sent) >= self.timings.ping_interval_ms {
            self.probe.send_ping();
            self.last_ping = Some(now);
            self.health.waiting_for_pong = true;
            self.bus.publish(Event::new(EventKind::PingSent, now));
        }
    }

    async fn server_reachable(&self) -> bool {
        let host = &self.endpoints.server_host;
        if host.is_empty() {
            return true;
        }
        let timeout = Duration::from_millis(self.timings.server_probe_timeout_ms);
        let probe = self.probe.tcp_probe(host, self.endpoints.server_port, timeout);
        tokio::time::timeout(timeout, probe).await.unwrap_or(false)
    }

    fn raise(&mut self, kind: FaultKind, now: Millis) -> Option<HealthTransition> {
        if !self.health.mark_broken(kind) {
            return None;
        }
        let count = self.health.errors.get(kind);
        warn!(target: "switchcore::network", fault = kind.as_str(), count, "fault raised");
        self.bus.publish(
            Event::new(EventKind::FaultRaised, now)
                .with_fault(kind)
                .with_attempt(u32::from(count)),
        );
        Some(HealthTransition::Raised(kind))
    }

    fn clear(&mut self, kind: FaultKind, now: Millis) -> Option<HealthTransition> {
        if !self.health.mark_healthy(kind) {
            return None;
        }
        info!(target: "switchcore::network", fault = kind.as_str(), "fault cleared");
        self.bus
            .publish(Event::new(EventKind::FaultCleared, now).with_fault(kind));
        Some(HealthTransition::Cleared(kind))
    }
}
