use std::fmt;

use crate::clock::Millis;

/// Link-layer (WiFi) status reported by the probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// Connectivity fault domain.
///
/// Declaration order is display priority: a broken link hides an internet
/// fault, which hides a socket fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaultKind {
    Link,
    Internet,
    Socket,
}

impl FaultKind {
    pub const ALL: [FaultKind; 3] = [FaultKind::Link, FaultKind::Internet, FaultKind::Socket];

    /// Whether `self` is shown in preference to `other`.
    pub fn outranks(self, other: FaultKind) -> bool {
        self < other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FaultKind::Link => "link",
            FaultKind::Internet => "internet",
            FaultKind::Socket => "socket",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error counter that stops at [`ErrorCounter::CAP`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorCounter(u8);

impl ErrorCounter {
    /// Two digits on the report screen.
    pub const CAP: u8 = 99;

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn bump(&mut self) {
        self.0 = self.0.saturating_add(1).min(Self::CAP);
    }
}

/// Per-domain error counters, shown on the report screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorCounters {
    counters: [ErrorCounter; 3],
}

impl ErrorCounters {
    pub fn get(&self, kind: FaultKind) -> u8 {
        self.counters[kind.index()].get()
    }

    pub fn bump(&mut self, kind: FaultKind) -> u8 {
        let counter = &mut self.counters[kind.index()];
        counter.bump();
        counter.get()
    }
}

/// Connectivity health, written only by the network supervisor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkHealth {
    pub wifi: LinkState,
    pub internet_confirmed_once: bool,
    pub socket_confirmed_once: bool,
    pub errors: ErrorCounters,
    pub last_pong_ms: Option<Millis>,
    pub waiting_for_pong: bool,
    broken: [bool; 3],
}

impl Default for LinkHealth {
    fn default() -> Self {
        Self {
            wifi: LinkState::Disconnected,
            internet_confirmed_once: false,
            socket_confirmed_once: false,
            errors: ErrorCounters::default(),
            last_pong_ms: None,
            waiting_for_pong: false,
            broken: [false; 3],
        }
    }
}

impl LinkHealth {
    pub fn is_broken(&self, kind: FaultKind) -> bool {
        self.broken[kind.index()]
    }

    /// The fault that should be on screen, if any.
    pub fn highest_fault(&self) -> Option<FaultKind> {
        FaultKind::ALL.into_iter().find(|k| self.is_broken(*k))
    }

    pub fn link_up(&self) -> bool {
        self.wifi == LinkState::Connected && !self.is_broken(FaultKind::Link)
    }

    /// Marks `kind` broken; returns `true` if it was healthy before.
    pub(crate) fn mark_broken(&mut self, kind: FaultKind) -> bool {
        !std::mem::replace(&mut self.broken[kind.index()], true)
    }

    /// Marks `kind` healthy; returns `true` if it was broken before.
    pub(crate) fn mark_healthy(&mut self, kind: FaultKind) -> bool {
        std::mem::replace(&mut self.broken[kind.index()], false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_saturates_at_99() {
        let mut counters = ErrorCounters::default();
        for _ in 0..10_000 {
            counters.bump(FaultKind::Socket);
        }
        assert_eq!(counters.get(FaultKind::Socket), 99);
        assert_eq!(counters.get(FaultKind::Link), 0);
    }

    #[test]
    fn priority_is_link_internet_socket() {
        assert!(FaultKind::Link.outranks(FaultKind::Internet));
        assert!(FaultKind::Internet.outranks(FaultKind::Socket));
        assert!(!FaultKind::Socket.outranks(FaultKind::Link));
    }

    #[test]
    fn highest_fault_picks_priority() {
        let mut health = LinkHealth::default();
        assert_eq!(health.highest_fault(), None);
        assert!(health.mark_broken(FaultKind::Socket));
        assert!(health.mark_broken(FaultKind::Internet));
        assert!(!health.mark_broken(FaultKind::Internet));
        assert_eq!(health.highest_fault(), Some(FaultKind::Internet));
        assert!(health.mark_healthy(FaultKind::Internet));
        assert_eq!(health.highest_fault(), Some(FaultKind::Socket));
        assert!(!health.mark_healthy(FaultKind::Link));
    }
}
