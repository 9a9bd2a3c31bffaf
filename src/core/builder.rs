use std::sync::Arc;

use crate::{
    clock::{Clock, MonotonicClock},
    config::{DeviceConfig, RuntimeConfig},
    device::{AddressEncoder, Presentation, Switch},
    error::ConfigError,
    events::Bus,
    fetch::{DataSource, FetchCoordinator},
    input::{ActionTable, ClickRecognizer, InputPins, InputSource},
    network::{ConnectivityProbe, NetworkSupervisor},
    policies::{BackoffPolicy, RetryPolicy},
    power::Platform,
    subscribers::Subscribe,
};

use super::device::{Device, Parts};

/// The hardware and services a [`Device`] drives.
pub struct Collaborators {
    pub pins: Box<dyn InputPins>,
    pub presentation: Box<dyn Presentation>,
    pub encoder: Box<dyn AddressEncoder>,
    pub switch: Box<dyn Switch>,
    pub platform: Box<dyn Platform>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub source: Arc<dyn DataSource>,
}

/// Builder for a [`Device`] with optional overrides.
pub struct DeviceBuilder {
    cfg: DeviceConfig,
    collaborators: Collaborators,
    runtime: RuntimeConfig,
    clock: Option<Arc<dyn Clock>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    actions: ActionTable,
    reconnect: Option<RetryPolicy>,
    fetch_backoff: Option<BackoffPolicy>,
}

impl DeviceBuilder {
    pub fn new(cfg: DeviceConfig, collaborators: Collaborators) -> Self {
        Self {
            cfg,
            collaborators,
            runtime: RuntimeConfig::default(),
            clock: None,
            subscribers: Vec::new(),
            actions: ActionTable::default(),
            reconnect: None,
            fetch_backoff: None,
        }
    }

    /// Tick period and bus capacity.
    pub fn with_runtime(mut self, runtime: RuntimeConfig) -> Self {
        self.runtime = runtime;
        self
    }

    /// Time source (default: [`MonotonicClock`]).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with
    /// bounded queues, once [`Device::run`] is called.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Gesture table shared by the button and touch recognizers.
    pub fn with_actions(mut self, actions: ActionTable) -> Self {
        self.actions = actions;
        self
    }

    /// Socket reconnect rounds (default: attempts and delay from the network timings).
    pub fn with_reconnect_policy(mut self, policy: RetryPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Minimum spacing between fetch attempts (default: fixed `backoff_ms`).
    pub fn with_fetch_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.fetch_backoff = Some(backoff);
        self
    }

    /// Validates the configuration and wires every component.
    pub fn build(self) -> Result<Device, ConfigError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.runtime.bus_capacity_clamped());
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let c = self.collaborators;

        let mut network = NetworkSupervisor::new(
            c.probe,
            self.cfg.endpoints.clone(),
            self.cfg.timings.network,
            bus.clone(),
        );
        if let Some(policy) = self.reconnect {
            network = network.with_reconnect_policy(policy);
        }

        let mut fetch = FetchCoordinator::new(
            c.source,
            Arc::clone(&clock),
            self.cfg.timings.fetch,
            bus.clone(),
        );
        if let Some(backoff) = self.fetch_backoff {
            fetch = fetch.with_backoff(backoff);
        }

        let input = self.cfg.timings.input;
        Ok(Device::new(Parts {
            button: ClickRecognizer::new(InputSource::Button, input, self.actions.clone()),
            touch: ClickRecognizer::new(InputSource::Touch, input, self.actions),
            cfg: self.cfg,
            runtime: self.runtime,
            clock,
            bus,
            subscribers: self.subscribers,
            network,
            fetch,
            pins: c.pins,
            presentation: c.presentation,
            encoder: c.encoder,
            switch: c.switch,
            platform: c.platform,
        }))
    }
}
