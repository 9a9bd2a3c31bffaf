use crate::clock::Millis;

/// Display name the backend assigns to one switch output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchLabel {
    pub pin: u8,
    pub label: String,
}

impl SwitchLabel {
    pub fn new(pin: u8, label: impl Into<String>) -> Self {
        Self {
            pin,
            label: label.into(),
        }
    }
}

/// Last label list fetched from the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSet {
    labels: Vec<SwitchLabel>,
    /// `None` until a fetch succeeded.
    pub last_update_ms: Option<Millis>,
}

impl LabelSet {
    pub fn is_loaded(&self) -> bool {
        self.last_update_ms.is_some()
    }

    /// Fetched name of `pin`; blank names count as missing.
    pub fn label_for(&self, pin: u8) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.pin == pin)
            .map(|l| l.label.trim())
            .filter(|l| !l.is_empty())
    }

    pub(crate) fn replace(&mut self, labels: Vec<SwitchLabel>, now: Millis) {
        self.labels = labels;
        self.last_update_ms = Some(now);
    }
}
