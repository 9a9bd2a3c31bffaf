use crate::clock::Millis;

/// A fetched value, or the sentinel shown when the sub-fetch gave nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataValue<T> {
    Available(T),
    #[default]
    Unavailable,
}

impl<T: Copy> DataValue<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            DataValue::Available(v) => Some(*v),
            DataValue::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, DataValue::Available(_))
    }
}

/// Result of the last completed fetch cycle.
///
/// Replaced as a whole when a cycle completes; readers never see a mix of
/// two cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExternalDataSnapshot {
    /// Price in the display currency.
    pub price: DataValue<u64>,
    pub block_height: DataValue<u64>,
    /// The price sub-fetch answered within its budget (even with an error).
    pub price_ready: bool,
    pub height_ready: bool,
    /// Stamped after the later of the two sub-fetches resolved.
    pub last_update_ms: Option<Millis>,
    pub last_attempt_ms: Option<Millis>,
}

impl ExternalDataSnapshot {
    /// Whether either value is the sentinel.
    pub fn has_gaps(&self) -> bool {
        !self.price.is_available() || !self.block_height.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_all_sentinels() {
        let snap = ExternalDataSnapshot::default();
        assert_eq!(snap.price, DataValue::Unavailable);
        assert_eq!(snap.block_height.value(), None);
        assert!(snap.has_gaps());
        assert_eq!(snap.last_update_ms, None);
    }
}
