//! Static mapping from click sequences to actions.

use crate::config::InputTimings;
use crate::clock::Millis;

/// Physical input a recognizer is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputSource {
    /// The external push button.
    Button,
    /// The touch surface's button area.
    Touch,
}

impl InputSource {
    pub fn as_str(self) -> &'static str {
        match self {
            InputSource::Button => "button",
            InputSource::Touch => "touch",
        }
    }
}

/// Operator action recognized from a click sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Help,
    Report,
    Config,
    /// Three clicks; recognized so the sequence is consumed, otherwise no effect.
    Reset,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Help => "help",
            Action::Report => "report",
            Action::Config => "config",
            Action::Reset => "reset",
        }
    }
}

/// When a rule is looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// The sequence went quiet for longer than the sequence window.
    Timeout,
    /// The click was just counted.
    Click,
    /// The press has been held past the rule's threshold.
    Hold(HoldTier),
}

/// Which hold threshold a rule uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldTier {
    Help,
    Config,
}

impl HoldTier {
    pub fn threshold_ms(self, timings: &InputTimings) -> Millis {
        match self {
            HoldTier::Help => timings.help_hold_ms,
            HoldTier::Config => timings.config_hold_ms,
        }
    }
}

/// One entry of the table.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    /// `None` matches both inputs.
    pub source: Option<InputSource>,
    /// Click count at lookup (for holds: the number of the held press).
    pub clicks: u8,
    pub trigger: Trigger,
    pub action: Action,
}

const fn any(clicks: u8, trigger: Trigger, action: Action) -> Rule {
    Rule {
        source: None,
        clicks,
        trigger,
        action,
    }
}

/// Both inputs share one table.
pub static DEFAULT_RULES: &[Rule] = &[
    any(1, Trigger::Timeout, Action::Help),
    any(2, Trigger::Timeout, Action::Report),
    any(3, Trigger::Timeout, Action::Reset),
    any(4, Trigger::Click, Action::Config),
    any(1, Trigger::Hold(HoldTier::Help), Action::Help),
    any(2, Trigger::Hold(HoldTier::Config), Action::Config),
];

/// Lookup over a static rule slice.
#[derive(Clone, Copy, Debug)]
pub struct ActionTable {
    rules: &'static [Rule],
}

impl Default for ActionTable {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES,
        }
    }
}

impl ActionTable {
    pub fn new(rules: &'static [Rule]) -> Self {
        Self { rules }
    }

    fn matching(&self, source: InputSource, clicks: u8) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |r| r.clicks == clicks && r.source.is_none_or(|s| s == source))
    }

    /// Action fired when a sequence of `clicks` times out.
    pub fn on_timeout(&self, source: InputSource, clicks: u8) -> Option<Action> {
        self.matching(source, clicks)
            .find(|r| r.trigger == Trigger::Timeout)
            .map(|r| r.action)
    }

    /// Action fired as soon as click number `clicks` lands.
    pub fn on_click(&self, source: InputSource, clicks: u8) -> Option<Action> {
        self.matching(source, clicks)
            .find(|r| r.trigger == Trigger::Click)
            .map(|r| r.action)
    }

    /// Action fired when press number `clicks` has been held `held_ms`.
    pub fn on_hold(
        &self,
        source: InputSource,
        clicks: u8,
        held_ms: Millis,
        timings: &InputTimings,
    ) -> Option<Action> {
        self.matching(source, clicks)
            .find(|r| match r.trigger {
                Trigger::Hold(tier) => held_ms >= tier.threshold_ms(timings),
                _ => false,
            })
            .map(|r| r.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_matches_both_sources() {
        let table = ActionTable::default();
        for source in [InputSource::Button, InputSource::Touch] {
            assert_eq!(table.on_timeout(source, 1), Some(Action::Help));
            assert_eq!(table.on_timeout(source, 2), Some(Action::Report));
            assert_eq!(table.on_timeout(source, 3), Some(Action::Reset));
            assert_eq!(table.on_timeout(source, 4), None);
            assert_eq!(table.on_click(source, 4), Some(Action::Config));
            assert_eq!(table.on_click(source, 2), None);
        }
    }

    #[test]
    fn hold_thresholds_depend_on_press_number() {
        let table = ActionTable::default();
        let t = InputTimings::default();
        assert_eq!(table.on_hold(InputSource::Button, 1, 1_999, &t), None);
        assert_eq!(table.on_hold(InputSource::Button, 1, 2_000, &t), Some(Action::Help));
        assert_eq!(table.on_hold(InputSource::Touch, 2, 2_500, &t), None);
        assert_eq!(table.on_hold(InputSource::Touch, 2, 3_000, &t), Some(Action::Config));
        assert_eq!(table.on_hold(InputSource::Touch, 3, 9_000, &t), None);
    }

    static BUTTON_ONLY: &[Rule] = &[Rule {
        source: Some(InputSource::Button),
        clicks: 1,
        trigger: Trigger::Timeout,
        action: Action::Report,
    }];

    #[test]
    fn source_specific_rules_do_not_leak() {
        let table = ActionTable::new(BUTTON_ONLY);
        assert_eq!(table.on_timeout(InputSource::Button, 1), Some(Action::Report));
        assert_eq!(table.on_timeout(InputSource::Touch, 1), None);
    }
}
