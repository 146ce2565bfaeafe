//! Ignition gating for warp engines.
//!
//! An engine flames out as soon as any gate fails and re-ignites only once every
//! gate clears in the same tick.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an engine flamed out, ordered by reporting priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlameoutReason {
    NeedsPower,
    NeedsSpaceflight,
    NeedsAltitude,
    NeedsCapacity,
    Generic,
}

impl FlameoutReason {
    /// Stable machine-readable tag.
    pub fn tag(self) -> &'static str {
        match self {
            FlameoutReason::NeedsPower => "needs-power",
            FlameoutReason::NeedsSpaceflight => "needs-spaceflight",
            FlameoutReason::NeedsAltitude => "needs-altitude",
            FlameoutReason::NeedsCapacity => "needs-capacity",
            FlameoutReason::Generic => "generic",
        }
    }

    /// Short user-facing status line.
    pub fn status(self) -> &'static str {
        match self {
            FlameoutReason::NeedsPower => "Needs Power",
            FlameoutReason::NeedsSpaceflight => "Needs Spaceflight",
            FlameoutReason::NeedsAltitude => "Needs Altitude",
            FlameoutReason::NeedsCapacity => "Needs Capacity",
            FlameoutReason::Generic => "Flameout",
        }
    }
}

impl fmt::Display for FlameoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlameoutState {
    #[default]
    Nominal,
    FlamedOut(FlameoutReason),
}

impl FlameoutState {
    pub fn is_flamed_out(self) -> bool {
        matches!(self, FlameoutState::FlamedOut(_))
    }

    pub fn reason(self) -> Option<FlameoutReason> {
        match self {
            FlameoutState::Nominal => None,
            FlameoutState::FlamedOut(reason) => Some(reason),
        }
    }
}

/// Gate values for one engine in one tick. `true` means the gate is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnitionGates {
    /// Power multiplier at or above the engine's ignition threshold.
    pub has_power: bool,
    pub in_space: bool,
    /// Altitude at or above `body radius × min planetary radius`.
    pub above_min_altitude: bool,
    /// Nonzero effective capacity, or the engine is idling at zero throttle.
    pub has_capacity: bool,
    /// No flameout reported by the host.
    pub host_nominal: bool,
}

impl IgnitionGates {
    pub fn all_clear() -> Self {
        Self {
            has_power: true,
            in_space: true,
            above_min_altitude: true,
            has_capacity: true,
            host_nominal: true,
        }
    }

    /// Highest-priority failing gate.
    pub fn first_failure(&self) -> Option<FlameoutReason> {
        if !self.has_power {
            Some(FlameoutReason::NeedsPower)
        } else if !self.in_space {
            Some(FlameoutReason::NeedsSpaceflight)
        } else if !self.above_min_altitude {
            Some(FlameoutReason::NeedsAltitude)
        } else if !self.has_capacity {
            Some(FlameoutReason::NeedsCapacity)
        } else if !self.host_nominal {
            Some(FlameoutReason::Generic)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlameoutTransition {
    Unchanged,
    FlamedOut(FlameoutReason),
    Reignited,
}

/// Advance the flameout state by one tick.
///
/// While flamed out, the reported reason tracks the current highest-priority
/// failure without emitting a new transition.
pub fn step(
    previous: FlameoutState,
    gates: &IgnitionGates,
) -> (FlameoutState, FlameoutTransition) {
    match (previous, gates.first_failure()) {
        (FlameoutState::Nominal, None) => {
            (FlameoutState::Nominal, FlameoutTransition::Unchanged)
        }
        (FlameoutState::Nominal, Some(reason)) => (
            FlameoutState::FlamedOut(reason),
            FlameoutTransition::FlamedOut(reason),
        ),
        (FlameoutState::FlamedOut(_), None) => {
            (FlameoutState::Nominal, FlameoutTransition::Reignited)
        }
        (FlameoutState::FlamedOut(_), Some(reason)) => (
            FlameoutState::FlamedOut(reason),
            FlameoutTransition::Unchanged,
        ),
    }
}
