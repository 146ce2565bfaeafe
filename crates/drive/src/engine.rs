//! Warp engine parts and the driving-engine arbitration rule.

use std::fmt;

use blueshift_config::EngineConfig;
use blueshift_curve::Curve;
use blueshift_orbits::SpatialLocation;
use serde::{Deserialize, Serialize};

use crate::events::EngineEvent;
use crate::flameout::{FlameoutReason, FlameoutState};

/// User-facing engine status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EngineStatus {
    #[default]
    Idle,
    Nominal,
    FlamedOut(FlameoutReason),
    CollisionImminent,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::Idle => f.write_str("Idle"),
            EngineStatus::Nominal => f.write_str("Nominal"),
            EngineStatus::FlamedOut(reason) => f.write_str(reason.status()),
            EngineStatus::CollisionImminent => f.write_str("Collision Imminent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WarpEngine {
    pub id: String,
    /// Effective warp capacity to speed (fraction of c).
    pub warp_curve: Curve,
    /// Altitude / planet SOI radius to speed multiplier.
    pub planetary_soi_speed_curve: Curve,
    /// Throttle to effect intensity.
    pub effect_curve: Option<Curve>,
    /// Minimum altitude in multiples of the main body's radius.
    pub min_planetary_radius: f64,
    pub displacement_impulse: f64,
    pub warp_ignition_threshold: f64,
    pub warp_speed_skill: String,
    pub warp_speed_boost_rank: u32,
    pub warp_speed_skill_multiplier: f64,

    ignited: bool,
    flameout: FlameoutState,
    status: EngineStatus,
    spatial_location: SpatialLocation,
    warp_speed: f64,
    max_warp_speed: f64,
    apply_warp_translation: bool,
    locked_course_and_speed: bool,
}

impl WarpEngine {
    pub fn new(id: impl Into<String>, warp_curve: Curve) -> Self {
        Self {
            id: id.into(),
            warp_curve,
            planetary_soi_speed_curve: Curve::empty(),
            effect_curve: None,
            min_planetary_radius: 1.0,
            displacement_impulse: 0.0,
            warp_ignition_threshold: 0.9,
            warp_speed_skill: "ConverterSkill".to_string(),
            warp_speed_boost_rank: 5,
            warp_speed_skill_multiplier: 0.05,
            ignited: false,
            flameout: FlameoutState::Nominal,
            status: EngineStatus::Idle,
            spatial_location: SpatialLocation::Unknown,
            warp_speed: 0.0,
            max_warp_speed: 0.0,
            apply_warp_translation: false,
            locked_course_and_speed: false,
        }
    }

    /// Build from configuration. Malformed curves are treated as absent.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut engine = Self::new(
            config.id.clone(),
            config
                .warp_curve
                .to_curve_lenient(&format!("{}.warp_curve", config.id)),
        );
        engine.planetary_soi_speed_curve = config
            .planetary_soi_speed_curve
            .to_curve_lenient(&format!("{}.planetary_soi_speed_curve", config.id));
        engine.effect_curve = config
            .effect_curve
            .as_ref()
            .map(|spec| spec.to_curve_lenient(&format!("{}.effect_curve", config.id)));
        engine.min_planetary_radius = config.min_planetary_radius;
        engine.displacement_impulse = config.displacement_impulse;
        engine.warp_ignition_threshold = config.warp_ignition_threshold;
        engine.warp_speed_skill = config.warp_speed_skill.clone();
        engine.warp_speed_boost_rank = config.warp_speed_boost_rank;
        engine.warp_speed_skill_multiplier = config.warp_speed_skill_multiplier;
        engine
    }

    /// Ignite the engine. Returns the start event unless it was already running.
    pub fn activate(&mut self) -> Option<EngineEvent> {
        if self.ignited {
            return None;
        }
        self.ignited = true;
        self.flameout = FlameoutState::Nominal;
        self.status = EngineStatus::Nominal;
        Some(EngineEvent::Started {
            engine: self.id.clone(),
        })
    }

    /// Stop the engine and clear its transient state.
    pub fn shutdown(&mut self) -> Option<EngineEvent> {
        if !self.ignited {
            return None;
        }
        self.ignited = false;
        self.flameout = FlameoutState::Nominal;
        self.status = EngineStatus::Idle;
        self.warp_speed = 0.0;
        self.max_warp_speed = 0.0;
        self.apply_warp_translation = false;
        self.locked_course_and_speed = false;
        Some(EngineEvent::Shutdown {
            engine: self.id.clone(),
        })
    }

    pub fn is_ignited(&self) -> bool {
        self.ignited
    }

    /// Ignited and not flamed out.
    pub fn is_operational(&self) -> bool {
        self.ignited && !self.flameout.is_flamed_out()
    }

    pub fn flameout(&self) -> FlameoutState {
        self.flameout
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn spatial_location(&self) -> SpatialLocation {
        self.spatial_location
    }

    pub fn warp_speed(&self) -> f64 {
        self.warp_speed
    }

    pub fn max_warp_speed(&self) -> f64 {
        self.max_warp_speed
    }

    /// Whether this engine won arbitration and may move the vessel this tick.
    pub fn apply_warp_translation(&self) -> bool {
        self.apply_warp_translation
    }

    pub fn locked_course_and_speed(&self) -> bool {
        self.locked_course_and_speed
    }

    /// Speed multiplier earned by crew of at least `warp_speed_boost_rank`.
    pub fn skill_bonus(&self, highest_rank: Option<u32>) -> f64 {
        match highest_rank {
            Some(rank) if rank >= self.warp_speed_boost_rank => {
                1.0 + rank as f64 * self.warp_speed_skill_multiplier
            }
            _ => 1.0,
        }
    }

    /// Lowest altitude at which the engine may run around a body of `body_radius_m`.
    pub fn min_altitude_m(&self, body_radius_m: f64) -> f64 {
        body_radius_m * self.min_planetary_radius
    }

    /// Effect intensity for a throttle setting; follows throttle when no curve is configured.
    pub fn effect_intensity(&self, throttle: f64) -> f64 {
        let throttle = throttle.clamp(0.0, 1.0);
        match &self.effect_curve {
            Some(curve) => curve.evaluate(throttle),
            None => throttle,
        }
    }

    pub(crate) fn set_flameout(&mut self, state: FlameoutState) {
        self.flameout = state;
        if self.ignited {
            self.status = match state {
                FlameoutState::Nominal => EngineStatus::Nominal,
                FlameoutState::FlamedOut(reason) => EngineStatus::FlamedOut(reason),
            };
        }
    }

    pub(crate) fn set_status(&mut self, status: EngineStatus) {
        self.status = status;
    }

    pub(crate) fn set_speeds(&mut self, location: SpatialLocation, warp_speed: f64, max: f64) {
        self.spatial_location = location;
        if self.ignited {
            self.warp_speed = warp_speed;
            self.max_warp_speed = max;
        } else {
            self.warp_speed = 0.0;
            self.max_warp_speed = 0.0;
        }
    }

    pub(crate) fn set_translation(&mut self, apply: bool, locked: bool) {
        self.apply_warp_translation = apply;
        self.locked_course_and_speed = apply && locked;
    }

    /// Reset transient state and restore the saved activation without emitting events.
    pub(crate) fn restore_ignition(&mut self, ignited: bool) {
        self.shutdown();
        self.spatial_location = SpatialLocation::Unknown;
        if ignited {
            self.activate();
        }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            id: self.id.clone(),
            ignited: self.ignited,
            warp_speed: self.warp_speed,
            max_warp_speed: self.max_warp_speed,
            spatial_location: self.spatial_location,
            apply_warp_translation: self.apply_warp_translation,
            locked_course_and_speed: self.locked_course_and_speed,
            flameout: self.flameout.reason(),
            status: self.status,
        }
    }
}

/// Read-only per-tick view published to collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub id: String,
    pub ignited: bool,
    pub warp_speed: f64,
    pub max_warp_speed: f64,
    pub spatial_location: SpatialLocation,
    pub apply_warp_translation: bool,
    pub locked_course_and_speed: bool,
    pub flameout: Option<FlameoutReason>,
    pub status: EngineStatus,
}

/// Whether an operational engine sits ahead of `index` in attachment order.
pub fn has_driving_peer_ahead(engines: &[WarpEngine], index: usize) -> bool {
    engines[..index.min(engines.len())]
        .iter()
        .any(WarpEngine::is_operational)
}

/// Index of the engine allowed to move the vessel: the first operational engine
/// in attachment order.
pub fn arbitrate(engines: &[WarpEngine]) -> Option<usize> {
    engines.iter().position(WarpEngine::is_operational)
}
