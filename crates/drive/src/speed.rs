//! Warp speed resolution from effective capacity, location, crew skill, and throttle.

use blueshift_config::WarpSettings;
use blueshift_orbits::SpatialLocation;

use crate::engine::WarpEngine;

/// Location and crew inputs for one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedContext {
    pub location: SpatialLocation,
    pub throttle: f64,
    /// Multiplier from crew skill; 1.0 when no bonus applies.
    pub skill_bonus: f64,
    /// Altitude over the main body's own SOI radius; used in planetary space.
    pub planetary_altitude_ratio: f64,
    pub interstellar_speed_multiplier: f64,
    /// Floor (fraction of c) for positive planetary speeds.
    pub min_planetary_speed: f64,
}

impl SpeedContext {
    pub fn new(settings: &WarpSettings, location: SpatialLocation, throttle: f64) -> Self {
        Self {
            location,
            throttle,
            skill_bonus: 1.0,
            planetary_altitude_ratio: 0.0,
            interstellar_speed_multiplier: settings.interstellar_speed_multiplier,
            min_planetary_speed: settings.min_planetary_speed,
        }
    }
}

/// Resolved speeds, as fractions of c.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WarpSpeeds {
    pub warp_speed: f64,
    pub max_warp_speed: f64,
    /// Engine whose curve produced the maximum.
    pub engine_index: Option<usize>,
}

/// Resolve the vessel's maximum and current warp speed.
///
/// Every operational engine evaluates its own warp curve at `effective_capacity`;
/// the fastest wins, ties going to the first. Location modifiers are applied to
/// the winner, then the skill bonus, then throttle.
pub fn resolve(effective_capacity: f64, engines: &[WarpEngine], ctx: &SpeedContext) -> WarpSpeeds {
    let mut best: Option<(usize, f64)> = None;
    for (index, engine) in engines.iter().enumerate() {
        if !engine.is_operational() {
            continue;
        }
        let speed = engine.warp_curve.evaluate(effective_capacity).max(0.0);
        if best.is_none_or(|(_, current)| speed > current) {
            best = Some((index, speed));
        }
    }

    let Some((index, base_speed)) = best else {
        return WarpSpeeds::default();
    };

    let mut max_warp_speed = match ctx.location {
        SpatialLocation::Interstellar => base_speed * ctx.interstellar_speed_multiplier,
        SpatialLocation::Planetary => {
            let damping = engines[index]
                .planetary_soi_speed_curve
                .evaluate(ctx.planetary_altitude_ratio)
                .max(0.0);
            let damped = base_speed * damping;
            if base_speed > 0.0 && damped < ctx.min_planetary_speed {
                ctx.min_planetary_speed
            } else {
                damped
            }
        }
        SpatialLocation::Interplanetary | SpatialLocation::Unknown => base_speed,
    };
    max_warp_speed *= ctx.skill_bonus.max(0.0);

    let throttle = ctx.throttle.clamp(0.0, 1.0);
    let warp_speed = if throttle > 0.0 {
        max_warp_speed * throttle
    } else {
        0.0
    };

    WarpSpeeds {
        warp_speed,
        max_warp_speed,
        engine_index: Some(index),
    }
}
