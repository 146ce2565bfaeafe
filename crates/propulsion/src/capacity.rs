//! Warp capacity aggregation across a vessel's coils and generators.
//!
//! Generators and coils negotiate through a single scalar, the power multiplier:
//! the ratio of ideal simulation-resource production to ideal coil demand. Coils
//! then draw their inputs scaled by that multiplier, and only coils that are fed
//! in full count toward the vessel's capacity and displacement for the tick.

use blueshift_config::WarpSettings;
use blueshift_core::constants::POWER_MULTIPLIER_EPSILON;

use crate::coil::{ConsumptionResult, WarpCoil};
use crate::generator::WarpGenerator;
use crate::ledger::ResourceLedger;

/// Ideal production versus demand, before anything is consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerBalance {
    pub produced: f64,
    pub required: f64,
    pub multiplier: f64,
}

/// Knobs for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRequest<'a> {
    pub simulation_resource: &'a str,
    /// Multipliers below this short-circuit the pass with zeroed totals.
    pub ignition_threshold: f64,
    /// Upper bound for the power multiplier (1.0 unless supercharging).
    pub power_ceiling: f64,
    /// Scales every coil draw; the tick's delta time.
    pub resource_modifier: f64,
}

impl<'a> AggregationRequest<'a> {
    pub fn from_settings(
        settings: &'a WarpSettings,
        ignition_threshold: f64,
        delta_time: f64,
    ) -> Self {
        Self {
            simulation_resource: &settings.warp_simulation_resource,
            ignition_threshold,
            power_ceiling: power_ceiling(settings),
            resource_modifier: delta_time,
        }
    }
}

/// Vessel-wide totals produced by an aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityTotals {
    pub total_capacity: f64,
    pub total_displacement: f64,
    pub power_multiplier: f64,
    /// Coils that were powered but could not draw their inputs this tick.
    pub starved_coils: Vec<String>,
    /// True when the multiplier fell below the ignition threshold and nothing was consumed.
    pub short_circuited: bool,
}

/// Ceiling applied to the power multiplier under the given settings.
pub fn power_ceiling(settings: &WarpSettings) -> f64 {
    if settings.supercharge_enabled {
        settings.supercharge_ceiling.max(1.0)
    } else {
        1.0
    }
}

/// Compare ideal generator output against ideal coil demand.
///
/// A zero ratio (no production, or nothing required) reports
/// [`POWER_MULTIPLIER_EPSILON`] instead of zero so the multiplier is never zero or NaN.
pub fn power_balance(
    coils: &[WarpCoil],
    generators: &[WarpGenerator],
    simulation_resource: &str,
    power_ceiling: f64,
) -> PowerBalance {
    let produced: f64 = generators
        .iter()
        .filter(|generator| generator.is_producing())
        .map(|generator| generator.ideal_rate(simulation_resource))
        .sum();
    let required: f64 = coils
        .iter()
        .filter(|coil| coil.is_operational())
        .map(|coil| coil.required_rate(simulation_resource))
        .sum();

    let ratio = if required > 0.0 { produced / required } else { 0.0 };
    let multiplier = if ratio.is_finite() && ratio > 0.0 {
        ratio.min(power_ceiling.max(1.0))
    } else {
        POWER_MULTIPLIER_EPSILON
    };

    PowerBalance {
        produced,
        required,
        multiplier,
    }
}

/// Compute the vessel's warp capacity, drawing coil inputs from the ledger.
pub fn aggregate<L: ResourceLedger + ?Sized>(
    coils: &[WarpCoil],
    generators: &[WarpGenerator],
    ledger: &mut L,
    request: &AggregationRequest<'_>,
) -> CapacityTotals {
    let balance = power_balance(
        coils,
        generators,
        request.simulation_resource,
        request.power_ceiling,
    );

    if balance.multiplier < request.ignition_threshold {
        return CapacityTotals {
            power_multiplier: balance.multiplier,
            short_circuited: true,
            ..CapacityTotals::default()
        };
    }

    let mut totals = CapacityTotals {
        power_multiplier: balance.multiplier,
        ..CapacityTotals::default()
    };

    for coil in coils.iter().filter(|coil| coil.is_operational()) {
        match coil.consume(ledger, balance.multiplier, request.resource_modifier) {
            ConsumptionResult::Satisfied => {
                totals.total_capacity += coil.warp_capacity;
                totals.total_displacement += coil.displacement_impulse;
            }
            ConsumptionResult::Shortfall {
                resource,
                requested,
                granted,
            } => {
                tracing::debug!(
                    coil = %coil.id,
                    resource = %resource,
                    requested,
                    granted,
                    "coil excluded from capacity for this tick"
                );
                totals.starved_coils.push(coil.id.clone());
            }
        }
    }

    totals
}

/// `total_capacity × (total_displacement / vessel_mass) × power_multiplier`.
///
/// A non-positive vessel mass yields zero.
pub fn effective_capacity(
    total_capacity: f64,
    total_displacement: f64,
    vessel_mass_tons: f64,
    power_multiplier: f64,
) -> f64 {
    if vessel_mass_tons.is_nan() || vessel_mass_tons <= 0.0 {
        return 0.0;
    }
    let displacement_multiplier = total_displacement / vessel_mass_tons;
    (total_capacity * displacement_multiplier * power_multiplier).max(0.0)
}
