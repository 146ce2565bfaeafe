//! Warp coils: capacity and displacement contributors that consume resources while powered.

use blueshift_config::{CoilConfig, ResourceRateConfig};
use blueshift_core::constants::RESOURCE_GRANT_TOLERANCE;

use crate::ledger::ResourceLedger;

/// A resource flow in units per second.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRate {
    pub resource: String,
    pub rate_per_second: f64,
}

impl From<&ResourceRateConfig> for ResourceRate {
    fn from(config: &ResourceRateConfig) -> Self {
        Self {
            resource: config.resource.clone(),
            rate_per_second: config.rate_per_second,
        }
    }
}

/// Outcome of a coil's per-tick resource draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsumptionResult {
    Satisfied,
    Shortfall {
        resource: String,
        requested: f64,
        granted: f64,
    },
}

impl ConsumptionResult {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, ConsumptionResult::Satisfied)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarpCoil {
    pub id: String,
    /// Capacity contributed when fully powered.
    pub warp_capacity: f64,
    /// Tons the coil can move without penalty.
    pub displacement_impulse: f64,
    pub is_active: bool,
    pub needs_maintenance: bool,
    pub inputs: Vec<ResourceRate>,
}

impl WarpCoil {
    pub fn from_config(config: &CoilConfig) -> Self {
        Self {
            id: config.id.clone(),
            warp_capacity: config.warp_capacity,
            displacement_impulse: config.displacement_impulse,
            is_active: config.is_active,
            needs_maintenance: config.needs_maintenance,
            inputs: config.inputs.iter().map(ResourceRate::from).collect(),
        }
    }

    /// Active and not waiting on maintenance.
    pub fn is_operational(&self) -> bool {
        self.is_active && !self.needs_maintenance
    }

    /// Ideal per-second demand for `resource`.
    pub fn required_rate(&self, resource: &str) -> f64 {
        self.inputs
            .iter()
            .filter(|input| input.resource == resource)
            .map(|input| input.rate_per_second.max(0.0))
            .sum()
    }

    /// Draw every input for one tick, scaled by the power multiplier.
    ///
    /// Stops at the first input that is not granted in full; amounts already drawn are kept.
    pub fn consume<L: ResourceLedger + ?Sized>(
        &self,
        ledger: &mut L,
        power_multiplier: f64,
        delta_time: f64,
    ) -> ConsumptionResult {
        for input in &self.inputs {
            let requested = input.rate_per_second.max(0.0) * power_multiplier * delta_time;
            if requested <= 0.0 {
                continue;
            }
            let granted = ledger.request(&input.resource, requested);
            if granted < requested * RESOURCE_GRANT_TOLERANCE {
                return ConsumptionResult::Shortfall {
                    resource: input.resource.clone(),
                    requested,
                    granted,
                };
            }
        }
        ConsumptionResult::Satisfied
    }
}
