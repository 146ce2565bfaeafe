//! Warp generators: converters that feed the simulation resource consumed by coils.

use blueshift_config::GeneratorConfig;
use blueshift_core::constants::RESOURCE_GRANT_TOLERANCE;

use crate::coil::ResourceRate;
use crate::ledger::ResourceLedger;

#[derive(Debug, Clone, PartialEq)]
pub struct WarpGenerator {
    pub id: String,
    pub produced_resource: String,
    pub produced_rate_per_second: f64,
    pub inputs: Vec<ResourceRate>,
    pub is_active: bool,
    /// Set by [`WarpGenerator::run`] when an input could not be drawn in full.
    pub is_missing_resources: bool,
}

impl WarpGenerator {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            id: config.id.clone(),
            produced_resource: config.produced_resource.clone(),
            produced_rate_per_second: config.produced_rate_per_second,
            inputs: config.inputs.iter().map(ResourceRate::from).collect(),
            is_active: config.is_active,
            is_missing_resources: false,
        }
    }

    /// Active and not starved of inputs.
    pub fn is_producing(&self) -> bool {
        self.is_active && !self.is_missing_resources
    }

    /// Ideal per-second production of `resource`.
    pub fn ideal_rate(&self, resource: &str) -> f64 {
        if self.produced_resource == resource {
            self.produced_rate_per_second.max(0.0)
        } else {
            0.0
        }
    }

    /// Run the converter for one tick and return the amount stored in the ledger.
    pub fn run<L: ResourceLedger + ?Sized>(&mut self, ledger: &mut L, delta_time: f64) -> f64 {
        if !self.is_active {
            self.is_missing_resources = false;
            return 0.0;
        }

        for input in &self.inputs {
            let requested = input.rate_per_second.max(0.0) * delta_time;
            if requested <= 0.0 {
                continue;
            }
            let granted = ledger.request(&input.resource, requested);
            if granted < requested * RESOURCE_GRANT_TOLERANCE {
                if !self.is_missing_resources {
                    tracing::debug!(
                        generator = %self.id,
                        resource = %input.resource,
                        requested,
                        granted,
                        "generator starved of input"
                    );
                }
                self.is_missing_resources = true;
                return 0.0;
            }
        }

        self.is_missing_resources = false;
        let produced = self.produced_rate_per_second.max(0.0) * delta_time;
        ledger.deposit(&self.produced_resource, produced)
    }
}
