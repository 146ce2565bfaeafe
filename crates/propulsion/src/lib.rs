//! Warp field producers and consumers.
//!
//! - [`ledger`] - resource inventory abstraction and an in-memory pool
//! - [`coil`] - warp coils and their per-tick resource draw
//! - [`generator`] - converters that produce the simulation resource
//! - [`capacity`] - power balance and capacity aggregation

pub mod capacity;
pub mod coil;
pub mod generator;
pub mod ledger;

pub use capacity::{
    AggregationRequest, CapacityTotals, PowerBalance, aggregate, effective_capacity,
    power_balance, power_ceiling,
};
pub use coil::{ConsumptionResult, ResourceRate, WarpCoil};
pub use generator::WarpGenerator;
pub use ledger::{ResourceLedger, ResourcePool, Stock};
