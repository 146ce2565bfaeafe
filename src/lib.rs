//! Faster-than-light warp travel for a host space simulation.
//!
//! The control loop lives in small crates re-exported here. Hosts implement the
//! adapter traits in [`drive::host`]; [`sandbox`] provides an in-memory host for
//! tests and the command-line simulator.

pub use blueshift_config as config;
pub use blueshift_core as common;
pub use blueshift_curve as curve;
pub use blueshift_drive as drive;
pub use blueshift_export as export;
pub use blueshift_orbits as orbits;
pub use blueshift_propulsion as propulsion;

pub mod sandbox;
