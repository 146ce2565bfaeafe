//! Adapter boundary between the warp core and the host simulation.
//!
//! The core never owns a vessel. It reads vessel state through [`VesselQuery`],
//! reads clocks through [`TimeSource`], and asks the host to move the vessel or
//! change its controls through [`OrbitMutator`] and [`FlightControls`].

use blueshift_core::vector::Vector3;
use blueshift_orbits::Situation;

/// Read-only view of the vessel and its reference body.
pub trait VesselQuery {
    fn situation(&self) -> Situation;
    fn mass_tons(&self) -> f64;
    /// Altitude above the main body's surface (m).
    fn altitude_m(&self) -> f64;
    fn position(&self) -> Vector3;
    /// Unit vector along the vessel's direction of travel.
    fn forward(&self) -> Vector3;
    fn main_body(&self) -> &str;
    fn main_body_position(&self) -> Vector3;
    /// Velocity of the main body's reference frame.
    fn main_body_frame_velocity(&self) -> Vector3;
    /// Orbital velocity relative to the main body.
    fn orbital_velocity(&self) -> Vector3;
    /// Main throttle in `[0, 1]`.
    fn throttle(&self) -> f64;
    /// Highest experience rank among crew with the given skill.
    fn highest_crew_rank(&self, skill: &str) -> Option<u32>;
    /// Vessels currently loaded in physics range, including this one.
    fn loaded_vessel_count(&self) -> usize;

    /// Flameouts the host detected on its own (e.g. regular propellant starvation).
    fn host_flameout(&self, _engine_id: &str) -> bool {
        false
    }
}

pub trait TimeSource {
    fn universal_time(&self) -> f64;
    /// Wall-clock seconds; keeps running at real speed during time acceleration.
    fn real_time(&self) -> f64;
    fn delta_time(&self) -> f64;
    fn is_time_accelerated(&self) -> bool;
    /// Polled every tick; true while the cutoff/brakes input is held.
    fn cutoff_requested(&self) -> bool;
}

pub trait OrbitMutator {
    fn set_position(&mut self, position: Vector3);
    /// Move the world by `offset` so the (only loaded) vessel effectively travels by it.
    fn shift_floating_origin(&mut self, offset: Vector3);
    /// Add `delta` to the vessel's orbital state vectors at `universal_time`.
    fn add_orbital_velocity(&mut self, delta: Vector3, universal_time: f64);
    fn go_on_rails(&mut self);
    fn go_off_rails(&mut self);
}

pub trait FlightControls {
    fn set_throttle(&mut self, throttle: f64);
    fn cancel_time_acceleration(&mut self);
    fn post_message(&mut self, message: &str);
}

/// Everything the control loop needs from the host.
pub trait Host: VesselQuery + TimeSource + OrbitMutator + FlightControls {}

impl<T> Host for T where T: VesselQuery + TimeSource + OrbitMutator + FlightControls {}

/// Run `mutate` with the vessel packed onto rails.
pub fn on_rails<H, F>(host: &mut H, mutate: F)
where
    H: OrbitMutator + ?Sized,
    F: FnOnce(&mut H),
{
    host.go_on_rails();
    mutate(host);
    host.go_off_rails();
}
