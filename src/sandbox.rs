//! In-memory host for driving the warp core without a game engine.
//!
//! The main body sits at the origin of its own frame and the vessel coasts on
//! its orbital velocity. Nothing here models gravity.

use std::collections::HashSet;

use blueshift_config::{CelestialBodyConfig, CrewConfig, VesselConfig, WarpSettings};
use blueshift_core::vector::{self, Vector3};
use blueshift_drive::{
    DriveError, FlightControls, OrbitMutator, Session, TickReport, TimeSource, VesselQuery,
    WarpVessel,
};
use blueshift_orbits::{CelestialBody, Situation};
use blueshift_propulsion::ResourcePool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error(transparent)]
    Drive(#[from] DriveError),
    #[error("unknown body `{0}`")]
    UnknownBody(String),
    #[error("unknown vessel `{0}`")]
    UnknownVessel(String),
}

#[derive(Debug, Clone)]
pub struct SandboxHost {
    pub situation: Situation,
    pub mass_tons: f64,
    pub main_body: String,
    pub body_radius_m: f64,
    pub body_position: Vector3,
    pub frame_velocity: Vector3,
    pub position: Vector3,
    pub forward: Vector3,
    pub orbital_velocity: Vector3,
    pub throttle: f64,
    pub crew: Vec<CrewConfig>,
    pub loaded_vessels: usize,
    pub universal_time: f64,
    pub real_time: f64,
    pub delta_time: f64,
    /// Time warp rate; anything above 1 counts as accelerated.
    pub warp_rate: f64,
    pub cutoff: bool,
    pub host_flameouts: HashSet<String>,
    pub messages: Vec<String>,
    pub rails_transitions: usize,
    pub origin_shift_m: f64,
}

impl SandboxHost {
    /// Place a vessel `altitude_m` above `body`, pointing radially outward.
    pub fn new(body: &CelestialBody, altitude_m: f64, vessel: &VesselConfig) -> Self {
        Self {
            situation: Situation::Orbiting,
            mass_tons: vessel.mass_tons,
            main_body: body.name.clone(),
            body_radius_m: body.radius_m,
            body_position: vector::ZERO,
            frame_velocity: vector::ZERO,
            position: [body.radius_m + altitude_m, 0.0, 0.0],
            forward: [1.0, 0.0, 0.0],
            orbital_velocity: vector::ZERO,
            throttle: 0.0,
            crew: vessel.crew.clone(),
            loaded_vessels: 1,
            universal_time: 0.0,
            real_time: 0.0,
            delta_time: 0.02,
            warp_rate: 1.0,
            cutoff: false,
            host_flameouts: HashSet::new(),
            messages: Vec::new(),
            rails_transitions: 0,
            origin_shift_m: 0.0,
        }
    }

    /// Advance the clocks by one tick and coast along the orbital velocity.
    pub fn advance(&mut self) {
        let elapsed = self.delta_time * self.warp_rate.max(1.0);
        self.universal_time += elapsed;
        self.real_time += self.delta_time;
        let travelled = vector::scale(&self.orbital_velocity, elapsed);
        self.position = vector::add(&self.position, &travelled);
    }

    /// Distance from the vessel to the main body's center.
    pub fn radial_distance_m(&self) -> f64 {
        vector::distance(&self.position, &self.body_position)
    }
}

impl VesselQuery for SandboxHost {
    fn situation(&self) -> Situation {
        self.situation
    }

    fn mass_tons(&self) -> f64 {
        self.mass_tons
    }

    fn altitude_m(&self) -> f64 {
        self.radial_distance_m() - self.body_radius_m
    }

    fn position(&self) -> Vector3 {
        self.position
    }

    fn forward(&self) -> Vector3 {
        self.forward
    }

    fn main_body(&self) -> &str {
        &self.main_body
    }

    fn main_body_position(&self) -> Vector3 {
        self.body_position
    }

    fn main_body_frame_velocity(&self) -> Vector3 {
        self.frame_velocity
    }

    fn orbital_velocity(&self) -> Vector3 {
        self.orbital_velocity
    }

    fn throttle(&self) -> f64 {
        self.throttle
    }

    fn highest_crew_rank(&self, skill: &str) -> Option<u32> {
        self.crew
            .iter()
            .filter(|member| member.skill == skill)
            .map(|member| member.rank)
            .max()
    }

    fn loaded_vessel_count(&self) -> usize {
        self.loaded_vessels
    }

    fn host_flameout(&self, engine_id: &str) -> bool {
        self.host_flameouts.contains(engine_id)
    }
}

impl TimeSource for SandboxHost {
    fn universal_time(&self) -> f64 {
        self.universal_time
    }

    fn real_time(&self) -> f64 {
        self.real_time
    }

    fn delta_time(&self) -> f64 {
        self.delta_time
    }

    fn is_time_accelerated(&self) -> bool {
        self.warp_rate > 1.0
    }

    fn cutoff_requested(&self) -> bool {
        self.cutoff
    }
}

impl OrbitMutator for SandboxHost {
    fn set_position(&mut self, position: Vector3) {
        self.position = position;
    }

    fn shift_floating_origin(&mut self, offset: Vector3) {
        self.body_position = vector::sub(&self.body_position, &offset);
        self.origin_shift_m += vector::norm(&offset);
    }

    fn add_orbital_velocity(&mut self, delta: Vector3, _universal_time: f64) {
        self.orbital_velocity = vector::add(&self.orbital_velocity, &delta);
    }

    fn go_on_rails(&mut self) {
        self.rails_transitions += 1;
    }

    fn go_off_rails(&mut self) {}
}

impl FlightControls for SandboxHost {
    fn set_throttle(&mut self, throttle: f64) {
        self.throttle = throttle.clamp(0.0, 1.0);
    }

    fn cancel_time_acceleration(&mut self) {
        self.warp_rate = 1.0;
    }

    fn post_message(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

/// A session, one vessel, its host, and its inventory, stepped together.
#[derive(Debug)]
pub struct Simulation {
    pub session: Session,
    pub vessel: WarpVessel,
    pub host: SandboxHost,
    pub ledger: ResourcePool,
}

impl Simulation {
    pub fn new(
        settings: WarpSettings,
        bodies: &[CelestialBodyConfig],
        vessel: &VesselConfig,
        body: &str,
        altitude_m: f64,
    ) -> Result<Self, SandboxError> {
        let session = Session::from_config(settings, bodies)?;
        let start = session
            .catalog
            .get(body)
            .ok_or_else(|| SandboxError::UnknownBody(body.to_string()))?;
        let host = SandboxHost::new(start, altitude_m, vessel);
        Ok(Self {
            vessel: WarpVessel::from_config(vessel, &session.settings),
            ledger: ResourcePool::from_config(&vessel.resources),
            host,
            session,
        })
    }

    /// Pick a vessel by name from a loaded list.
    pub fn select<'a>(
        vessels: &'a [VesselConfig],
        name: Option<&str>,
    ) -> Result<&'a VesselConfig, SandboxError> {
        match name {
            Some(name) => vessels
                .iter()
                .find(|vessel| vessel.name == name)
                .ok_or_else(|| SandboxError::UnknownVessel(name.to_string())),
            None => vessels
                .first()
                .ok_or_else(|| SandboxError::UnknownVessel("<none>".to_string())),
        }
    }

    pub fn activate_all_engines(&mut self) -> Result<(), SandboxError> {
        let ids: Vec<String> = self.vessel.engines().iter().map(|e| e.id.clone()).collect();
        for id in ids {
            self.vessel.activate_engine(&id)?;
        }
        Ok(())
    }

    /// Run one tick, then advance the host clocks.
    pub fn step(&mut self) -> TickReport {
        let report = self
            .vessel
            .fixed_update(&mut self.session, &mut self.host, &mut self.ledger);
        self.host.advance();
        report
    }

    pub fn run(&mut self, ticks: usize) -> Vec<TickReport> {
        (0..ticks).map(|_| self.step()).collect()
    }
}
