//! Per-tick orchestration of every warp part on one vessel.
//!
//! Each physics tick runs, in order: spatial classification, generator output,
//! capacity aggregation, speed resolution, flameout gating, arbitration of the
//! driving engine, real-time travel or cruise locking, effects while locked, and
//! finally observer dispatch.

use blueshift_config::{PartConfig, VesselConfig, WarpSettings};
use blueshift_core::constants::THROTTLE_EPSILON;
use blueshift_orbits::{SpatialLocation, VesselPosition};
use blueshift_propulsion::{
    AggregationRequest, CapacityTotals, ResourceLedger, WarpCoil, WarpGenerator, aggregate,
    effective_capacity, power_balance, power_ceiling,
};

use crate::capabilities::Capabilities;
use crate::cruise::{CruiseController, CruiseState, TravelContext, TravelOutcome, UnlockReason};
use crate::engine::{EngineSnapshot, EngineStatus, WarpEngine, arbitrate, has_driving_peer_ahead};
use crate::error::DriveError;
use crate::events::{EngineEvent, EngineObserver};
use crate::flameout::{self, FlameoutReason, FlameoutTransition, IgnitionGates};
use crate::frame_skip::FrameSkip;
use crate::host::Host;
use crate::persist::{PartState, VesselState};
use crate::session::Session;
use crate::speed::{self, SpeedContext, WarpSpeeds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartSlot {
    Engine(usize),
    Coil(usize),
    Generator(usize),
}

/// Values carried over while the frame skip window suppresses recomputation.
#[derive(Debug, Clone, Copy, Default)]
struct Recomputed {
    power_multiplier: f64,
    total_capacity: f64,
    total_displacement: f64,
    effective_capacity: f64,
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub universal_time: f64,
    pub location: SpatialLocation,
    pub throttle: f64,
    pub power_multiplier: f64,
    pub total_capacity: f64,
    pub total_displacement: f64,
    pub effective_capacity: f64,
    /// Speed of the driving engine (fraction of c).
    pub warp_speed: f64,
    pub max_warp_speed: f64,
    pub driving_engine: Option<String>,
    pub cruise_state: CruiseState,
    pub travel: TravelOutcome,
    pub cruise_unlocked: Option<UnlockReason>,
    pub frame_skipped: bool,
    /// Reason of the first flamed-out engine in attachment order.
    pub flameout: Option<FlameoutReason>,
    pub events: Vec<EngineEvent>,
}

pub struct WarpVessel {
    pub name: String,
    engines: Vec<WarpEngine>,
    coils: Vec<WarpCoil>,
    generators: Vec<WarpGenerator>,
    order: Vec<PartSlot>,
    cruise: CruiseController,
    frame_skip: FrameSkip,
    location: Option<SpatialLocation>,
    last_throttle: Option<f64>,
    recomputed: Recomputed,
    capabilities: Capabilities,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl std::fmt::Debug for WarpVessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarpVessel")
            .field("name", &self.name)
            .field("engines", &self.engines.len())
            .field("coils", &self.coils.len())
            .field("generators", &self.generators.len())
            .field("cruise", &self.cruise.state())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl WarpVessel {
    pub fn new(name: impl Into<String>, frame_skip_seconds: f64) -> Self {
        Self {
            name: name.into(),
            engines: Vec::new(),
            coils: Vec::new(),
            generators: Vec::new(),
            order: Vec::new(),
            cruise: CruiseController::new(),
            frame_skip: FrameSkip::new(frame_skip_seconds),
            location: None,
            last_throttle: None,
            recomputed: Recomputed::default(),
            capabilities: Capabilities::none(),
            observers: Vec::new(),
        }
    }

    /// Build a vessel whose parts keep the configured attachment order.
    pub fn from_config(config: &VesselConfig, settings: &WarpSettings) -> Self {
        let mut vessel = Self::new(config.name.clone(), settings.frame_skip_seconds);
        for part in &config.parts {
            match part {
                PartConfig::Engine(engine) => vessel.push_engine(WarpEngine::from_config(engine)),
                PartConfig::Coil(coil) => vessel.push_coil(WarpCoil::from_config(coil)),
                PartConfig::Generator(generator) => {
                    vessel.push_generator(WarpGenerator::from_config(generator))
                }
            }
        }
        vessel
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn push_engine(&mut self, engine: WarpEngine) {
        self.order.push(PartSlot::Engine(self.engines.len()));
        self.engines.push(engine);
    }

    pub fn push_coil(&mut self, coil: WarpCoil) {
        self.order.push(PartSlot::Coil(self.coils.len()));
        self.coils.push(coil);
    }

    pub fn push_generator(&mut self, generator: WarpGenerator) {
        self.order.push(PartSlot::Generator(self.generators.len()));
        self.generators.push(generator);
    }

    pub fn subscribe(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    pub fn engines(&self) -> &[WarpEngine] {
        &self.engines
    }

    pub fn engine(&self, id: &str) -> Option<&WarpEngine> {
        self.engines.iter().find(|engine| engine.id == id)
    }

    pub fn coils(&self) -> &[WarpCoil] {
        &self.coils
    }

    pub fn coils_mut(&mut self) -> &mut [WarpCoil] {
        &mut self.coils
    }

    pub fn generators(&self) -> &[WarpGenerator] {
        &self.generators
    }

    pub fn generators_mut(&mut self) -> &mut [WarpGenerator] {
        &mut self.generators
    }

    pub fn cruise(&self) -> &CruiseController {
        &self.cruise
    }

    pub fn snapshots(&self) -> Vec<EngineSnapshot> {
        self.engines.iter().map(WarpEngine::snapshot).collect()
    }

    pub fn activate_engine(&mut self, id: &str) -> Result<(), DriveError> {
        let index = self.engine_index(id)?;
        if let Some(event) = self.engines[index].activate() {
            tracing::info!(vessel = %self.name, engine = id, "warp engine started");
            self.dispatch(&[event]);
        }
        Ok(())
    }

    /// Stop an engine. Stopping the engine that holds the cruise lock releases it first.
    pub fn shutdown_engine<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        id: &str,
    ) -> Result<(), DriveError> {
        let index = self.engine_index(id)?;
        if self.engines[index].locked_course_and_speed() {
            self.cruise.unlock(host, UnlockReason::EngineStopped);
        }
        if let Some(event) = self.engines[index].shutdown() {
            tracing::info!(vessel = %self.name, engine = id, "warp engine shut down");
            self.dispatch(&[event]);
        }
        Ok(())
    }

    /// Advance every warp part on the vessel by one physics tick.
    pub fn fixed_update<H, L>(
        &mut self,
        session: &mut Session,
        host: &mut H,
        ledger: &mut L,
    ) -> TickReport
    where
        H: Host + ?Sized,
        L: ResourceLedger + ?Sized,
    {
        let universal_time = host.universal_time();
        let real_time = host.real_time();
        let delta_time = host.delta_time();
        let throttle = host.throttle().clamp(0.0, 1.0);
        let situation = host.situation();
        let altitude_m = host.altitude_m();
        let main_body = host.main_body().to_string();
        let mut events = Vec::new();
        let mut cruise_unlocked = None;

        for coil in self.coils.iter_mut() {
            if let Some(flag) = self.capabilities.needs_maintenance(&coil.id, universal_time) {
                coil.needs_maintenance = flag;
            }
        }

        let location = session.classify(&VesselPosition {
            situation,
            main_body: &main_body,
            altitude_m,
        });
        if let Some(previous) = self.location {
            if previous != location {
                tracing::info!(
                    vessel = %self.name,
                    from = %previous,
                    to = %location,
                    "crossed spatial boundary"
                );
                self.frame_skip.arm(real_time);
                if self.cruise.unlock(host, UnlockReason::LocationCrossed).is_some() {
                    cruise_unlocked = Some(UnlockReason::LocationCrossed);
                }
            }
        }
        self.location = Some(location);

        if let Some(previous) = self.last_throttle {
            if (previous - throttle).abs() > THROTTLE_EPSILON {
                self.frame_skip.arm(real_time);
                if self.cruise.unlock(host, UnlockReason::ThrottleChanged).is_some() {
                    cruise_unlocked = Some(UnlockReason::ThrottleChanged);
                }
            }
        }
        if throttle <= 0.0 {
            self.frame_skip.clear();
        }
        self.last_throttle = Some(throttle);
        let skipping = self.frame_skip.is_active(real_time);

        for generator in self.generators.iter_mut() {
            generator.run(ledger, delta_time);
        }

        // Coils draw every tick; the skip window only freezes the totals the gates see.
        let totals = self.capacity_totals(&session.settings, ledger, throttle, delta_time);
        if !skipping {
            let engine_displacement: f64 = self
                .engines
                .iter()
                .filter(|engine| engine.is_ignited())
                .map(|engine| engine.displacement_impulse)
                .sum();
            self.recomputed = Recomputed {
                power_multiplier: totals.power_multiplier,
                total_capacity: totals.total_capacity,
                total_displacement: totals.total_displacement + engine_displacement,
                effective_capacity: effective_capacity(
                    totals.total_capacity,
                    totals.total_displacement + engine_displacement,
                    host.mass_tons(),
                    totals.power_multiplier,
                ),
            };
        }

        let ctx = self.speed_context(session, host, location, throttle, &main_body, altitude_m);
        let mut speeds = (!skipping)
            .then(|| speed::resolve(self.recomputed.effective_capacity, &self.engines, &ctx));

        let body_radius_m = session.body_radius(&main_body);
        let mut transitioned = false;
        for engine in self.engines.iter_mut().filter(|engine| engine.is_ignited()) {
            let gates = IgnitionGates {
                has_power: self.recomputed.power_multiplier >= engine.warp_ignition_threshold,
                in_space: situation.is_in_space(),
                above_min_altitude: altitude_m >= engine.min_altitude_m(body_radius_m),
                has_capacity: throttle <= 0.0 || self.recomputed.effective_capacity > 0.0,
                host_nominal: !host.host_flameout(&engine.id),
            };
            let (state, transition) = flameout::step(engine.flameout(), &gates);
            engine.set_flameout(state);
            match transition {
                FlameoutTransition::Unchanged => {}
                FlameoutTransition::FlamedOut(reason) => {
                    tracing::warn!(
                        vessel = %self.name,
                        engine = %engine.id,
                        %reason,
                        "warp engine flamed out"
                    );
                    transitioned = true;
                    events.push(EngineEvent::Flameout {
                        engine: engine.id.clone(),
                        reason,
                    });
                }
                FlameoutTransition::Reignited => {
                    tracing::info!(
                        vessel = %self.name,
                        engine = %engine.id,
                        "warp engine re-ignited"
                    );
                    transitioned = true;
                    events.push(EngineEvent::Unflameout {
                        engine: engine.id.clone(),
                    });
                }
            }
        }
        if transitioned {
            speeds = Some(speed::resolve(self.recomputed.effective_capacity, &self.engines, &ctx));
        }
        match speeds {
            Some(speeds) => self.apply_speeds(location, &speeds),
            None => {
                for engine in self.engines.iter_mut() {
                    let max = engine.max_warp_speed();
                    let current = if engine.is_operational() { max * throttle } else { 0.0 };
                    engine.set_speeds(location, current, max);
                }
            }
        }

        let driver = arbitrate(&self.engines);
        let speed_c = driver.map_or(0.0, |index| self.engines[index].warp_speed());
        let travel = self.cruise.update(
            host,
            &TravelContext {
                speed_c,
                body_radius_m: session.body_radius(&main_body),
                can_drive: driver.is_some(),
                allow_lock: !skipping,
            },
        );
        match travel {
            TravelOutcome::CollisionAvoided => {
                if let Some(index) = driver {
                    self.engines[index].set_status(EngineStatus::CollisionImminent);
                }
            }
            TravelOutcome::Unlocked { reason } => cruise_unlocked = Some(reason),
            _ => {}
        }

        let drives: Vec<bool> = (0..self.engines.len())
            .map(|index| {
                self.engines[index].is_operational()
                    && !has_driving_peer_ahead(&self.engines, index)
            })
            .collect();
        let locked = self.cruise.is_locked();
        for (engine, drives) in self.engines.iter_mut().zip(drives) {
            engine.set_translation(drives, locked);
        }

        if let Some(index) = driver.filter(|_| locked) {
            let engine = &self.engines[index];
            let intensity = engine.effect_intensity(throttle);
            self.capabilities.drive_effects(&engine.id, throttle, intensity);
            events.push(EngineEvent::EffectsUpdated {
                engine: engine.id.clone(),
                throttle,
                intensity,
            });
        }

        self.dispatch(&events);

        let driving = driver.map(|index| &self.engines[index]);
        TickReport {
            universal_time,
            location,
            throttle,
            power_multiplier: self.recomputed.power_multiplier,
            total_capacity: self.recomputed.total_capacity,
            total_displacement: self.recomputed.total_displacement,
            effective_capacity: self.recomputed.effective_capacity,
            warp_speed: driving.map_or(0.0, WarpEngine::warp_speed),
            max_warp_speed: driving.map_or(0.0, WarpEngine::max_warp_speed),
            driving_engine: driving.map(|engine| engine.id.clone()),
            cruise_state: self.cruise.state(),
            travel,
            cruise_unlocked,
            frame_skipped: skipping,
            flameout: self.engines.iter().find_map(|engine| engine.flameout().reason()),
            events,
        }
    }

    /// Durable part state in attachment order.
    pub fn save_state(&self) -> VesselState {
        let parts = self
            .order
            .iter()
            .map(|slot| match *slot {
                PartSlot::Engine(index) => PartState::Engine {
                    id: self.engines[index].id.clone(),
                    ignited: self.engines[index].is_ignited(),
                },
                PartSlot::Coil(index) => PartState::Coil {
                    id: self.coils[index].id.clone(),
                    is_active: self.coils[index].is_active,
                    needs_maintenance: self.coils[index].needs_maintenance,
                },
                PartSlot::Generator(index) => PartState::Generator {
                    id: self.generators[index].id.clone(),
                    is_active: self.generators[index].is_active,
                },
            })
            .collect();
        VesselState {
            vessel: self.name.clone(),
            parts,
        }
    }

    /// Apply saved part state and reset everything transient.
    ///
    /// The state is checked in full before anything is changed.
    ///
    /// An active cruise lock is dropped without touching the host, so the
    /// velocity delta it applied stays on the host's orbit. Hosts must persist
    /// the pre-lock orbit, or unlock through [`WarpVessel::shutdown_engine`]
    /// (or by ending time acceleration) before saving.
    pub fn restore_state(&mut self, state: &VesselState) -> Result<(), DriveError> {
        for part in &state.parts {
            let known = match part {
                PartState::Engine { id, .. } => self.engines.iter().any(|e| &e.id == id),
                PartState::Coil { id, .. } => self.coils.iter().any(|c| &c.id == id),
                PartState::Generator { id, .. } => self.generators.iter().any(|g| &g.id == id),
            };
            if !known {
                return Err(DriveError::StateMismatch {
                    vessel: self.name.clone(),
                    message: format!("no matching part `{}`", part.id()),
                });
            }
        }

        for part in &state.parts {
            match part {
                PartState::Engine { id, ignited } => {
                    if let Some(engine) = self.engines.iter_mut().find(|e| &e.id == id) {
                        engine.restore_ignition(*ignited);
                    }
                }
                PartState::Coil {
                    id,
                    is_active,
                    needs_maintenance,
                } => {
                    if let Some(coil) = self.coils.iter_mut().find(|c| &c.id == id) {
                        coil.is_active = *is_active;
                        coil.needs_maintenance = *needs_maintenance;
                    }
                }
                PartState::Generator { id, is_active } => {
                    if let Some(generator) = self.generators.iter_mut().find(|g| &g.id == id) {
                        generator.is_active = *is_active;
                        generator.is_missing_resources = false;
                    }
                }
            }
        }

        self.cruise = CruiseController::new();
        self.frame_skip.clear();
        self.location = None;
        self.last_throttle = None;
        self.recomputed = Recomputed::default();
        tracing::debug!(vessel = %self.name, parts = state.parts.len(), "restored part state");
        Ok(())
    }

    fn engine_index(&self, id: &str) -> Result<usize, DriveError> {
        self.engines
            .iter()
            .position(|engine| engine.id == id)
            .ok_or_else(|| DriveError::UnknownEngine(id.to_string()))
    }

    /// Consume coil inputs while an engine is running; otherwise report ideal totals.
    fn capacity_totals<L: ResourceLedger + ?Sized>(
        &self,
        settings: &WarpSettings,
        ledger: &mut L,
        throttle: f64,
        delta_time: f64,
    ) -> CapacityTotals {
        let threshold = self
            .engines
            .iter()
            .filter(|engine| engine.is_ignited())
            .map(|engine| engine.warp_ignition_threshold)
            .fold(None, |lowest: Option<f64>, value| {
                Some(lowest.map_or(value, |current| current.min(value)))
            });

        match threshold {
            Some(threshold) if throttle > 0.0 => {
                let request = AggregationRequest::from_settings(settings, threshold, delta_time);
                aggregate(&self.coils, &self.generators, ledger, &request)
            }
            _ => {
                let balance = power_balance(
                    &self.coils,
                    &self.generators,
                    &settings.warp_simulation_resource,
                    power_ceiling(settings),
                );
                let operational = self.coils.iter().filter(|coil| coil.is_operational());
                let (total_capacity, total_displacement) = operational
                    .fold((0.0, 0.0), |(capacity, displacement), coil| {
                        (capacity + coil.warp_capacity, displacement + coil.displacement_impulse)
                    });
                CapacityTotals {
                    total_capacity,
                    total_displacement,
                    power_multiplier: balance.multiplier,
                    ..CapacityTotals::default()
                }
            }
        }
    }

    fn speed_context<H: Host + ?Sized>(
        &self,
        session: &Session,
        host: &H,
        location: SpatialLocation,
        throttle: f64,
        main_body: &str,
        altitude_m: f64,
    ) -> SpeedContext {
        let mut ctx = SpeedContext::new(&session.settings, location, throttle);
        ctx.planetary_altitude_ratio = session.planetary_altitude_ratio(main_body, altitude_m);
        if let Some(engine) = self.engines.iter().find(|engine| engine.is_ignited()) {
            let rank = host.highest_crew_rank(&engine.warp_speed_skill);
            ctx.skill_bonus = engine.skill_bonus(rank);
        }
        ctx
    }

    fn apply_speeds(&mut self, location: SpatialLocation, speeds: &WarpSpeeds) {
        for engine in self.engines.iter_mut() {
            if engine.is_operational() {
                engine.set_speeds(location, speeds.warp_speed, speeds.max_warp_speed);
            } else {
                engine.set_speeds(location, 0.0, 0.0);
            }
        }
    }

    fn dispatch(&mut self, events: &[EngineEvent]) {
        for event in events {
            for observer in self.observers.iter_mut() {
                observer.on_engine_event(event);
            }
        }
    }
}
