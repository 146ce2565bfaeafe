use std::cell::RefCell;
use std::rc::Rc;

use blueshift::common::units;
use blueshift::config::{CrewConfig, VesselConfig, WarpSettings, load_bodies};
use blueshift::curve::Curve;
use blueshift::drive::{
    Capabilities, CruiseState, DriveError, EffectDriver, EngineEvent, EngineStatus, EventLog,
    FlameoutReason, FrameSkip, MaintenanceSchedule, PartState, Session, TravelOutcome,
    UnlockReason, WarpEngine, WarpVessel,
};
use blueshift::orbits::SpatialLocation;
use blueshift::propulsion::{ResourcePool, ResourceRate, WarpCoil, WarpGenerator};
use blueshift::sandbox::SandboxHost;

const GW: &str = "GravityWaves";

fn settings(frame_skip_seconds: f64) -> WarpSettings {
    WarpSettings {
        frame_skip_seconds,
        ..WarpSettings::default()
    }
}

fn session(settings: WarpSettings) -> Session {
    let bodies = load_bodies("configs/bodies.yaml").expect("bodies yaml");
    Session::from_config(settings, &bodies).expect("session")
}

fn host_at(session: &Session, body: &str, altitude_m: f64) -> SandboxHost {
    let config = VesselConfig {
        name: "Probe".to_string(),
        mass_tons: 10.0,
        parts: Vec::new(),
        resources: Vec::new(),
        crew: Vec::new(),
    };
    let body = session.catalog.get(body).expect("body in catalog");
    let mut host = SandboxHost::new(body, altitude_m, &config);
    host.throttle = 1.0;
    host
}

fn engine(id: &str, keys: &[(f64, f64)]) -> WarpEngine {
    WarpEngine::new(id, Curve::new(keys.iter().copied()).expect("curve"))
}

fn coil(id: &str) -> WarpCoil {
    WarpCoil {
        id: id.to_string(),
        warp_capacity: 10.0,
        displacement_impulse: 10.0,
        is_active: true,
        needs_maintenance: false,
        inputs: vec![ResourceRate {
            resource: GW.to_string(),
            rate_per_second: 1.0,
        }],
    }
}

fn generator(id: &str, rate: f64) -> WarpGenerator {
    WarpGenerator {
        id: id.to_string(),
        produced_resource: GW.to_string(),
        produced_rate_per_second: rate,
        inputs: Vec::new(),
        is_active: true,
        is_missing_resources: false,
    }
}

fn ledger() -> ResourcePool {
    ResourcePool::new().with_stock(GW, 5.0, 10.0)
}

/// One engine, one coil, one generator; effective capacity 10 on a 10 t hull.
fn probe(generator_rate: f64, frame_skip_seconds: f64) -> WarpVessel {
    let mut vessel = WarpVessel::new("Probe", frame_skip_seconds);
    vessel.push_engine(engine("drive", &[(1.0, 1.0)]));
    vessel.push_coil(coil("coil"));
    vessel.push_generator(generator("gravgen", generator_rate));
    vessel.activate_engine("drive").expect("engine exists");
    vessel
}

#[test]
fn interplanetary_probe_reaches_light_speed() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.0);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.location, SpatialLocation::Interplanetary);
    assert_eq!(report.power_multiplier, 1.0);
    assert_eq!(report.effective_capacity, 10.0);
    assert_eq!(report.max_warp_speed, 1.0);
    assert_eq!(report.warp_speed, 1.0);
    assert_eq!(report.driving_engine.as_deref(), Some("drive"));
    assert_eq!(report.flameout, None);
    assert!(matches!(report.travel, TravelOutcome::Travelled { .. }));
    assert_eq!(report.cruise_state, CruiseState::RealtimeTravel);

    let drive = vessel.engine("drive").expect("drive");
    assert!(drive.apply_warp_translation());
    assert!(!drive.locked_course_and_speed());
    assert_eq!(drive.status(), EngineStatus::Nominal);
    assert!((ledger.amount(GW) - 5.0).abs() < 1e-9);
}

#[test]
fn interstellar_space_multiplies_the_driver() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e12);
    let mut vessel = probe(1.0, 0.0);
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert_eq!(report.location, SpatialLocation::Interstellar);
    assert_eq!(report.max_warp_speed, 10.0);
}

#[test]
fn crew_skill_boosts_speed() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.crew.push(CrewConfig {
        name: "Val".to_string(),
        skill: "ConverterSkill".to_string(),
        rank: 5,
    });
    let mut vessel = probe(1.0, 0.0);
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert!((report.max_warp_speed - 1.25).abs() < 1e-12);
}

#[test]
fn without_generation_the_engine_flames_out_for_power() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let log = Rc::new(RefCell::new(EventLog::default()));
    let mut vessel = WarpVessel::new("Probe", 0.0);
    vessel.subscribe(Box::new(log.clone()));
    vessel.push_engine(engine("drive", &[(1.0, 1.0)]));
    vessel.push_coil(coil("coil"));
    vessel.push_generator(generator("gravgen", 0.0));
    vessel.activate_engine("drive").expect("engine exists");

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert_eq!(report.flameout, Some(FlameoutReason::NeedsPower));
    assert_eq!(report.effective_capacity, 0.0);
    assert_eq!(report.warp_speed, 0.0);
    assert_eq!(report.driving_engine, None);
    assert_eq!(report.travel, TravelOutcome::Idle);
    assert_eq!(
        vessel.engine("drive").expect("drive").status(),
        EngineStatus::FlamedOut(FlameoutReason::NeedsPower)
    );

    let log = log.borrow();
    assert_eq!(
        log.events.as_slice(),
        &[
            EngineEvent::Started {
                engine: "drive".to_string()
            },
            EngineEvent::Flameout {
                engine: "drive".to_string(),
                reason: FlameoutReason::NeedsPower,
            },
        ]
    );
}

#[test]
fn low_altitude_flames_out_until_the_vessel_climbs() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbin", 100_000.0);
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.0);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.location, SpatialLocation::Planetary);
    assert_eq!(report.flameout, Some(FlameoutReason::NeedsAltitude));
    assert_eq!(report.travel, TravelOutcome::Idle);

    host.position = [600_000.0 + 2_000_000.0, 0.0, 0.0];
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.flameout, None);
    assert!(report.events.contains(&EngineEvent::Unflameout {
        engine: "drive".to_string()
    }));
    // Planetary damping with no SOI curve bottoms out at the floor.
    assert_eq!(report.max_warp_speed, 0.001);
}

#[test]
fn host_reported_flameout_is_generic() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.host_flameouts.insert("drive".to_string());
    let mut vessel = probe(1.0, 0.0);
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert_eq!(report.flameout, Some(FlameoutReason::Generic));
    assert_eq!(
        vessel.engine("drive").expect("drive").status().to_string(),
        "Flameout"
    );
}

#[test]
fn maintenance_provider_takes_coils_offline() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let mut ledger = ledger();
    let schedule = MaintenanceSchedule::new().schedule("coil", 10.0);
    let mut vessel = probe(1.0, 0.0)
        .with_capabilities(Capabilities::none().with_maintenance(Box::new(schedule)));

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(!vessel.coils()[0].needs_maintenance);
    assert_eq!(report.warp_speed, 1.0);

    host.universal_time = 10.0;
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(vessel.coils()[0].needs_maintenance);
    assert_eq!(report.total_capacity, 0.0);
    assert_eq!(report.flameout, Some(FlameoutReason::NeedsPower));
}

#[test]
fn zero_throttle_draws_nothing_and_reports_ideal_speed() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.throttle = 0.0;
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.0);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!((ledger.amount(GW) - 5.02).abs() < 1e-9);
    assert_eq!(report.total_capacity, 10.0);
    assert_eq!(report.max_warp_speed, 1.0);
    assert_eq!(report.warp_speed, 0.0);
    assert_eq!(report.travel, TravelOutcome::Idle);
    assert_eq!(report.flameout, None);
}

#[test]
fn only_the_first_operational_engine_drives() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let mut ledger = ledger();
    let mut vessel = WarpVessel::new("Twin", 0.0);
    vessel.push_engine(engine("fore", &[(0.0, 0.5)]));
    vessel.push_coil(coil("ring"));
    vessel.push_engine(engine("aft", &[(0.0, 2.0)]));
    vessel.push_generator(generator("gravgen", 1.0));
    vessel.activate_engine("fore").expect("fore");
    vessel.activate_engine("aft").expect("aft");

    for _ in 0..5 {
        let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
        let translating = vessel
            .engines()
            .iter()
            .filter(|engine| engine.apply_warp_translation())
            .count();
        assert_eq!(translating, 1);
        assert_eq!(report.driving_engine.as_deref(), Some("fore"));
        // Both engines share the fastest curve's result.
        assert_eq!(report.max_warp_speed, 2.0);
    }

    vessel.shutdown_engine(&mut host, "fore").expect("fore");
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.driving_engine.as_deref(), Some("aft"));
    assert!(vessel.engine("aft").expect("aft").apply_warp_translation());
    assert_eq!(vessel.engine("fore").expect("fore").status(), EngineStatus::Idle);
}

#[test]
fn unknown_engine_ids_are_errors() {
    let mut vessel = probe(1.0, 0.0);
    let err = vessel.activate_engine("nope").unwrap_err();
    assert!(matches!(err, DriveError::UnknownEngine(ref id) if id == "nope"));
}

#[test]
fn throttle_change_opens_the_frame_skip_window() {
    let mut session = session(settings(0.1));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.1);

    let first = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(!first.frame_skipped);

    host.real_time = 0.02;
    host.throttle = 0.5;
    let before = ledger.amount(GW);
    let skipped = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(skipped.frame_skipped);
    assert_eq!(skipped.warp_speed, 0.5);
    assert_eq!(skipped.effective_capacity, first.effective_capacity);
    // The coil keeps drawing what the generator produces.
    assert!((ledger.amount(GW) - before).abs() < 1e-9);

    host.real_time = 0.2;
    let resumed = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(!resumed.frame_skipped);
    assert_eq!(resumed.warp_speed, 0.5);
}

#[test]
fn frame_skip_window_is_never_extended() {
    let mut window = FrameSkip::new(0.1);
    assert!(window.arm(0.0));
    assert!(window.is_active(0.05));
    assert!(!window.arm(0.05));
    assert!(window.is_active(0.09));
    assert!(!window.is_active(0.1));

    let mut window = FrameSkip::new(0.1);
    window.arm(0.0);
    // The expiry tick recomputes instead of opening the next window.
    assert!(!window.arm(0.1));
    assert!(!window.is_active(0.1));
    assert!(window.arm(0.12));
    assert!(window.is_active(0.2));
}

const EXOTIC: &str = "ExoticMatter";

/// A probe whose coil also burns exotic matter.
fn exotic_probe(frame_skip_seconds: f64) -> WarpVessel {
    let mut vessel = WarpVessel::new("Probe", frame_skip_seconds);
    vessel.push_engine(engine("drive", &[(1.0, 1.0)]));
    let mut ring = coil("coil");
    ring.inputs.push(ResourceRate {
        resource: EXOTIC.to_string(),
        rate_per_second: 1.0,
    });
    vessel.push_coil(ring);
    vessel.push_generator(generator("gravgen", 1.0));
    vessel.activate_engine("drive").expect("engine exists");
    vessel
}

#[test]
fn dragging_the_throttle_cannot_hold_the_skip_window_open() {
    let mut session = session(settings(0.1));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    let mut ledger = ledger().with_stock(EXOTIC, 0.1, 1.0);
    let mut vessel = exotic_probe(0.1);

    let mut reports = Vec::new();
    for tick in 0..50 {
        host.real_time = tick as f64 * 0.02;
        host.throttle = if tick % 2 == 0 { 1.0 } else { 0.9 };
        reports.push(vessel.fixed_update(&mut session, &mut host, &mut ledger));
    }

    assert!(ledger.amount(EXOTIC) < 1e-9);
    let skipped = reports.iter().filter(|report| report.frame_skipped).count();
    assert!(skipped > 0 && skipped < reports.len(), "{skipped} skipped ticks");

    let flamed = reports
        .iter()
        .position(|report| report.flameout.is_some())
        .expect("starved coil flames the engine out");
    assert!(flamed <= 10, "flameout only at tick {flamed}");
    for report in &reports[flamed..] {
        assert_eq!(report.flameout, Some(FlameoutReason::NeedsCapacity));
        assert!(!matches!(report.travel, TravelOutcome::Travelled { .. }));
    }
}

#[test]
fn throttle_change_while_locked_relocks_at_the_new_speed() {
    let mut session = session(settings(0.1));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.warp_rate = 100.0;
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.1);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(matches!(report.travel, TravelOutcome::Locked { .. }));
    assert!((host.orbital_velocity[0] - units::c_to_ms(1.0)).abs() < 1e-3);

    host.real_time = 0.02;
    host.throttle = 0.1;
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.cruise_unlocked, Some(UnlockReason::ThrottleChanged));
    assert!(report.frame_skipped);
    assert_eq!(report.travel, TravelOutcome::AwaitingLock);
    assert!((report.warp_speed - 0.1).abs() < 1e-12);
    assert!(host.orbital_velocity[0].abs() < 1e-6);
    assert!(!vessel.cruise().is_locked());

    host.real_time = 0.2;
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(!report.frame_skipped);
    assert!(matches!(report.travel, TravelOutcome::Locked { .. }));
    assert!((host.orbital_velocity[0] - units::c_to_ms(0.1)).abs() < 1e-3);
    let lock = vessel.cruise().active_lock().expect("relocked");
    assert!((lock.speed_c - 0.1).abs() < 1e-12);
}

#[test]
fn altitude_gate_wins_even_without_capacity() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbin", 100_000.0);
    let mut ledger = ledger().with_stock(EXOTIC, 0.0, 1.0);
    let mut vessel = exotic_probe(0.0);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.power_multiplier, 1.0);
    assert_eq!(report.total_capacity, 0.0);
    assert_eq!(report.effective_capacity, 0.0);
    assert_eq!(report.flameout, Some(FlameoutReason::NeedsAltitude));
    assert_eq!(report.travel, TravelOutcome::Idle);
}

#[derive(Clone, Default)]
struct EffectRecorder(Rc<RefCell<Vec<(String, f64, f64)>>>);

impl EffectDriver for EffectRecorder {
    fn drive(&mut self, engine_id: &str, throttle: f64, intensity: f64) {
        self.0.borrow_mut().push((engine_id.to_string(), throttle, intensity));
    }
}

#[test]
fn time_warp_locks_course_and_drives_effects() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.warp_rate = 100.0;
    host.throttle = 0.5;
    let mut ledger = ledger();
    let recorder = EffectRecorder::default();
    let mut vessel = probe(1.0, 0.0)
        .with_capabilities(Capabilities::none().with_effects(Box::new(recorder.clone())));

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert!(matches!(report.travel, TravelOutcome::Locked { .. }));
    assert_eq!(report.cruise_state, CruiseState::CruiseLocked);
    assert!(vessel.engine("drive").expect("drive").locked_course_and_speed());
    assert!(report.events.contains(&EngineEvent::EffectsUpdated {
        engine: "drive".to_string(),
        throttle: 0.5,
        intensity: 0.5,
    }));
    assert_eq!(recorder.0.borrow().as_slice(), &[("drive".to_string(), 0.5, 0.5)]);
    assert!(host.orbital_velocity[0] > 0.0);

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.travel, TravelOutcome::Holding);

    host.warp_rate = 1.0;
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.cruise_unlocked, Some(UnlockReason::TimeAccelerationEnded));
    assert!(host.orbital_velocity[0].abs() < 1e-6);
    assert!(!vessel.engine("drive").expect("drive").locked_course_and_speed());
}

#[test]
fn stopping_the_locked_driver_releases_the_lock() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.warp_rate = 100.0;
    let mut vessel = probe(1.0, 0.0);
    vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert!(vessel.cruise().is_locked());

    vessel.shutdown_engine(&mut host, "drive").expect("drive");
    assert!(!vessel.cruise().is_locked());
    assert!(host.orbital_velocity[0].abs() < 1e-6);
}

#[test]
fn crossing_a_boundary_unlocks_the_cruise() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.warp_rate = 100.0;
    let mut ledger = ledger();
    let mut vessel = probe(1.0, 0.0);
    vessel.fixed_update(&mut session, &mut host, &mut ledger);

    host.position = [1.0e12, 0.0, 0.0];
    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger);
    assert_eq!(report.location, SpatialLocation::Interstellar);
    assert_eq!(report.cruise_unlocked, Some(UnlockReason::LocationCrossed));
}

#[test]
fn collision_course_marks_the_driver() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbin", 700_000.0);
    host.forward = [-1.0, 0.0, 0.0];
    let mut drive = engine("drive", &[(1.0, 1.0)]);
    drive.planetary_soi_speed_curve = Curve::constant(0.2);
    let mut vessel = WarpVessel::new("Probe", 0.0);
    vessel.push_engine(drive);
    vessel.push_coil(coil("coil"));
    vessel.push_generator(generator("gravgen", 1.0));
    vessel.activate_engine("drive").expect("drive");

    let report = vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert_eq!(report.travel, TravelOutcome::CollisionAvoided);
    assert_eq!(host.throttle, 0.0);
    assert_eq!(
        vessel.engine("drive").expect("drive").status(),
        EngineStatus::CollisionImminent
    );
}

#[test]
fn saved_state_round_trips_and_mismatches_are_rejected() {
    let mut vessel = probe(1.0, 0.0);
    vessel.coils_mut()[0].needs_maintenance = true;
    let state = vessel.save_state();
    let ids: Vec<&str> = state.parts.iter().map(PartState::id).collect();
    assert_eq!(ids, vec!["drive", "coil", "gravgen"]);

    let mut host = host_at(&session(settings(0.0)), "Kerbin", 1_000_000.0);
    let mut fresh = probe(1.0, 0.0);
    fresh.shutdown_engine(&mut host, "drive").expect("drive");
    assert!(!fresh.engine("drive").expect("drive").is_ignited());
    fresh.restore_state(&state).expect("matching parts");
    assert!(fresh.engine("drive").expect("drive").is_ignited());
    assert!(fresh.coils()[0].needs_maintenance);

    let mut foreign = state.clone();
    foreign.parts.push(PartState::Generator {
        id: "stowaway".to_string(),
        is_active: false,
    });
    foreign.parts[0] = PartState::Engine {
        id: "drive".to_string(),
        ignited: false,
    };
    let err = fresh.restore_state(&foreign).unwrap_err();
    assert!(matches!(err, DriveError::StateMismatch { .. }), "{err}");
    assert!(fresh.engine("drive").expect("drive").is_ignited());
}

#[test]
fn restoring_state_drops_an_active_lock() {
    let mut session = session(settings(0.0));
    let mut host = host_at(&session, "Kerbol", 1.0e10);
    host.warp_rate = 100.0;
    let mut vessel = probe(1.0, 0.0);
    vessel.fixed_update(&mut session, &mut host, &mut ledger());
    assert!(vessel.cruise().is_locked());

    let state = vessel.save_state();
    vessel.restore_state(&state).expect("own state");
    assert!(!vessel.cruise().is_locked());
    assert_eq!(vessel.cruise().state(), CruiseState::Idle);
    // The host keeps the delta; persisting the pre-lock orbit is its job.
    assert!(host.orbital_velocity[0] > 0.0);
}
