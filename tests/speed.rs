use blueshift::config::WarpSettings;
use blueshift::curve::Curve;
use blueshift::drive::speed::resolve;
use blueshift::drive::{SpeedContext, WarpEngine};
use blueshift::orbits::SpatialLocation;

fn engine(id: &str, keys: &[(f64, f64)]) -> WarpEngine {
    let mut engine = WarpEngine::new(id, Curve::new(keys.iter().copied()).expect("curve"));
    engine.activate();
    engine
}

fn context(location: SpatialLocation, throttle: f64) -> SpeedContext {
    SpeedContext::new(&WarpSettings::default(), location, throttle)
}

#[test]
fn curve_clamps_to_last_key() {
    let engines = [engine("drive", &[(1.0, 1.0)])];
    let speeds = resolve(10.0, &engines, &context(SpatialLocation::Interplanetary, 1.0));
    assert_eq!(speeds.max_warp_speed, 1.0);
    assert_eq!(speeds.warp_speed, 1.0);
    assert_eq!(speeds.engine_index, Some(0));
}

#[test]
fn warp_speed_is_max_times_throttle() {
    let engines = [engine("drive", &[(0.0, 0.0), (10.0, 2.0)])];
    for step in 0..=10 {
        let throttle = step as f64 / 10.0;
        let speeds = resolve(5.0, &engines, &context(SpatialLocation::Interplanetary, throttle));
        assert!((speeds.warp_speed - speeds.max_warp_speed * throttle).abs() < 1e-12);
        assert!(speeds.warp_speed >= 0.0);
    }
    let idle = resolve(5.0, &engines, &context(SpatialLocation::Interplanetary, 0.0));
    assert_eq!(idle.warp_speed, 0.0);
    assert_eq!(idle.max_warp_speed, 1.0);
}

#[test]
fn fastest_engine_wins_and_ties_go_to_the_first() {
    let engines = [
        engine("slow", &[(0.0, 0.5)]),
        engine("fast", &[(0.0, 2.0)]),
        engine("also-fast", &[(0.0, 2.0)]),
    ];
    let speeds = resolve(1.0, &engines, &context(SpatialLocation::Interplanetary, 1.0));
    assert_eq!(speeds.engine_index, Some(1));
    assert_eq!(speeds.max_warp_speed, 2.0);
}

#[test]
fn stopped_engines_do_not_contribute() {
    let mut stopped = engine("stopped", &[(0.0, 5.0)]);
    stopped.shutdown();
    let engines = [stopped, engine("running", &[(0.0, 1.0)])];
    let speeds = resolve(1.0, &engines, &context(SpatialLocation::Interplanetary, 1.0));
    assert_eq!(speeds.engine_index, Some(1));
    assert_eq!(speeds.max_warp_speed, 1.0);

    let none = resolve(1.0, &engines[..1], &context(SpatialLocation::Interplanetary, 1.0));
    assert_eq!(none.engine_index, None);
    assert_eq!(none.warp_speed, 0.0);
}

#[test]
fn interstellar_space_multiplies_speed() {
    let engines = [engine("drive", &[(0.0, 1.0)])];
    let speeds = resolve(1.0, &engines, &context(SpatialLocation::Interstellar, 1.0));
    assert_eq!(speeds.max_warp_speed, 10.0);
}

#[test]
fn planetary_space_is_damped_with_a_floor() {
    let mut drive = engine("drive", &[(0.0, 1.0)]);
    drive.planetary_soi_speed_curve = Curve::new([(0.0, 0.0), (1.0, 1.0)]).expect("curve");
    let engines = [drive];

    let mut ctx = context(SpatialLocation::Planetary, 1.0);
    ctx.planetary_altitude_ratio = 0.5;
    assert!((resolve(1.0, &engines, &ctx).max_warp_speed - 0.5).abs() < 1e-12);

    ctx.planetary_altitude_ratio = 0.0;
    assert_eq!(resolve(1.0, &engines, &ctx).max_warp_speed, 0.001);

    // No floor when the undamped speed is already zero.
    assert_eq!(resolve(-5.0, &[engine("dead", &[(0.0, 0.0)])], &ctx).max_warp_speed, 0.0);
}

#[test]
fn skill_bonus_applies_from_boost_rank() {
    let drive = engine("drive", &[(0.0, 1.0)]);
    assert_eq!(drive.skill_bonus(None), 1.0);
    assert_eq!(drive.skill_bonus(Some(4)), 1.0);
    assert!((drive.skill_bonus(Some(5)) - 1.25).abs() < 1e-12);

    let mut ctx = context(SpatialLocation::Interplanetary, 0.5);
    ctx.skill_bonus = drive.skill_bonus(Some(5));
    let speeds = resolve(1.0, &[drive], &ctx);
    assert!((speeds.max_warp_speed - 1.25).abs() < 1e-12);
    assert!((speeds.warp_speed - 0.625).abs() < 1e-12);
}
