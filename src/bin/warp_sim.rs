use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use blueshift::config::{WarpSettings, load_bodies, load_settings, load_vessels};
use blueshift::export::{state, summary, telemetry};
use blueshift::sandbox::Simulation;
use clap::Parser;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Run a warp vessel through the control loop in a sandbox host"
)]
struct Cli {
    /// Session settings (TOML); defaults apply when omitted
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Celestial body catalog (YAML list or directory of TOML files)
    #[arg(long, default_value = "configs/bodies.yaml")]
    bodies: PathBuf,

    /// Vessel catalog (YAML list or directory of TOML files)
    #[arg(long, default_value = "configs/vessels.yaml")]
    vessels: PathBuf,

    /// Vessel name (defaults to the first vessel in the catalog)
    #[arg(long)]
    vessel: Option<String>,

    /// Starting main body
    #[arg(long, default_value = "Kerbin")]
    body: String,

    /// Starting altitude above the main body in meters
    #[arg(long, default_value_t = 2_000_000.0)]
    altitude: f64,

    /// Warp throttle in [0, 1]
    #[arg(long, default_value_t = 1.0)]
    throttle: f64,

    /// Number of physics ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: usize,

    /// Physics tick length in seconds
    #[arg(long, default_value_t = 0.02)]
    dt: f64,

    /// Tick at which the host enters time acceleration
    #[arg(long)]
    time_warp_from: Option<usize>,

    /// Time acceleration rate used once time warp starts
    #[arg(long, default_value_t = 100.0)]
    warp_rate: f64,

    /// Per-tick telemetry CSV (`-` for stdout); a JSON summary is written alongside
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Save the vessel's part state as JSON after the run
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Debug-level logging
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.settings {
        Some(path) => load_settings(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => WarpSettings::default(),
    };
    let bodies = load_bodies(&cli.bodies)
        .with_context(|| format!("loading bodies from {}", cli.bodies.display()))?;
    let vessels = load_vessels(&cli.vessels)
        .with_context(|| format!("loading vessels from {}", cli.vessels.display()))?;
    let vessel = Simulation::select(&vessels, cli.vessel.as_deref())?;

    let mut sim = Simulation::new(settings, &bodies, vessel, &cli.body, cli.altitude)?;
    sim.host.delta_time = cli.dt;
    sim.host.throttle = cli.throttle.clamp(0.0, 1.0);
    sim.activate_all_engines()?;

    let mut reports = Vec::with_capacity(cli.ticks);
    for tick in 0..cli.ticks {
        if cli.time_warp_from == Some(tick) {
            tracing::info!(tick, rate = cli.warp_rate, "entering time acceleration");
            sim.host.warp_rate = cli.warp_rate;
        }
        reports.push(sim.step());
    }

    let flight = summary::FlightSummary::from_reports(&vessel.name, &reports);

    if let Some(path) = &cli.csv {
        let mut writer = telemetry::writer_for_path(path)?;
        telemetry::write_header(writer.as_mut())?;
        for (tick, report) in reports.iter().enumerate() {
            telemetry::Record::new(tick, report).write_to(writer.as_mut())?;
        }
        writer.flush()?;
        if path != Path::new("-") {
            let sidecar = summary::write_sidecar(path, &flight)?;
            tracing::info!(path = %sidecar.display(), "wrote flight summary");
        }
    }

    if let Some(path) = &cli.save_state {
        state::save(path, &sim.vessel.save_state())?;
    }

    if cli.csv.as_deref() == Some(Path::new("-")) {
        return Ok(());
    }

    let last = reports.last();
    println!("Vessel         : {}", vessel.name);
    println!("Main body      : {}", sim.host.main_body);
    println!(
        "Location       : {}",
        last.map(|r| r.location.to_string()).unwrap_or_default()
    );
    println!("Ticks          : {}", flight.ticks);
    println!("Peak speed     : {:.6} c", flight.peak_warp_speed_c);
    println!("Distance       : {:.3} m", flight.distance_travelled_m);
    println!("Cruise locks   : {}", flight.cruise_locks);
    println!("Flameouts      : {}", flight.flameouts);
    for engine in sim.vessel.engines() {
        println!("Engine {:<8}: {}", engine.id, engine.status());
    }
    Ok(())
}
