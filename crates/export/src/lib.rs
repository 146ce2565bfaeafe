//! Export helpers for CSV and JSON artifacts.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode or decode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub mod telemetry {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    use blueshift_drive::{TickReport, TravelOutcome};

    pub const HEADER: &str = "tick,universal_time_s,location,throttle,power_multiplier,total_capacity,total_displacement,effective_capacity,max_warp_speed_c,warp_speed_c,driving_engine,cruise_state,travelled_m,frame_skipped,flameout";

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One telemetry row per tick.
    #[derive(Debug, Clone)]
    pub struct Record<'a> {
        pub tick: usize,
        pub report: &'a TickReport,
    }

    impl<'a> Record<'a> {
        pub fn new(tick: usize, report: &'a TickReport) -> Self {
            Self { tick, report }
        }

        /// Serialize the record to CSV, matching [`HEADER`] ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            let report = self.report;
            let travelled_m = match report.travel {
                TravelOutcome::Travelled { distance_m } => distance_m,
                _ => 0.0,
            };
            writeln!(
                writer,
                "{},{:.3},{},{:.4},{:.6},{:.3},{:.3},{:.6},{:.6},{:.6},{},{},{:.3},{},{}",
                self.tick,
                report.universal_time,
                report.location,
                report.throttle,
                report.power_multiplier,
                report.total_capacity,
                report.total_displacement,
                report.effective_capacity,
                report.max_warp_speed,
                report.warp_speed,
                report.driving_engine.as_deref().unwrap_or(""),
                report.cruise_state,
                travelled_m,
                if report.frame_skipped { "true" } else { "false" },
                report.flameout.map(|reason| reason.tag()).unwrap_or(""),
            )
        }
    }
}

pub mod summary {
    use std::fs::{self, File};
    use std::path::Path;

    use blueshift_drive::{EngineEvent, TickReport, TravelOutcome};
    use serde::{Deserialize, Serialize};
    use serde_json::to_writer_pretty;

    use crate::ExportError;

    /// Aggregate figures for a whole run, written as a JSON sidecar.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct FlightSummary {
        pub vessel: String,
        pub ticks: usize,
        pub peak_warp_speed_c: f64,
        pub distance_travelled_m: f64,
        pub flameouts: usize,
        pub cruise_locks: usize,
        pub collisions_avoided: usize,
    }

    impl FlightSummary {
        pub fn new(vessel: &str) -> Self {
            Self {
                vessel: vessel.to_string(),
                ..Self::default()
            }
        }

        pub fn record(&mut self, report: &TickReport) {
            self.ticks += 1;
            self.peak_warp_speed_c = self.peak_warp_speed_c.max(report.warp_speed);
            match report.travel {
                TravelOutcome::Travelled { distance_m } => self.distance_travelled_m += distance_m,
                TravelOutcome::Locked { .. } => self.cruise_locks += 1,
                TravelOutcome::CollisionAvoided => self.collisions_avoided += 1,
                _ => {}
            }
            self.flameouts += report
                .events
                .iter()
                .filter(|event| matches!(event, EngineEvent::Flameout { .. }))
                .count();
        }

        pub fn from_reports<'a, I>(vessel: &str, reports: I) -> Self
        where
            I: IntoIterator<Item = &'a TickReport>,
        {
            let mut summary = Self::new(vessel);
            for report in reports {
                summary.record(report);
            }
            summary
        }
    }

    /// Write `<stem>_summary.json` next to the telemetry output and return its path.
    pub fn write_sidecar(
        output: &Path,
        summary: &FlightSummary,
    ) -> Result<std::path::PathBuf, ExportError> {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("telemetry");
        let path = parent.join(format!("{}_summary.json", stem));
        to_writer_pretty(File::create(&path)?, summary)?;
        Ok(path)
    }
}

pub mod state {
    use std::fs::{self, File};
    use std::io::BufReader;
    use std::path::Path;

    use blueshift_drive::VesselState;

    use crate::ExportError;

    pub fn save(path: &Path, state: &VesselState) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        serde_json::to_writer_pretty(File::create(path)?, state)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<VesselState, ExportError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
