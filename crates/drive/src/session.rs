//! Per-game-session context shared by every vessel tick.

use blueshift_config::{CelestialBodyConfig, WarpSettings};
use blueshift_orbits::{BodyCatalog, SoiTable, SpatialLocation, VesselPosition, classify};

use crate::error::DriveError;

/// Settings plus the star boundary table, built once and passed to each tick.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: WarpSettings,
    pub catalog: BodyCatalog,
    soi: SoiTable,
}

impl Session {
    pub fn new(settings: WarpSettings, catalog: BodyCatalog) -> Result<Self, DriveError> {
        settings.validate()?;
        Ok(Self {
            settings,
            catalog,
            soi: SoiTable::new(),
        })
    }

    pub fn from_config(
        settings: WarpSettings,
        bodies: &[CelestialBodyConfig],
    ) -> Result<Self, DriveError> {
        let catalog = BodyCatalog::from_config(bodies)?;
        Self::new(settings, catalog)
    }

    pub fn soi_table(&self) -> &SoiTable {
        &self.soi
    }

    pub fn classify(&mut self, position: &VesselPosition<'_>) -> SpatialLocation {
        classify(position, &self.catalog, &mut self.soi, &self.settings)
    }

    /// Radius of `body`, or zero when it is not in the catalog.
    pub fn body_radius(&self, body: &str) -> f64 {
        self.catalog.get(body).map_or(0.0, |body| body.radius_m)
    }

    /// Altitude over the body's own sphere of influence.
    pub fn planetary_altitude_ratio(&self, body: &str, altitude_m: f64) -> f64 {
        match self.catalog.get(body) {
            Some(body) if body.soi_radius_m > 0.0 => altitude_m / body.soi_radius_m,
            _ => 0.0,
        }
    }
}

