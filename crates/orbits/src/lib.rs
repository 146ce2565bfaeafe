//! Celestial body hierarchy, star spheres of influence, and spatial location classification.

use std::collections::HashMap;
use std::fmt;

use blueshift_config::{CelestialBodyConfig, WarpSettings};
use blueshift_core::vector::{self, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where a vessel is relative to the star/planet hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SpatialLocation {
    #[default]
    Unknown,
    Planetary,
    Interplanetary,
    Interstellar,
}

impl fmt::Display for SpatialLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SpatialLocation::Unknown => "Unknown",
            SpatialLocation::Planetary => "Planetary",
            SpatialLocation::Interplanetary => "Interplanetary",
            SpatialLocation::Interstellar => "Interstellar",
        };
        f.write_str(label)
    }
}

/// Host-reported vessel situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Situation {
    Prelaunch,
    Landed,
    Splashed,
    Flying,
    SubOrbital,
    Orbiting,
    Escaping,
    Docked,
}

impl Situation {
    /// Sub-orbital, orbiting, or escaping.
    pub fn is_in_space(self) -> bool {
        matches!(
            self,
            Situation::SubOrbital | Situation::Orbiting | Situation::Escaping
        )
    }
}

/// A star, planet, or moon.
#[derive(Debug, Clone, PartialEq)]
pub struct CelestialBody {
    pub name: String,
    pub is_star: bool,
    pub parent: Option<String>,
    pub radius_m: f64,
    pub semi_major_axis_m: Option<f64>,
    /// The body's own gravitational sphere of influence.
    pub soi_radius_m: f64,
}

impl From<&CelestialBodyConfig> for CelestialBody {
    fn from(config: &CelestialBodyConfig) -> Self {
        Self {
            name: config.name.clone(),
            is_star: config.is_star,
            parent: config.parent.clone(),
            radius_m: config.radius_m,
            semi_major_axis_m: config.semi_major_axis_m,
            soi_radius_m: config.soi_radius_m,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OrbitError {
    #[error("body `{0}` is defined more than once")]
    DuplicateBody(String),
    #[error("body `{body}` references unknown parent `{parent}`")]
    UnknownParent { body: String, parent: String },
    #[error("body `{0}` is part of a cyclic parent chain")]
    CyclicHierarchy(String),
}

/// Validated body hierarchy indexed by name.
#[derive(Debug, Clone, Default)]
pub struct BodyCatalog {
    bodies: Vec<CelestialBody>,
    index: HashMap<String, usize>,
}

impl BodyCatalog {
    pub fn new(bodies: Vec<CelestialBody>) -> Result<Self, OrbitError> {
        let mut index = HashMap::with_capacity(bodies.len());
        for (i, body) in bodies.iter().enumerate() {
            if index.insert(body.name.clone(), i).is_some() {
                return Err(OrbitError::DuplicateBody(body.name.clone()));
            }
        }
        for body in &bodies {
            if let Some(parent) = &body.parent {
                if !index.contains_key(parent) {
                    return Err(OrbitError::UnknownParent {
                        body: body.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let catalog = Self { bodies, index };
        for body in &catalog.bodies {
            let mut current = body;
            for _ in 0..=catalog.bodies.len() {
                match catalog.parent_of(current) {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            if catalog.parent_of(current).is_some() {
                return Err(OrbitError::CyclicHierarchy(body.name.clone()));
            }
        }
        Ok(catalog)
    }

    pub fn from_config(configs: &[CelestialBodyConfig]) -> Result<Self, OrbitError> {
        Self::new(configs.iter().map(CelestialBody::from).collect())
    }

    pub fn get(&self, name: &str) -> Option<&CelestialBody> {
        self.index.get(name).map(|&i| &self.bodies[i])
    }

    pub fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    pub fn parent_of(&self, body: &CelestialBody) -> Option<&CelestialBody> {
        body.parent.as_deref().and_then(|name| self.get(name))
    }

    /// Bodies whose direct parent is `name`, in catalog order.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a CelestialBody> + 'a {
        self.bodies
            .iter()
            .filter(move |body| body.parent.as_deref() == Some(name))
    }

    /// The nearest star above `body` in the hierarchy; a star is its own parent star.
    pub fn parent_star<'a>(&'a self, body: &'a CelestialBody) -> Option<&'a CelestialBody> {
        let mut current = body;
        loop {
            if current.is_star {
                return Some(current);
            }
            current = self.parent_of(current)?;
        }
    }
}

/// Per-star interstellar boundary radii, computed once per session.
#[derive(Debug, Clone, Default)]
pub struct SoiTable {
    radii: HashMap<String, Option<f64>>,
}

impl SoiTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The star's boundary radius, computing and recording it on first use.
    ///
    /// Blacklisted stars have no boundary.
    pub fn radius_for(
        &mut self,
        star: &CelestialBody,
        catalog: &BodyCatalog,
        settings: &WarpSettings,
    ) -> Option<f64> {
        if let Some(radius) = self.radii.get(&star.name) {
            return *radius;
        }
        let radius = compute_star_soi(star, catalog, settings);
        tracing::debug!(star = %star.name, radius_m = ?radius, "recorded star sphere of influence");
        self.radii.insert(star.name.clone(), radius);
        radius
    }

    /// Previously recorded radius, without computing.
    pub fn recorded(&self, star: &str) -> Option<f64> {
        self.radii.get(star).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

/// Outermost non-blacklisted planet's semi-major axis × `soi_multiplier`, or, for a
/// star without planets, its radius × `no_planets_soi_multiplier` × `soi_multiplier`.
pub fn compute_star_soi(
    star: &CelestialBody,
    catalog: &BodyCatalog,
    settings: &WarpSettings,
) -> Option<f64> {
    if settings.is_blacklisted(&star.name) {
        return None;
    }

    let furthest = catalog
        .children(&star.name)
        .filter(|body| !body.is_star && !settings.is_blacklisted(&body.name))
        .filter_map(|body| body.semi_major_axis_m)
        .filter(|sma| sma.is_finite() && *sma > 0.0)
        .fold(None, |best: Option<f64>, sma| {
            Some(best.map_or(sma, |current| current.max(sma)))
        });

    Some(match furthest {
        Some(sma) => sma * settings.soi_multiplier,
        None => star.radius_m * settings.no_planets_soi_multiplier * settings.soi_multiplier,
    })
}

/// Inputs to spatial classification.
#[derive(Debug, Clone, Copy)]
pub struct VesselPosition<'a> {
    pub situation: Situation,
    pub main_body: &'a str,
    pub altitude_m: f64,
}

/// Categorize a vessel's position.
pub fn classify(
    position: &VesselPosition<'_>,
    catalog: &BodyCatalog,
    soi: &mut SoiTable,
    settings: &WarpSettings,
) -> SpatialLocation {
    if !position.situation.is_in_space() {
        return SpatialLocation::Unknown;
    }
    let Some(body) = catalog.get(position.main_body) else {
        tracing::debug!(body = position.main_body, "main body missing from catalog");
        return SpatialLocation::Unknown;
    };

    if body.is_star {
        return match soi.radius_for(body, catalog, settings) {
            Some(radius) if position.altitude_m <= radius => SpatialLocation::Interplanetary,
            _ => SpatialLocation::Interstellar,
        };
    }

    let Some(star) = catalog.parent_star(body) else {
        return SpatialLocation::Interstellar;
    };
    if settings.is_blacklisted(&star.name) || soi.radius_for(star, catalog, settings).is_none() {
        return SpatialLocation::Interstellar;
    }
    SpatialLocation::Planetary
}

/// Whether `point` lies within a sphere of `radius_m` around `center`.
pub fn is_inside_body(point: &Vector3, center: &Vector3, radius_m: f64) -> bool {
    vector::distance(point, center) < radius_m
}
