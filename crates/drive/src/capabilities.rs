//! Optional collaborators injected at construction time.
//!
//! A missing capability is a no-op: the core never probes for sibling systems.

/// Tracks coil wear. When present, it decides each coil's maintenance flag every tick.
pub trait MaintenanceProvider {
    fn needs_maintenance(&mut self, coil_id: &str, universal_time: f64) -> bool;
}

/// Drives throttle-dependent visual effects for an engine.
pub trait EffectDriver {
    fn drive(&mut self, engine_id: &str, throttle: f64, intensity: f64);
}

#[derive(Default)]
pub struct Capabilities {
    pub maintenance: Option<Box<dyn MaintenanceProvider>>,
    pub effects: Option<Box<dyn EffectDriver>>,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_maintenance(mut self, provider: Box<dyn MaintenanceProvider>) -> Self {
        self.maintenance = Some(provider);
        self
    }

    pub fn with_effects(mut self, driver: Box<dyn EffectDriver>) -> Self {
        self.effects = Some(driver);
        self
    }

    pub(crate) fn needs_maintenance(
        &mut self,
        coil_id: &str,
        universal_time: f64,
    ) -> Option<bool> {
        self.maintenance
            .as_mut()
            .map(|provider| provider.needs_maintenance(coil_id, universal_time))
    }

    pub(crate) fn drive_effects(&mut self, engine_id: &str, throttle: f64, intensity: f64) {
        if let Some(driver) = self.effects.as_mut() {
            driver.drive(engine_id, throttle, intensity);
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("maintenance", &self.maintenance.is_some())
            .field("effects", &self.effects.is_some())
            .finish()
    }
}

/// Coils fall due for maintenance once universal time passes their scheduled time.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceSchedule {
    due: Vec<(String, f64)>,
}

impl MaintenanceSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(mut self, coil_id: &str, due_at: f64) -> Self {
        self.due.push((coil_id.to_string(), due_at));
        self
    }
}

impl MaintenanceProvider for MaintenanceSchedule {
    fn needs_maintenance(&mut self, coil_id: &str, universal_time: f64) -> bool {
        self.due
            .iter()
            .any(|(id, due_at)| id == coil_id && universal_time >= *due_at)
    }
}
