//! Round-tripped part state.
//!
//! Only durable state is saved. Cruise locks, flameouts, and frame skip windows
//! are transient and start fresh after a load.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartState {
    Engine {
        id: String,
        ignited: bool,
    },
    Coil {
        id: String,
        is_active: bool,
        needs_maintenance: bool,
    },
    Generator {
        id: String,
        is_active: bool,
    },
}

impl PartState {
    pub fn id(&self) -> &str {
        match self {
            PartState::Engine { id, .. }
            | PartState::Coil { id, .. }
            | PartState::Generator { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselState {
    pub vessel: String,
    pub parts: Vec<PartState>,
}
