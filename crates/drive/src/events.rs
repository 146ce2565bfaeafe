//! Engine transition notifications and their subscribers.

use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;

use crate::flameout::FlameoutReason;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EngineEvent {
    Started {
        engine: String,
    },
    Shutdown {
        engine: String,
    },
    Flameout {
        engine: String,
        reason: FlameoutReason,
    },
    Unflameout {
        engine: String,
    },
    /// Effects were driven manually because the host suppresses them while cruise-locked.
    EffectsUpdated {
        engine: String,
        throttle: f64,
        intensity: f64,
    },
}

impl EngineEvent {
    pub fn engine(&self) -> &str {
        match self {
            EngineEvent::Started { engine }
            | EngineEvent::Shutdown { engine }
            | EngineEvent::Flameout { engine, .. }
            | EngineEvent::Unflameout { engine }
            | EngineEvent::EffectsUpdated { engine, .. } => engine,
        }
    }
}

/// Subscriber for engine events (animated textures, particle drivers, loggers).
pub trait EngineObserver {
    fn on_engine_event(&mut self, event: &EngineEvent);
}

/// Observer that keeps every event it sees.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<EngineEvent>,
}

impl EngineObserver for EventLog {
    fn on_engine_event(&mut self, event: &EngineEvent) {
        self.events.push(event.clone());
    }
}

/// Shared observers stay readable by whoever registered them.
impl<T: EngineObserver> EngineObserver for Rc<RefCell<T>> {
    fn on_engine_event(&mut self, event: &EngineEvent) {
        self.borrow_mut().on_engine_event(event);
    }
}
