//! Faster-than-light warp engine control loop.
//!
//! - [`host`] - adapter traits the host simulation implements
//! - [`session`] - settings and star boundaries shared by every tick
//! - [`speed`] - warp speed resolution
//! - [`flameout`] - ignition gating
//! - [`cruise`] - real-time travel and the cruise lock used during time acceleration
//! - [`engine`] - warp engines and driving-engine arbitration
//! - [`vessel`] - per-tick orchestration across a vessel's parts
//! - [`events`], [`capabilities`] - notifications and optional collaborators
//! - [`persist`] - durable part state

pub mod capabilities;
pub mod cruise;
pub mod engine;
pub mod error;
pub mod events;
pub mod flameout;
pub mod frame_skip;
pub mod host;
pub mod persist;
pub mod session;
pub mod speed;
pub mod vessel;

pub use capabilities::{Capabilities, EffectDriver, MaintenanceProvider, MaintenanceSchedule};
pub use cruise::{
    CruiseController, CruiseLock, CruiseState, TravelContext, TravelOutcome, UnlockReason,
};
pub use engine::{EngineSnapshot, EngineStatus, WarpEngine, arbitrate, has_driving_peer_ahead};
pub use error::DriveError;
pub use events::{EngineEvent, EngineObserver, EventLog};
pub use flameout::{FlameoutReason, FlameoutState, FlameoutTransition, IgnitionGates};
pub use frame_skip::FrameSkip;
pub use host::{FlightControls, Host, OrbitMutator, TimeSource, VesselQuery, on_rails};
pub use persist::{PartState, VesselState};
pub use session::Session;
pub use speed::{SpeedContext, WarpSpeeds};
pub use vessel::{TickReport, WarpVessel};
