use blueshift_config::ConfigError;
use blueshift_orbits::OrbitError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("invalid session settings: {0}")]
    Settings(#[from] ConfigError),
    #[error(transparent)]
    Bodies(#[from] OrbitError),
    #[error("vessel has no engine `{0}`")]
    UnknownEngine(String),
    #[error("saved state does not match vessel `{vessel}`: {message}")]
    StateMismatch { vessel: String, message: String },
}
