pub mod config;
pub mod error;

pub use config::{load_profile, GenerationConfig, KeepAlive, RunProfile};
pub use error::{ReplayError, Result};
