//! The seam between the agent loop and a text game

use crate::core::error::Result;
use std::fmt;

/// What the environment shows the agent at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    /// Text new since the previous observation
    pub text: String,
    /// Commands the environment currently accepts, if it lists them
    pub admissible: Vec<String>,
}

impl Observation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            admissible: Vec::new(),
        }
    }

    pub fn with_admissible(mut self, commands: Vec<String>) -> Self {
        self.admissible = commands;
        self
    }
}

/// An action ready to be handed to an environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Free-form action text, e.g. `[A C]` or `go north`
    Text(String),
    /// An entry of a fixed action menu
    Indexed { index: usize, label: String },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Text(text) => f.write_str(text),
            Action::Indexed { label, .. } => f.write_str(label),
        }
    }
}

/// Result of a single step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
}

/// Final report once the environment is closed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentReport {
    pub reward: f64,
    /// Human-readable account of how the game ended
    pub reason: String,
}

/// A single-player text game
///
/// Observations are incremental: each one carries only what happened since
/// the previous one. Implementations are free to fail with
/// `ReplayError::EnvironmentError` on any call.
pub trait Environment {
    fn reset(&mut self) -> Result<Observation>;

    fn step(&mut self, action: &Action) -> Result<StepOutcome>;

    fn close(&mut self) -> Result<EnvironmentReport>;
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self) -> Result<Observation> {
        (**self).reset()
    }

    fn step(&mut self, action: &Action) -> Result<StepOutcome> {
        (**self).step(action)
    }

    fn close(&mut self) -> Result<EnvironmentReport> {
        (**self).close()
    }
}
