//! The agent loop: episodes, sessions, evaluations and curricula over text games

pub mod action;
pub mod curriculum;
pub mod environment;
pub mod episode;
pub mod evaluation;
pub mod session;
pub mod transcript;

pub use action::{formatter_for, ActionFormatter};
pub use curriculum::{run_curriculum, CurriculumReport, StageReport};
pub use environment::{Action, Environment, EnvironmentReport, Observation, StepOutcome};
pub use episode::{run_episode, EpisodeRecord, EpisodeSettings};
pub use evaluation::{run_evaluation, EvaluationReport};
pub use session::{run_session, EpisodeSummary, SessionReport};
pub use transcript::{Transcript, Turn};
