//! Experience buffer: storage, selection and prompt priming

pub mod priming;
pub mod selection;
pub mod store;
pub mod tournament;

pub use selection::{select_experiences, SelectionStrategy};
pub use store::ExperienceBuffer;
pub use tournament::{reduce_by_tournament, Choice, Judge, LlmJudge};
