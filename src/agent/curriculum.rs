//! Staged training gated on wins per stage
//!
//! Stages run in order. A stage ends once it has been won often enough or
//! its game budget is spent; a stage that is never won ends the curriculum.
//! Every stored run is shown to the model before each game.

use crate::agent::action::formatter_for;
use crate::agent::environment::Environment;
use crate::agent::episode::{run_episode, EpisodeSettings};
use crate::buffer::priming::{compose_experience, RunLayout};
use crate::buffer::store::ExperienceBuffer;
use crate::core::config::{RunProfile, StageConfig};
use crate::core::error::{ReplayError, Result};
use crate::llm::client::TextGenerator;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    pub name: String,
    pub games: u32,
    pub wins: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurriculumReport {
    pub stages: Vec<StageReport>,
    /// A stage was never won and the later stages were skipped
    pub stopped_early: bool,
    pub buffer_len: usize,
}

/// Run every stage of `profile.curriculum`
///
/// `make_env` builds a fresh environment for a stage's parameters before
/// each game. The buffer is written back once at the end, including after
/// an early stop.
pub async fn run_curriculum<G, E, F>(
    generator: &G,
    profile: &RunProfile,
    buffer: &mut ExperienceBuffer,
    mut make_env: F,
) -> Result<CurriculumReport>
where
    G: TextGenerator,
    E: Environment,
    F: FnMut(&StageConfig) -> Result<E>,
{
    let curriculum = profile.curriculum.as_ref().ok_or_else(|| {
        ReplayError::ConfigError(format!("profile {} has no curriculum", profile.name))
    })?;
    let formatter = formatter_for(&profile.env_id)?;
    let prompts = &profile.prompts;

    if curriculum.clear_buffer_at_start {
        buffer.clear();
    }

    let mut report = CurriculumReport::default();

    for (index, stage) in curriculum.stages.iter().enumerate() {
        tracing::info!(stage = index + 1, name = %stage.name, "Curriculum stage");

        let mut wins = 0;
        let mut games = 0;
        while wins < curriculum.wins_per_stage && games < curriculum.max_games_per_stage {
            let experience = compose_experience(
                buffer.records(),
                RunLayout::Tagged,
                &prompts.buffer_header,
                &prompts.buffer_footer,
            );
            let settings = EpisodeSettings::from_prompts(prompts, profile.step_limit)
                .with_experience(experience);

            let mut env = make_env(stage)?;
            let record = run_episode(generator, &mut env, formatter.as_ref(), &settings).await?;
            games += 1;

            if record.solved() {
                wins += 1;
                buffer.push(format!("{}{}", curriculum.success_header, record.trajectory()));
            } else if curriculum.include_failed_runs {
                buffer.push(format!("{}{}", curriculum.failure_header, record.trajectory()));
            }

            tracing::info!(
                stage = %stage.name,
                game = games,
                wins,
                solved = record.solved(),
                "Game finished"
            );
        }

        report.stages.push(StageReport {
            name: stage.name.clone(),
            games,
            wins,
        });

        if wins == 0 {
            tracing::warn!(stage = %stage.name, games, "Stage never won, exiting early");
            report.stopped_early = index + 1 < curriculum.stages.len();
            break;
        }
    }

    buffer.save()?;
    report.buffer_len = buffer.len();
    Ok(report)
}
