//! Score a model against a frozen experience buffer
//!
//! Unlike a session, evaluation never writes to the buffer: the same block
//! of past runs primes every episode, or none at all for a baseline. Each
//! episode gets its own environment seed so runs with and without a buffer
//! face the same games.

use crate::agent::action::formatter_for;
use crate::agent::environment::Environment;
use crate::agent::episode::{run_episode, EpisodeSettings};
use crate::agent::session::EpisodeSummary;
use crate::buffer::priming::compose_experience;
use crate::buffer::selection::select_experiences;
use crate::buffer::store::ExperienceBuffer;
use crate::buffer::tournament::LlmJudge;
use crate::core::config::RunProfile;
use crate::core::error::Result;
use crate::llm::client::TextGenerator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub episodes: Vec<EpisodeSummary>,
    /// Environment seed of each episode, in order
    pub seeds: Vec<u64>,
    pub wins: usize,
}

impl EvaluationReport {
    pub fn win_rate(&self) -> f64 {
        if self.episodes.is_empty() {
            0.0
        } else {
            self.wins as f64 / self.episodes.len() as f64
        }
    }
}

/// Play `profile.episodes` seeded episodes without touching the buffer
///
/// Episode `i` (from zero) is played in the environment built for seed
/// `base_seed + i`. Past runs are picked once, with the profile's strategy,
/// and shown in every episode.
pub async fn run_evaluation<G, E, F>(
    generator: &G,
    profile: &RunProfile,
    buffer: Option<&ExperienceBuffer>,
    base_seed: u64,
    mut make_env: F,
) -> Result<EvaluationReport>
where
    G: TextGenerator,
    E: Environment,
    F: FnMut(&RunProfile, u64) -> Result<E>,
{
    let formatter = formatter_for(&profile.env_id)?;
    let prompts = &profile.prompts;
    let count = profile.selection.count;

    let mut selected = match buffer {
        Some(buffer) => {
            let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
            let mut judge = LlmJudge::new(generator, prompts.game.clone());
            select_experiences(
                buffer.records(),
                profile.selection.strategy,
                count,
                &mut rng,
                Some(&mut judge),
            )
            .await?
        }
        None => Vec::new(),
    };
    if selected.len() > count {
        selected = selected.split_off(selected.len() - count);
    }
    let experience = compose_experience(
        &selected,
        prompts.run_layout,
        &prompts.buffer_header,
        &prompts.buffer_footer,
    );
    let settings =
        EpisodeSettings::from_prompts(prompts, profile.step_limit).with_experience(experience);

    tracing::info!(
        profile = %profile.name,
        episodes = profile.episodes,
        base_seed,
        experiences = selected.len(),
        "Starting evaluation"
    );

    let mut report = EvaluationReport::default();
    for (i, episode) in (1..=profile.episodes).enumerate() {
        let seed = base_seed + i as u64;
        let mut env = make_env(profile, seed)?;
        let record = run_episode(generator, &mut env, formatter.as_ref(), &settings).await?;
        tracing::info!(episode, seed, solved = record.solved(), "Evaluation episode done");

        if record.solved() {
            report.wins += 1;
        }
        report.seeds.push(seed);
        report.episodes.push(EpisodeSummary {
            episode,
            steps: record.steps(),
            reward: record.reward,
            solved: record.solved(),
            experiences_used: selected.len(),
        });
    }

    tracing::info!(
        wins = report.wins,
        episodes = report.episodes.len(),
        win_rate = report.win_rate(),
        "Evaluation complete"
    );

    Ok(report)
}
