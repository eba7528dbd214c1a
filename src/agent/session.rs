//! A profile-driven run of many episodes over one experience buffer

use crate::agent::action::formatter_for;
use crate::agent::environment::Environment;
use crate::agent::episode::{run_episode, EpisodeSettings};
use crate::buffer::priming::compose_experience;
use crate::buffer::selection::select_experiences;
use crate::buffer::store::ExperienceBuffer;
use crate::buffer::tournament::LlmJudge;
use crate::core::config::RunProfile;
use crate::core::error::Result;
use crate::llm::client::TextGenerator;
use rand::Rng;
use serde::Serialize;

/// Short account of one finished episode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: u32,
    pub steps: usize,
    pub reward: f64,
    pub solved: bool,
    /// Number of past runs shown in the first prompt
    pub experiences_used: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    pub episodes: Vec<EpisodeSummary>,
    /// Buffer size after the session
    pub buffer_len: usize,
}

impl SessionReport {
    pub fn solved(&self) -> usize {
        self.episodes.iter().filter(|e| e.solved).count()
    }
}

/// Play `profile.episodes` episodes, learning from the buffer as it grows
///
/// Before each episode past runs are selected with the profile's strategy
/// and shown to the model. Each finished trajectory is appended to the
/// buffer, which is written back once all episodes are done.
pub async fn run_session<G, E, F, R>(
    generator: &G,
    profile: &RunProfile,
    buffer: &mut ExperienceBuffer,
    mut make_env: F,
    rng: &mut R,
) -> Result<SessionReport>
where
    G: TextGenerator,
    E: Environment,
    F: FnMut(&RunProfile) -> Result<E>,
    R: Rng + ?Sized,
{
    let formatter = formatter_for(&profile.env_id)?;
    let prompts = &profile.prompts;
    let count = profile.selection.count;
    let mut report = SessionReport::default();

    tracing::info!(
        profile = %profile.name,
        env = %profile.env_id,
        episodes = profile.episodes,
        strategy = %profile.selection.strategy,
        buffered = buffer.len(),
        "Starting session"
    );

    for episode in 1..=profile.episodes {
        let mut judge = LlmJudge::new(generator, prompts.game.clone());
        let mut selected = select_experiences(
            buffer.records(),
            profile.selection.strategy,
            count,
            rng,
            Some(&mut judge),
        )
        .await?;
        if selected.len() > count {
            selected = selected.split_off(selected.len() - count);
        }
        tracing::info!(
            episode,
            selected = selected.len(),
            comparisons = judge.comparisons(),
            "Using past runs"
        );

        let experience = compose_experience(
            &selected,
            prompts.run_layout,
            &prompts.buffer_header,
            &prompts.buffer_footer,
        );
        let settings =
            EpisodeSettings::from_prompts(prompts, profile.step_limit).with_experience(experience);

        let mut env = make_env(profile)?;
        let record = run_episode(generator, &mut env, formatter.as_ref(), &settings).await?;

        report.episodes.push(EpisodeSummary {
            episode,
            steps: record.steps(),
            reward: record.reward,
            solved: record.solved(),
            experiences_used: selected.len(),
        });
        buffer.push(record.trajectory());
    }

    buffer.save()?;
    report.buffer_len = buffer.len();

    tracing::info!(
        solved = report.solved(),
        episodes = report.episodes.len(),
        buffer_len = report.buffer_len,
        "Session complete"
    );

    Ok(report)
}
