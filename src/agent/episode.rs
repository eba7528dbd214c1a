//! Play one episode: prompt the model, format its reply, step the game
//!
//! The model sees the game as one continuous conversation. Each call hands
//! back the running context from the previous one, so later prompts only
//! carry the new observation.

use crate::agent::action::ActionFormatter;
use crate::agent::environment::{Environment, Observation};
use crate::agent::transcript::{Transcript, Turn};
use crate::buffer::priming::insert_before_anchor;
use crate::core::config::PromptConfig;
use crate::core::error::Result;
use crate::llm::client::{RunningContext, TextGenerator};

/// Prompt pieces and limits for a single episode
#[derive(Debug, Clone, Default)]
pub struct EpisodeSettings {
    /// Maximum number of model turns; `None` leaves it to the environment
    pub step_limit: Option<u32>,
    pub preamble: String,
    /// Appended to every observation after the first, and to the first one
    /// too when `suffix_first_turn` is set
    pub turn_suffix: String,
    pub suffix_first_turn: bool,
    /// Always placed right before the first observation
    pub prelude_tail: String,
    /// Rendered past runs, shown once in the first prompt
    pub experience: Option<String>,
    pub anchor: Option<String>,
    pub trajectory_start: Option<String>,
}

impl EpisodeSettings {
    pub fn from_prompts(prompts: &PromptConfig, step_limit: Option<u32>) -> Self {
        Self {
            step_limit,
            preamble: prompts.preamble.clone(),
            turn_suffix: prompts.turn_suffix.clone(),
            suffix_first_turn: prompts.suffix_first_turn,
            prelude_tail: prompts.prelude_tail.clone(),
            experience: None,
            anchor: prompts.anchor.clone(),
            trajectory_start: prompts.trajectory_start.clone(),
        }
    }

    pub fn with_experience(mut self, experience: Option<String>) -> Self {
        self.experience = experience;
        self
    }

    /// The opening prompt: preamble, experience, prelude tail, then the
    /// first observation
    ///
    /// With an anchor the experience block goes before it inside the
    /// observation instead.
    pub fn first_prompt(&self, observation: &str) -> String {
        let mut prompt = self.preamble.clone();
        let body = match (&self.experience, &self.anchor) {
            (Some(block), Some(anchor)) => insert_before_anchor(observation, block, Some(anchor)),
            (Some(block), None) => {
                prompt.push_str(block);
                observation.to_string()
            }
            (None, _) => observation.to_string(),
        };
        prompt.push_str(&self.prelude_tail);
        prompt.push_str(&body);
        if self.suffix_first_turn {
            prompt.push_str(&self.turn_suffix);
        }
        prompt
    }

    pub fn turn_prompt(&self, observation: &str) -> String {
        format!("{}{}", observation, self.turn_suffix)
    }
}

/// Everything that happened in one finished episode
#[derive(Debug, Clone, Default)]
pub struct EpisodeRecord {
    pub transcript: Transcript,
    /// Observation returned by the last step, never shown to the model
    pub final_observation: String,
    /// Final reward reported when the environment closed
    pub reward: f64,
    /// Whether the environment ended the game (as opposed to the step limit)
    pub done: bool,
    /// Closing reason reported by the environment
    pub reason: String,
    /// Where gameplay starts in the first observation
    trajectory_start: Option<String>,
}

impl EpisodeRecord {
    pub fn steps(&self) -> usize {
        self.transcript.len()
    }

    /// The game ended on its own with a positive reward
    pub fn solved(&self) -> bool {
        self.done && self.reward > 0.0
    }

    /// The text stored in the experience buffer
    pub fn trajectory(&self) -> String {
        let mut text = self.transcript.render(self.trajectory_start.as_deref());
        let last = self.final_observation.trim();
        if !last.is_empty() {
            text.push_str(last);
            text.push('\n');
        }
        text.push_str(&self.reason);
        text
    }
}

/// Play one episode to completion or to the step limit
///
/// A reply that cannot be turned into an action aborts the episode with
/// `ReplayError::InvalidAction`. The environment is closed either way.
pub async fn run_episode<G, E>(
    generator: &G,
    env: &mut E,
    formatter: &dyn ActionFormatter,
    settings: &EpisodeSettings,
) -> Result<EpisodeRecord>
where
    G: TextGenerator,
    E: Environment + ?Sized,
{
    let observation = env.reset()?;
    let played = play_turns(generator, env, formatter, settings, observation).await;
    let closed = env.close();

    let (transcript, observation, done) = match played {
        Ok(turns) => turns,
        Err(e) => {
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "failed to close environment after aborted episode");
            }
            return Err(e);
        }
    };
    let report = closed?;
    tracing::info!(
        steps = transcript.len(),
        reward = report.reward,
        done,
        "episode finished"
    );

    Ok(EpisodeRecord {
        transcript,
        final_observation: observation.text,
        reward: report.reward,
        done,
        reason: report.reason,
        trajectory_start: settings.trajectory_start.clone(),
    })
}

/// The turn loop; returns the transcript, the last observation and whether
/// the environment ended the game
async fn play_turns<G, E>(
    generator: &G,
    env: &mut E,
    formatter: &dyn ActionFormatter,
    settings: &EpisodeSettings,
    mut observation: Observation,
) -> Result<(Transcript, Observation, bool)>
where
    G: TextGenerator,
    E: Environment + ?Sized,
{
    let mut context = RunningContext::default();
    let mut transcript = Transcript::new();
    let mut done = false;

    while !done {
        if let Some(limit) = settings.step_limit {
            if transcript.len() >= limit as usize {
                tracing::info!(limit, "step limit reached");
                break;
            }
        }

        let prompt = if transcript.is_empty() {
            settings.first_prompt(&observation.text)
        } else {
            settings.turn_prompt(&observation.text)
        };
        tracing::debug!(
            turn = transcript.len(),
            context_len = context.len(),
            prompt = %prompt,
            "prompting model"
        );

        let generation = generator.generate(&prompt, &context).await?;
        context = generation.context;
        tracing::debug!(reply = %generation.text, "model replied");

        let action = formatter.format(&generation.text, &observation)?;
        tracing::debug!(%action, "formatted action");

        let outcome = env.step(&action)?;
        transcript.push(Turn {
            observation: std::mem::take(&mut observation.text),
            reply: generation.text,
            action: action.to_string(),
        });

        observation = outcome.observation;
        done = outcome.done;
    }

    Ok((transcript, observation, done))
}
