//! Run configuration: generation settings and named run profiles
//!
//! Each experiment variant is described by a `RunProfile` loaded from
//! `data/profiles/{name}.toml`. Variants that differ only by model, step
//! limit or prompt pieces live side by side as separate profiles instead of
//! as copies of the run loop.

use crate::buffer::priming::RunLayout;
use crate::buffer::selection::SelectionStrategy;
use crate::core::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// How long the generation service keeps the model loaded after a call
///
/// Ollama accepts either a duration string ("3h") or a number of seconds,
/// where a negative number means "forever".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeepAlive {
    Seconds(i64),
    Duration(String),
}

/// Settings passed to every text-generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier as known to the generation service
    pub model: String,
    /// Maximum number of tokens allowed in the context window
    #[serde(default = "default_context_size")]
    pub context_size: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum number of generated tokens before the reply is cut off
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub keep_alive: Option<KeepAlive>,
}

fn default_context_size() -> u32 {
    40000
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    5000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "qwen3:4b".into(),
            context_size: default_context_size(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            keep_alive: None,
        }
    }
}

/// Which past runs are shown to the model before an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub strategy: SelectionStrategy,
    /// Number of past runs to keep in the prompt
    pub count: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Recent,
            count: 3,
        }
    }
}

/// Prompt pieces that vary between experiment variants
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Game name used by the tournament judge
    pub game: String,
    /// Text placed before the first observation of every episode
    pub preamble: String,
    /// Appended to every observation after the first, and to the first one
    /// too when `suffix_first_turn` is set
    pub turn_suffix: String,
    /// Also append `turn_suffix` to the opening prompt
    pub suffix_first_turn: bool,
    /// Placed between the experience block and the first observation, even
    /// when no past runs are shown
    pub prelude_tail: String,
    /// Layout of each past run inside the experience block
    pub run_layout: RunLayout,
    /// Text placed before the past runs
    pub buffer_header: String,
    /// Text placed after the past runs
    pub buffer_footer: String,
    /// Phrase in the first observation before which the experience block is
    /// inserted. Without it the block is prepended.
    pub anchor: Option<String>,
    /// Marker where gameplay starts in the first observation; the rules
    /// before it are not stored with the trajectory
    pub trajectory_start: Option<String>,
}

/// One curriculum stage: a name and the environment parameters it uses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(default)]
    pub params: toml::Table,
}

/// Staged training where each stage must be won a number of times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumConfig {
    pub stages: Vec<StageConfig>,
    pub wins_per_stage: u32,
    pub max_games_per_stage: u32,
    #[serde(default)]
    pub include_failed_runs: bool,
    #[serde(default)]
    pub clear_buffer_at_start: bool,
    #[serde(default)]
    pub success_header: String,
    #[serde(default)]
    pub failure_header: String,
}

/// Complete description of one experiment variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProfile {
    /// Name of this profile (set from filename)
    #[serde(default)]
    pub name: String,
    /// Environment identifier, e.g. "TowerOfHanoi-v0"
    pub env_id: String,
    #[serde(default = "default_episodes")]
    pub episodes: u32,
    /// Turn limit enforced by the environment itself
    #[serde(default)]
    pub max_turns: Option<u32>,
    /// Turn limit enforced by the agent loop
    #[serde(default)]
    pub step_limit: Option<u32>,
    #[serde(default)]
    pub num_disks: Option<u32>,
    #[serde(default)]
    pub selection: SelectionConfig,
    pub buffer_path: PathBuf,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub prompts: PromptConfig,
    #[serde(default)]
    pub curriculum: Option<CurriculumConfig>,
}

fn default_episodes() -> u32 {
    1
}

impl RunProfile {
    /// Parse a profile from TOML text and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let profile: RunProfile = toml::from_str(contents)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let generation = &self.generation;
        if generation.model.trim().is_empty() {
            return Err(ReplayError::ConfigError("model must not be empty".into()));
        }
        if generation.context_size == 0 {
            return Err(ReplayError::ConfigError(
                "context_size must be positive".into(),
            ));
        }
        if !generation.temperature.is_finite() || generation.temperature < 0.0 {
            return Err(ReplayError::ConfigError(format!(
                "temperature ({}) must be a non-negative number",
                generation.temperature
            )));
        }
        if generation.max_tokens == 0 {
            return Err(ReplayError::ConfigError("max_tokens must be positive".into()));
        }

        if self.selection.count == 0 {
            return Err(ReplayError::ConfigError(
                "selection.count must be positive".into(),
            ));
        }
        if self.step_limit == Some(0) {
            return Err(ReplayError::ConfigError("step_limit must be positive".into()));
        }

        match &self.curriculum {
            Some(curriculum) => {
                if curriculum.stages.is_empty() {
                    return Err(ReplayError::ConfigError(
                        "curriculum needs at least one stage".into(),
                    ));
                }
                if curriculum.wins_per_stage == 0 {
                    return Err(ReplayError::ConfigError(
                        "wins_per_stage must be positive".into(),
                    ));
                }
                if curriculum.max_games_per_stage < curriculum.wins_per_stage {
                    return Err(ReplayError::ConfigError(format!(
                        "max_games_per_stage ({}) should be >= wins_per_stage ({})",
                        curriculum.max_games_per_stage, curriculum.wins_per_stage
                    )));
                }
            }
            None => {
                if self.episodes == 0 {
                    return Err(ReplayError::ConfigError("episodes must be positive".into()));
                }
            }
        }

        Ok(())
    }
}

/// Load a run profile from TOML
///
/// Loads from `data/profiles/{name}.toml`
pub fn load_profile(name: &str) -> Result<RunProfile> {
    let path = profile_path(name);

    let contents = fs::read_to_string(&path).map_err(|e| {
        ReplayError::ConfigError(format!("Failed to read profile {:?}: {}", path, e))
    })?;

    let mut profile = RunProfile::from_toml_str(&contents)?;
    profile.name = name.to_string();
    Ok(profile)
}

/// Get path to profile file
fn profile_path(name: &str) -> PathBuf {
    PathBuf::from("data/profiles").join(format!("{}.toml", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
env_id = "TowerOfHanoi-v0"
buffer_path = "caches/hanoi.json"

[generation]
model = "qwen3:4b"
"#;

    #[test]
    fn test_default_generation_config() {
        let config = GenerationConfig::default();
        assert_eq!(config.context_size, 40000);
        assert_eq!(config.temperature, 0.5);
        assert!(config.keep_alive.is_none());
    }

    #[test]
    fn test_minimal_profile_uses_defaults() {
        let profile = RunProfile::from_toml_str(MINIMAL).unwrap();
        assert_eq!(profile.episodes, 1);
        assert_eq!(profile.selection.strategy, SelectionStrategy::Recent);
        assert_eq!(profile.selection.count, 3);
        assert_eq!(profile.generation.max_tokens, 5000);
        assert!(profile.curriculum.is_none());
    }

    #[test]
    fn test_keep_alive_accepts_string_and_number() {
        let text = format!("{}keep_alive = \"3h\"\n", MINIMAL);
        let profile = RunProfile::from_toml_str(&text).unwrap();
        assert_eq!(
            profile.generation.keep_alive,
            Some(KeepAlive::Duration("3h".into()))
        );

        let text = format!("{}keep_alive = -1\n", MINIMAL);
        let profile = RunProfile::from_toml_str(&text).unwrap();
        assert_eq!(profile.generation.keep_alive, Some(KeepAlive::Seconds(-1)));
    }

    #[test]
    fn test_negative_temperature_rejected() {
        let text = format!("{}temperature = -0.1\n", MINIMAL);
        let err = RunProfile::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ReplayError::ConfigError(_)));
    }

    #[test]
    fn test_zero_selection_count_rejected() {
        let mut profile = RunProfile::from_toml_str(MINIMAL).unwrap();
        profile.selection.count = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_curriculum_game_budget_checked() {
        let mut profile = RunProfile::from_toml_str(MINIMAL).unwrap();
        profile.curriculum = Some(CurriculumConfig {
            stages: vec![StageConfig {
                name: "goto".into(),
                params: toml::Table::new(),
            }],
            wins_per_stage: 5,
            max_games_per_stage: 2,
            include_failed_runs: false,
            clear_buffer_at_start: true,
            success_header: String::new(),
            failure_header: String::new(),
        });
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_load_shipped_profiles() {
        for name in [
            "hanoi_llm_replay",
            "hanoi_recent",
            "rush_hour_recent",
            "babyai_train",
            "babyai_curriculum",
        ] {
            let profile = load_profile(name).expect("Should load shipped profile");
            assert_eq!(profile.name, name);
        }
    }

    #[test]
    fn test_babyai_profiles_prompt_every_turn() {
        for name in ["babyai_train", "babyai_curriculum"] {
            let prompts = load_profile(name).unwrap().prompts;
            assert!(prompts.suffix_first_turn);
            assert_eq!(prompts.prelude_tail, "\nThe game begins now. ");
        }
        assert!(!load_profile("hanoi_recent").unwrap().prompts.suffix_first_turn);
    }

    #[test]
    fn test_load_missing_profile() {
        let err = load_profile("does_not_exist").unwrap_err();
        assert!(matches!(err, ReplayError::ConfigError(_)));
    }
}
