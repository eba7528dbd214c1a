//! Turn model replies into environment actions
//!
//! Each environment family expects its own action syntax. A formatter is
//! picked once per run from the environment id and applied to every reply.
//! A reply that maps to no legal action is an error; there is no retry.

use crate::agent::environment::{Action, Observation};
use crate::core::error::{ReplayError, Result};
use crate::llm::parser::{isolated_letter_pairs, vehicle_move};

/// Converts a free-form model reply into an action
pub trait ActionFormatter {
    fn format(&self, reply: &str, observation: &Observation) -> Result<Action>;
}

/// Tower of Hanoi: a single pair of peg letters such as `A C`
#[derive(Debug, Clone, Copy, Default)]
pub struct LetterPairMove;

impl ActionFormatter for LetterPairMove {
    fn format(&self, reply: &str, _observation: &Observation) -> Result<Action> {
        match isolated_letter_pairs(reply).as_slice() {
            [pair] => Ok(Action::Text(format!("[{} {}]", pair.from, pair.to))),
            [] => Err(ReplayError::InvalidAction(format!(
                "no peg pair in reply: {:?}",
                reply
            ))),
            pairs => Err(ReplayError::InvalidAction(format!(
                "{} peg pairs in reply, expected one: {:?}",
                pairs.len(),
                reply
            ))),
        }
    }
}

/// Rush Hour: `MOVE: X+` or `MOVE: X-`
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleMove;

impl ActionFormatter for VehicleMove {
    fn format(&self, reply: &str, _observation: &Observation) -> Result<Action> {
        let (vehicle, direction) = vehicle_move(reply).ok_or_else(|| {
            ReplayError::InvalidAction(format!("no vehicle move in reply: {:?}", reply))
        })?;
        Ok(Action::Text(format!("[{}{}]", vehicle, direction)))
    }
}

/// A fixed menu of actions, addressed by index
///
/// The first menu entry, in menu order, that appears anywhere in the reply
/// is chosen.
#[derive(Debug, Clone)]
pub struct ActionMenu {
    options: Vec<String>,
}

impl ActionMenu {
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    /// The BabyAI action set
    pub fn babyai() -> Self {
        Self::new([
            "turn left",
            "turn right",
            "go forward",
            "pick up",
            "drop",
            "toggle",
        ])
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl ActionFormatter for ActionMenu {
    fn format(&self, reply: &str, _observation: &Observation) -> Result<Action> {
        self.options
            .iter()
            .enumerate()
            .find(|(_, option)| reply.contains(option.as_str()))
            .map(|(index, option)| Action::Indexed {
                index,
                label: option.clone(),
            })
            .ok_or_else(|| ReplayError::InvalidAction(format!("invalid action selection: {:?}", reply)))
    }
}

/// TextWorld: the reply must be one of the commands the game lists
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissibleCommand;

impl ActionFormatter for AdmissibleCommand {
    fn format(&self, reply: &str, observation: &Observation) -> Result<Action> {
        let reply = reply.trim();
        if observation.admissible.iter().any(|command| command == reply) {
            Ok(Action::Text(reply.to_string()))
        } else {
            Err(ReplayError::InvalidAction(format!(
                "model did not provide a possible action, instead it gave: {:?}",
                reply
            )))
        }
    }
}

/// Pick the formatter for an environment id
pub fn formatter_for(env_id: &str) -> Result<Box<dyn ActionFormatter>> {
    if env_id.contains("TowerOfHanoi") {
        Ok(Box::new(LetterPairMove))
    } else if env_id.contains("RushHour") {
        Ok(Box::new(VehicleMove))
    } else if env_id.contains("BabyAI") {
        Ok(Box::new(ActionMenu::babyai()))
    } else if env_id.starts_with("tw-") || env_id.to_lowercase().contains("textworld") {
        Ok(Box::new(AdmissibleCommand))
    } else {
        Err(ReplayError::UnknownEnvironment(env_id.to_string()))
    }
}
