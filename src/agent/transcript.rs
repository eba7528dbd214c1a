//! Append-only record of an episode's turns

use serde::{Deserialize, Serialize};

/// One exchange: what the agent saw, what the model said, what was played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub observation: String,
    pub reply: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turns recorded at or after `index`
    pub fn since(&self, index: usize) -> &[Turn] {
        self.turns.get(index..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the game as stored in the experience buffer
    ///
    /// Each turn shows its observation followed by the action played. When
    /// `start_marker` occurs in the first observation, everything before it
    /// (typically the rules) is left out.
    pub fn render(&self, start_marker: Option<&str>) -> String {
        let mut text = String::new();
        for (i, turn) in self.turns.iter().enumerate() {
            let mut observation = turn.observation.as_str();
            if i == 0 {
                if let Some(offset) = start_marker.and_then(|m| observation.find(m)) {
                    observation = &observation[offset..];
                }
            }
            text.push_str(observation.trim_end());
            text.push('\n');
            text.push_str(&turn.action);
            text.push('\n');
        }
        text
    }
}
