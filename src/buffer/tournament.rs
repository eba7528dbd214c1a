//! Pairwise tournament reduction of an oversized experience buffer
//!
//! A judge compares two trajectory records and names the one to keep. The
//! loser is dropped immediately, so reducing `m` records to `k` takes
//! exactly `m - k` comparisons no matter how the rounds fall.

use crate::core::error::Result;
use crate::llm::client::{RunningContext, TextGenerator};
use crate::llm::parser::parse_preference;
use rand::seq::SliceRandom;
use rand::Rng;

/// Which of two compared records survives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    First,
    Second,
}

/// Decides which of two trajectory records is worth keeping
#[allow(async_fn_in_trait)]
pub trait Judge {
    async fn prefer(&mut self, first: &str, second: &str) -> Result<Choice>;
}

/// Reduce `records` to `target` survivors by single-elimination comparisons
///
/// Each round shuffles the survivors, then walks adjacent pairs left to
/// right. After a comparison the loser is removed and the scan steps past
/// the winner, so the winner does not face the next record this round. The
/// scan stops as soon as `target` records remain.
///
/// Inputs already at or below `target` are returned unchanged without any
/// comparison. A `target` of zero yields an empty list, also without
/// comparisons.
pub async fn reduce_by_tournament<R, J>(
    records: Vec<String>,
    target: usize,
    rng: &mut R,
    judge: &mut J,
) -> Result<Vec<String>>
where
    R: Rng + ?Sized,
    J: Judge,
{
    let mut survivors = records;
    if survivors.len() <= target {
        return Ok(survivors);
    }
    if target == 0 {
        return Ok(Vec::new());
    }

    tracing::info!(
        "Starting tournament: reducing {} records to {}",
        survivors.len(),
        target
    );

    let mut round = 0;
    while survivors.len() > target {
        round += 1;
        survivors.shuffle(rng);

        let mut i = 0;
        while i + 1 < survivors.len() {
            if survivors.len() == target {
                break;
            }

            let choice = judge.prefer(&survivors[i], &survivors[i + 1]).await?;
            match choice {
                Choice::First => survivors.remove(i + 1),
                Choice::Second => survivors.remove(i),
            };
            i += 1;
        }

        tracing::debug!(round, remaining = survivors.len(), "tournament round done");
    }

    Ok(survivors)
}

/// A judge backed by a language model
///
/// Every comparison is a fresh conversation: no running context is
/// carried between comparisons.
pub struct LlmJudge<'a, G> {
    generator: &'a G,
    game: String,
    comparisons: usize,
}

impl<'a, G: TextGenerator> LlmJudge<'a, G> {
    pub fn new(generator: &'a G, game: impl Into<String>) -> Self {
        Self {
            generator,
            game: game.into(),
            comparisons: 0,
        }
    }

    /// Number of comparisons made so far
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    /// Build the comparison prompt for two replays
    pub fn prompt(&self, first: &str, second: &str) -> String {
        format!(
            "\nYou need to select between 2 options for trajectories you made while attempting to beat {game}.\n\
The one you select will be used later as a replay you will have access to while trying to beat the puzzle, the other will be discarded.\n\
So, you should select the replay that you think will be most beneficial to you for solving the puzzle.\n\
To select a replay please answer with either 1 or 2, 1 indicating that you would like to keep the first replay, 2 indicating that you would like to keep the second replay. Remember you can only select a single replay.\n\
\n\
Replay 1: \n{first}\nEnd of Replay 1\n\
Replay 2:\n{second}\nEnd of Replay 2\n\
Output strictly \"1\" or \"2\" indicating which replay you would prefer to keep.\n",
            game = self.game,
            first = first,
            second = second,
        )
    }
}

impl<'a, G: TextGenerator> Judge for LlmJudge<'a, G> {
    async fn prefer(&mut self, first: &str, second: &str) -> Result<Choice> {
        let prompt = self.prompt(first, second);
        tracing::debug!(prompt = %prompt, "asking judge");

        let reply = self
            .generator
            .generate(&prompt, &RunningContext::default())
            .await?;
        self.comparisons += 1;

        let trimmed = reply.text.trim();
        if trimmed != "1" && trimmed != "2" {
            tracing::warn!(reply = %trimmed, "judge reply was not a bare 1 or 2");
        }

        Ok(parse_preference(&reply.text))
    }
}
