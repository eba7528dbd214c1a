//! Choose which past trajectories are shown to the model

use crate::buffer::tournament::{reduce_by_tournament, Judge};
use crate::core::error::{ReplayError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How past runs are picked from the experience buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Uniform sample without replacement
    Random,
    /// The most recently stored runs
    Recent,
    /// Pairwise tournament judged by a language model
    #[serde(alias = "llm")]
    Tournament,
}

impl FromStr for SelectionStrategy {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "recent" => Ok(Self::Recent),
            "tournament" | "llm" => Ok(Self::Tournament),
            other => Err(ReplayError::ConfigError(format!(
                "Unknown selection strategy: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Random => "random",
            Self::Recent => "recent",
            Self::Tournament => "tournament",
        };
        f.write_str(name)
    }
}

/// Select up to `count` records with the given strategy
///
/// The tournament strategy needs a judge; without one this fails with
/// `ReplayError::MissingJudge`. The other strategies ignore the judge.
pub async fn select_experiences<R, J>(
    records: &[String],
    strategy: SelectionStrategy,
    count: usize,
    rng: &mut R,
    judge: Option<&mut J>,
) -> Result<Vec<String>>
where
    R: Rng + ?Sized,
    J: Judge,
{
    let selected = match strategy {
        SelectionStrategy::Random => {
            if records.len() < count {
                records.to_vec()
            } else {
                records.choose_multiple(rng, count).cloned().collect()
            }
        }
        SelectionStrategy::Recent => {
            let start = records.len().saturating_sub(count);
            records[start..].to_vec()
        }
        SelectionStrategy::Tournament => {
            let judge = judge.ok_or(ReplayError::MissingJudge)?;
            reduce_by_tournament(records.to_vec(), count, rng, judge).await?
        }
    };

    tracing::debug!(
        %strategy,
        available = records.len(),
        selected = selected.len(),
        "experience selection"
    );

    Ok(selected)
}
