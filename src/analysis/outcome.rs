//! Classify finished runs by how the environment described their ending
//!
//! Environments close a run with a sentence such as "The puzzle was solved"
//! or "You reached 50% of the goal". Only that closing remark is inspected.

use crate::core::error::{ReplayError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How far a run got, as reported by its closing remark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Solved,
    ThreeQuarters,
    Half,
    Quarter,
    Zero,
    Failure,
}

impl Outcome {
    /// Classify a run from its closing remark
    pub fn classify(run: &str) -> Outcome {
        let remark = closing_remark(run);
        if remark.contains("solution") || remark.contains("solved") {
            Outcome::Solved
        } else if remark.contains(" 0%") {
            Outcome::Zero
        } else if remark.contains("25%") {
            Outcome::Quarter
        } else if remark.contains("50%") {
            Outcome::Half
        } else if remark.contains("75%") {
            Outcome::ThreeQuarters
        } else {
            Outcome::Failure
        }
    }

    /// Fraction of the goal reached; failures carry no score
    pub fn score(self) -> Option<f64> {
        match self {
            Outcome::Solved => Some(1.0),
            Outcome::ThreeQuarters => Some(0.75),
            Outcome::Half => Some(0.5),
            Outcome::Quarter => Some(0.25),
            Outcome::Zero => Some(0.0),
            Outcome::Failure => None,
        }
    }
}

impl FromStr for Outcome {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "solved" => Ok(Self::Solved),
            "three_quarters" | "75%" => Ok(Self::ThreeQuarters),
            "half" | "50%" => Ok(Self::Half),
            "quarter" | "25%" => Ok(Self::Quarter),
            "zero" | "0%" => Ok(Self::Zero),
            "failure" | "failed" => Ok(Self::Failure),
            other => Err(ReplayError::ConfigError(format!("Unknown outcome: {}", other))),
        }
    }
}

/// The last sentence of a run
///
/// That is everything after the second-to-last `.`, `!` or `?`. A run with a
/// single mark is returned whole, and a run without any falls back to its
/// last 100 characters.
pub fn closing_remark(run: &str) -> &str {
    let run = run.trim();
    let ends: Vec<usize> = run
        .match_indices(|c: char| matches!(c, '.' | '!' | '?'))
        .map(|(i, mark)| i + mark.len())
        .collect();

    match ends.len() {
        0 => {
            let start = run.char_indices().rev().nth(99).map_or(0, |(i, _)| i);
            &run[start..]
        }
        1 => run,
        n => run[ends[n - 2]..].trim(),
    }
}

/// Count of runs per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTally {
    pub solved: u32,
    pub three_quarters: u32,
    pub half: u32,
    pub quarter: u32,
    pub zero: u32,
    pub failure: u32,
}

impl OutcomeTally {
    pub fn from_runs<'a, I>(runs: I) -> Self
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut tally = Self::default();
        for run in runs {
            tally.add(Outcome::classify(run));
        }
        tally
    }

    pub fn add(&mut self, outcome: Outcome) {
        *self.slot(outcome) += 1;
    }

    /// Remove one run of this outcome, e.g. a seeded example run
    pub fn discount(&mut self, outcome: Outcome) {
        let slot = self.slot(outcome);
        *slot = slot.saturating_sub(1);
    }

    pub fn count(&self, outcome: Outcome) -> u32 {
        match outcome {
            Outcome::Solved => self.solved,
            Outcome::ThreeQuarters => self.three_quarters,
            Outcome::Half => self.half,
            Outcome::Quarter => self.quarter,
            Outcome::Zero => self.zero,
            Outcome::Failure => self.failure,
        }
    }

    fn slot(&mut self, outcome: Outcome) -> &mut u32 {
        match outcome {
            Outcome::Solved => &mut self.solved,
            Outcome::ThreeQuarters => &mut self.three_quarters,
            Outcome::Half => &mut self.half,
            Outcome::Quarter => &mut self.quarter,
            Outcome::Zero => &mut self.zero,
            Outcome::Failure => &mut self.failure,
        }
    }

    pub fn total(&self) -> u32 {
        self.solved + self.three_quarters + self.half + self.quarter + self.zero + self.failure
    }

    /// Fraction of runs that were solved (0.0 for an empty tally)
    pub fn solve_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.solved as f64 / total as f64,
        }
    }

    /// One score per scored run, for rank-based comparisons between buffers
    pub fn scores(&self) -> Vec<f64> {
        [
            Outcome::Solved,
            Outcome::Quarter,
            Outcome::Half,
            Outcome::ThreeQuarters,
            Outcome::Zero,
        ]
        .into_iter()
        .flat_map(|outcome| {
            let score = outcome.score().unwrap_or(0.0);
            std::iter::repeat(score).take(self.count(outcome) as usize)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_remark_after_second_to_last_mark() {
        let run = "Moved A to C. Moved C to B! The game ended. You solved it.";
        assert_eq!(closing_remark(run), "You solved it.");
    }

    #[test]
    fn test_closing_remark_single_mark() {
        assert_eq!(closing_remark("  only one sentence.  "), "only one sentence.");
    }

    #[test]
    fn test_closing_remark_no_marks_takes_tail() {
        let run = "x".repeat(150);
        assert_eq!(closing_remark(&run).len(), 100);
        assert_eq!(closing_remark("short"), "short");
    }

    #[test]
    fn test_classify() {
        assert_eq!(Outcome::classify("Step. Step. Congratulations, puzzle solved!"), Outcome::Solved);
        assert_eq!(Outcome::classify("Step. Step. You found the solution."), Outcome::Solved);
        assert_eq!(Outcome::classify("Step. Step. Progress: 50% of disks."), Outcome::Half);
        assert_eq!(Outcome::classify("Step. Step. Progress: 0% of disks."), Outcome::Zero);
        assert_eq!(Outcome::classify("Step. Step. Reached 75% of the goal."), Outcome::ThreeQuarters);
        assert_eq!(Outcome::classify("Step. Step. Reached 25% of the goal."), Outcome::Quarter);
        assert_eq!(Outcome::classify("Step. Step. Invalid move."), Outcome::Failure);
    }

    #[test]
    fn test_only_closing_remark_counts() {
        // An early mention of "solved" does not make the run a success
        let run = "Nothing solved yet. Moved A to B. Ran out of turns.";
        assert_eq!(Outcome::classify(run), Outcome::Failure);
    }

    #[test]
    fn test_tally_and_scores() {
        let runs: Vec<String> = vec![
            "a. b. solved.".into(),
            "a. b. solved.".into(),
            "a. b. 50% done.".into(),
            "a. b. invalid.".into(),
        ];
        let tally = OutcomeTally::from_runs(&runs);
        assert_eq!(tally.solved, 2);
        assert_eq!(tally.half, 1);
        assert_eq!(tally.failure, 1);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.solve_rate(), 0.5);
        assert_eq!(tally.scores(), vec![1.0, 1.0, 0.5]);
    }

    #[test]
    fn test_discount_saturates() {
        let mut tally = OutcomeTally::default();
        tally.discount(Outcome::Solved);
        assert_eq!(tally.solved, 0);
        tally.add(Outcome::Solved);
        tally.discount(Outcome::Solved);
        assert_eq!(tally.solved, 0);
    }

    #[test]
    fn test_parse_outcome_names() {
        assert_eq!("solved".parse::<Outcome>().unwrap(), Outcome::Solved);
        assert_eq!("three-quarters".parse::<Outcome>().unwrap(), Outcome::ThreeQuarters);
        assert_eq!("50%".parse::<Outcome>().unwrap(), Outcome::Half);
        assert!("halfway".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_empty_tally() {
        let tally = OutcomeTally::default();
        assert_eq!(tally.solve_rate(), 0.0);
        assert!(tally.scores().is_empty());
    }
}
