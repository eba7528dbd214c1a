//! Distance-to-solution series for Tower-of-Hanoi trajectories
//!
//! Every board snapshot in a trajectory is scored with the optimal number
//! of moves still needed. A series per trajectory shows whether play is
//! converging; averaging many series gives a curve per experiment.

use crate::hanoi::board::{extract_snapshots, Board, Peg};
use crate::hanoi::solver::solution_distance;
use serde::Serialize;

/// One distance per snapshot; `None` where the snapshot could not be scored
pub type DistanceSeries = Vec<Option<u64>>;

/// Distances for every board snapshot in one trajectory, in log order
pub fn trajectory_distances(run: &str, disks: u32, target: Peg) -> DistanceSeries {
    extract_snapshots(run)
        .into_iter()
        .map(|snapshot| solution_distance(&Board::parse(snapshot), disks, target))
        .collect()
}

/// Distance series for every trajectory in a buffer
pub fn buffer_distances(runs: &[String], disks: u32, target: Peg) -> Vec<DistanceSeries> {
    runs.iter()
        .map(|run| trajectory_distances(run, disks, target))
        .collect()
}

/// Align series to a common length
///
/// A series that ends solved is padded with zeros up to `horizon`. Only
/// series of exactly `horizon` entries are kept, so unfinished runs that
/// stopped early drop out.
pub fn pad_solved(series: Vec<DistanceSeries>, horizon: usize) -> Vec<DistanceSeries> {
    series
        .into_iter()
        .filter_map(|mut s| {
            if s.last() == Some(&Some(0)) && s.len() < horizon {
                s.resize(horizon, Some(0));
            }
            (s.len() == horizon).then_some(s)
        })
        .collect()
}

/// Per-step mean and spread across aligned series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceCurve {
    pub mean: Vec<f64>,
    /// Population standard deviation at each step
    pub std_dev: Vec<f64>,
    /// Number of series averaged
    pub samples: usize,
}

impl DistanceCurve {
    /// Average the series step by step, up to the shortest one
    ///
    /// Unscored snapshots count as infinitely far from the solution.
    /// Returns `None` when there is nothing to average.
    pub fn from_series(series: &[DistanceSeries]) -> Option<Self> {
        let steps = series.iter().map(Vec::len).min()?;
        let n = series.len() as f64;

        let mut mean = Vec::with_capacity(steps);
        let mut std_dev = Vec::with_capacity(steps);
        for step in 0..steps {
            let values: Vec<f64> = series
                .iter()
                .map(|s| s[step].map_or(f64::INFINITY, |d| d as f64))
                .collect();
            let m = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            mean.push(m);
            std_dev.push(variance.sqrt());
        }

        Some(Self {
            mean,
            std_dev,
            samples: series.len(),
        })
    }

    /// Mean plus one standard deviation
    pub fn upper(&self) -> Vec<f64> {
        self.mean.iter().zip(&self.std_dev).map(|(m, s)| m + s).collect()
    }

    /// Mean minus one standard deviation
    pub fn lower(&self) -> Vec<f64> {
        self.mean.iter().zip(&self.std_dev).map(|(m, s)| m - s).collect()
    }
}
