//! Offline analysis of recorded trajectories

pub mod distance;
pub mod outcome;

pub use distance::{buffer_distances, pad_solved, trajectory_distances, DistanceCurve, DistanceSeries};
pub use outcome::{closing_remark, Outcome, OutcomeTally};
