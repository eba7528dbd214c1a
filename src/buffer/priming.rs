//! Render selected past runs into the experience block of a prompt

use crate::analysis::outcome::closing_remark;
use serde::{Deserialize, Serialize};

/// How each past run is laid out inside the experience block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunLayout {
    /// Runs joined by newlines, nothing added
    #[default]
    Plain,
    /// Each run opens with a one-line recap of how it ended
    Summarized,
    /// Each run wrapped in numbered `<run i>` tags
    Tagged,
}

/// Build the experience block, or `None` when there are no runs to show
pub fn compose_experience(
    runs: &[String],
    layout: RunLayout,
    header: &str,
    footer: &str,
) -> Option<String> {
    if runs.is_empty() {
        return None;
    }

    let body = match layout {
        RunLayout::Plain => runs.join("\n"),
        RunLayout::Summarized => runs
            .iter()
            .map(|run| {
                let run = run.trim();
                format!(
                    "[Start of run]\nDuring this run: {}\n\n{}\n[End of run]",
                    closing_remark(run),
                    run
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        RunLayout::Tagged => runs
            .iter()
            .enumerate()
            .map(|(i, run)| format!("<run {n}>\n{run}\n<run {n}>\n", n = i + 1, run = run))
            .collect(),
    };

    Some(format!("{}{}{}", header, body, footer))
}

/// Place the experience block in front of `anchor` inside `observation`
///
/// Falls back to putting the block at the start when the anchor is absent.
pub fn insert_before_anchor(observation: &str, block: &str, anchor: Option<&str>) -> String {
    if let Some(anchor) = anchor {
        if observation.contains(anchor) {
            return observation.replacen(anchor, &format!("{}\n\n{}", block, anchor), 1);
        }
    }
    format!("{}\n\n{}", block, observation)
}
