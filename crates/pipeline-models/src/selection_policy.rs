//! Per-`(asset, artifact_type)` rule for which envelope(s) to surface when
//! multiple runs/profiles produced overlapping artifacts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::artifact::ModelProfile;
use crate::ids::RunId;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// No restriction — every envelope for the `(asset, type)` is returned.
    /// Intentional for multi-language analyses (`spec.md` §4.3).
    Default,
    /// Restrict to the most recent `run_id` for that `(asset, type)`.
    Latest,
    /// Restrict to `run_id == pinned_run_id`.
    Pinned { pinned_run_id: RunId },
    /// Restrict to `model_profile == preferred_profile`.
    Profile { preferred_profile: ModelProfile },
    /// Order by profile preference (high_quality > balanced > fast); see
    /// DESIGN.md Open Question 1 for the tie-break rule within a rank.
    BestQuality,
}

impl SelectionPolicy {
    pub fn mode_name(&self) -> &'static str {
        match self {
            SelectionPolicy::Default => "default",
            SelectionPolicy::Latest => "latest",
            SelectionPolicy::Pinned { .. } => "pinned",
            SelectionPolicy::Profile { .. } => "profile",
            SelectionPolicy::BestQuality => "best_quality",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_policy_carries_run_id() {
        let run_id = RunId::new();
        let policy = SelectionPolicy::Pinned { pinned_run_id: run_id };
        assert_eq!(policy.mode_name(), "pinned");
    }
}
