//! The "jobs" view of a workflow.
//!
//! This view knows about `jobs.<id>.uses` and `jobs.<id>.steps[*].uses`
//! and nothing else; every other key is ignored.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::common::null_to_default;

/// A workflow, as seen by its jobs.
#[derive(Deserialize, Debug, Default)]
pub struct JobsView {
    #[serde(default, deserialize_with = "null_to_default")]
    pub jobs: IndexMap<String, Job>,
}

impl JobsView {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Every non-empty `uses:` in this workflow, in source order.
    pub fn uses(&self) -> impl Iterator<Item = &str> {
        self.jobs.values().flat_map(Job::uses)
    }
}

#[derive(Deserialize)]
struct RawJob {
    #[serde(default)]
    uses: Option<String>,
    #[serde(default)]
    steps: Option<Vec<Step>>,
}

/// A single job.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(from = "RawJob")]
pub enum Job {
    /// A "normal" job, made of steps.
    Steps(Vec<Step>),
    /// A job that calls a reusable workflow.
    Reusable(String),
    /// Both `uses:` and `steps:`. GitHub rejects this, and nothing is
    /// extracted from it.
    Ambiguous { uses: String, steps: Vec<Step> },
    /// Neither `uses:` nor `steps:`.
    Empty,
}

impl From<RawJob> for Job {
    fn from(raw: RawJob) -> Self {
        match (raw.uses, raw.steps) {
            (Some(uses), Some(steps)) => Self::Ambiguous { uses, steps },
            (Some(uses), None) => Self::Reusable(uses),
            (None, Some(steps)) => Self::Steps(steps),
            (None, None) => Self::Empty,
        }
    }
}

impl Job {
    /// The non-empty `uses:` clauses in this job.
    pub fn uses(&self) -> Vec<&str> {
        match self {
            Self::Steps(steps) => steps
                .iter()
                .filter_map(|step| step.uses.as_deref())
                .filter(|uses| !uses.is_empty())
                .collect(),
            Self::Reusable(uses) if !uses.is_empty() => vec![uses.as_str()],
            _ => vec![],
        }
    }
}

/// A single step. Only `uses:` is retained.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct Step {
    #[serde(default)]
    pub uses: Option<String>,
}
