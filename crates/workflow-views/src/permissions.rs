//! The "permissions" view of a workflow.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::common::{Permissions, null_to_default};

/// A workflow, as seen by its `permissions:` blocks.
#[derive(Deserialize, Debug, Default)]
pub struct PermissionsView {
    #[serde(default)]
    pub permissions: Option<Permissions>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub jobs: IndexMap<String, JobPermissions>,
}

impl PermissionsView {
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Every declared `permissions:` block: the workflow's own first,
    /// then each job's, in source order.
    pub fn declared(&self) -> impl Iterator<Item = &Permissions> {
        self.permissions
            .iter()
            .chain(self.jobs.values().filter_map(|job| job.permissions.as_ref()))
    }
}

/// A single job, as seen by its `permissions:` block.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct JobPermissions {
    #[serde(default)]
    pub permissions: Option<Permissions>,
}
