//! Reading workflow files through both structural views.

use workflow_views::{JobsView, PermissionsView};

/// A workflow file, as seen through each view that could read it.
#[derive(Debug, Default)]
pub(crate) struct ParsedWorkflow {
    pub(crate) jobs: Option<JobsView>,
    pub(crate) permissions: Option<PermissionsView>,
}

impl ParsedWorkflow {
    /// Parse `contents` through each view independently.
    ///
    /// A view that can't read the file is left empty, with a warning
    /// naming `repo` and `path`.
    pub(crate) fn parse(repo: &str, path: &str, contents: &str) -> Self {
        let jobs = JobsView::from_yaml(contents)
            .inspect_err(|err| tracing::warn!("{repo}: couldn't read jobs in {path}: {err}"))
            .ok();

        let permissions = PermissionsView::from_yaml(contents)
            .inspect_err(|err| {
                tracing::warn!("{repo}: couldn't read permissions in {path}: {err}")
            })
            .ok();

        Self { jobs, permissions }
    }

    /// Whether neither view could read the file.
    pub(crate) fn is_unreadable(&self) -> bool {
        self.jobs.is_none() && self.permissions.is_none()
    }
}
