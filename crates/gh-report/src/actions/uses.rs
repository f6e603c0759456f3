//! Third-party action references.

use std::fmt::Display;

use itertools::Itertools as _;
use serde::Serialize;
use workflow_views::{ActionRef, JobsView};

/// Decides which `uses:` clauses make it into a report.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AuthorshipFilter {
    exclude_github_authored: bool,
}

impl AuthorshipFilter {
    pub(crate) fn new(exclude_github_authored: bool) -> Self {
        Self {
            exclude_github_authored,
        }
    }

    /// With exclusion on, actions under the `actions/` and `github/`
    /// namespaces are filtered out. Everything else always passes.
    pub(crate) fn should_include(&self, uses: &str) -> bool {
        !self.exclude_github_authored
            || !(uses.starts_with("actions/") || uses.starts_with("github/"))
    }
}

/// One normalized action reference.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ActionUsage {
    pub(crate) action: String,
    /// Empty when the reference isn't pinned.
    pub(crate) version: String,
    #[serde(rename = "url")]
    pub(crate) source_url: String,
}

impl ActionUsage {
    /// Normalize `uses`, as found in `owner/repo`.
    ///
    /// Local actions (`./path`) resolve to a tree URL inside the calling
    /// repository; everything else to a tree URL at the pinned version,
    /// or at `HEAD` when unpinned.
    pub(crate) fn new(uses: &str, owner: &str, repo: &str) -> Self {
        let parsed = ActionRef::parse(uses);

        let source_url = match parsed.local_path() {
            Some(path) => format!("https://github.com/{owner}/{repo}/tree/HEAD/{path}"),
            None => format!(
                "https://github.com/{action}/tree/{version}",
                action = parsed.action,
                version = parsed.version.unwrap_or("HEAD"),
            ),
        };

        Self {
            action: parsed.action.into(),
            version: parsed.version.unwrap_or_default().into(),
            source_url,
        }
    }
}

impl Display for ActionUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.action, self.version)
    }
}

/// Every action used in `jobs` that passes `filter`, deduplicated by
/// action and version in first-seen order.
pub(crate) fn extract_action_usages(
    jobs: &JobsView,
    filter: AuthorshipFilter,
    owner: &str,
    repo: &str,
) -> Vec<ActionUsage> {
    jobs.uses()
        .filter(|uses| filter.should_include(uses))
        .map(|uses| ActionUsage::new(uses, owner, repo))
        .unique_by(|usage| (usage.action.clone(), usage.version.clone()))
        .collect()
}
