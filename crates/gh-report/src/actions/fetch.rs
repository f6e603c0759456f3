//! Repositories and their workflow files, fetched in one combined query.

use serde::Deserialize;
use serde_json::json;

use crate::{
    github::GitHubApi,
    paging::{Connection, paginate_optional},
    scope::Account,
    state::{ReportError, ReportState},
};

const ACTION_USES_QUERY: &str = r#"
query ActionUses($owner: String!, $page: String, $ref: String!) {
  repositoryOwner(login: $owner) {
    repositories(first: 10, after: $page, affiliations: OWNER, orderBy: {field: NAME, direction: DESC}) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name
        owner { login }
        isArchived
        isFork
        object(expression: $ref) {
          ... on Tree {
            entries {
              path
              name
              extension
              type
              object {
                ... on Blob { text byteSize isBinary isTruncated }
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// The workflow directory on each repository's default branch.
const WORKFLOWS_REF: &str = "HEAD:.github/workflows";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionUsesData {
    repository_owner: Option<RepositoryOwner>,
}

#[derive(Deserialize)]
struct RepositoryOwner {
    repositories: Connection<RepositorySnapshot>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Owner {
    pub(crate) login: String,
}

/// A repository as seen at query time.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositorySnapshot {
    pub(crate) name: String,
    pub(crate) owner: Owner,
    pub(crate) is_archived: bool,
    pub(crate) is_fork: bool,
    /// `null` when there's no workflow directory; an empty object when
    /// the path exists but isn't a directory.
    #[serde(default)]
    object: Option<Tree>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
struct Tree {
    #[serde(default)]
    entries: Vec<TreeEntry>,
}

/// One file (or directory) under the workflow directory.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct TreeEntry {
    pub(crate) path: String,
    #[serde(default)]
    pub(crate) extension: Option<String>,
    /// Empty for anything that isn't a blob.
    #[serde(default)]
    object: Option<Blob>,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Blob {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    is_binary: Option<bool>,
    #[serde(default)]
    is_truncated: Option<bool>,
}

impl RepositorySnapshot {
    pub(crate) fn workflow_entries(&self) -> &[TreeEntry] {
        self.object
            .as_ref()
            .map(|tree| tree.entries.as_slice())
            .unwrap_or_default()
    }

    /// Archived repositories, forks, and repositories without workflow
    /// files are never reported.
    pub(crate) fn is_reportable(&self) -> bool {
        !self.is_archived && !self.is_fork && !self.workflow_entries().is_empty()
    }

    pub(crate) fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name)
    }
}

impl TreeEntry {
    /// Whether this entry looks like a workflow definition.
    pub(crate) fn is_workflow(&self) -> bool {
        matches!(self.extension.as_deref(), Some(".yml" | ".yaml"))
    }

    /// This entry's complete contents, if it's a non-binary blob that
    /// GitHub didn't truncate.
    pub(crate) fn text(&self) -> Option<&str> {
        let blob = self.object.as_ref()?;

        if blob.is_binary == Some(true) || blob.is_truncated == Some(true) {
            return None;
        }

        blob.text.as_deref()
    }
}

/// Page through every repository owned by `account`, along with the
/// contents of each one's workflow directory.
pub(crate) async fn fetch_repositories<C: GitHubApi>(
    state: &ReportState<C>,
    account: &Account,
) -> Result<Vec<RepositorySnapshot>, ReportError> {
    let api = &state.api;
    let login = &account.login;

    let label = format!("{login} repositories");
    let repositories = paginate_optional(&label, state.delay, |page| async move {
        let data: ActionUsesData = api
            .graphql(
                "ActionUses",
                ACTION_USES_QUERY,
                json!({"owner": login, "page": page, "ref": WORKFLOWS_REF}),
            )
            .await?;

        Ok(data.repository_owner.map(|owner| owner.repositories))
    })
    .await?
    .ok_or_else(|| ReportError::UnknownAccount(login.clone()))?;

    tracing::debug!("{login} owns {} repositories", repositories.len());

    Ok(repositories)
}
