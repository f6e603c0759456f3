//! The repository report.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Instrument as _, info_span};

use crate::{
    github::GitHubApi,
    output::{ReportOutput, Table},
    paging::{Connection, paginate_optional},
    scope::{Scope, ScopeError, deny_users, resolve_accounts},
    state::{ReportError, ReportState},
};

const REPO_LIST_QUERY: &str = r#"
query RepoList($owner: String!, $page: String) {
  organization(login: $owner) {
    repositories(first: 100, after: $page) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name
        owner { login }
        visibility
        defaultBranchRef { name }
        isFork
        diskUsage
        createdAt
        updatedAt
      }
    }
  }
}
"#;

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all(deserialize = "UPPERCASE", serialize = "lowercase"))]
pub(crate) enum Visibility {
    Public,
    Private,
    Internal,
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[derive(Deserialize)]
struct RepoListData {
    organization: Option<RepoListOrganization>,
}

#[derive(Deserialize)]
struct RepoListOrganization {
    repositories: Connection<RepositoryNode>,
}

#[derive(Deserialize)]
struct OwnerNode {
    login: String,
}

#[derive(Deserialize)]
struct BranchRef {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    owner: OwnerNode,
    visibility: Visibility,
    /// `null` for empty repositories.
    default_branch_ref: Option<BranchRef>,
    is_fork: bool,
    /// In kilobytes; `null` if GitHub hasn't computed it yet.
    disk_usage: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize, Debug, PartialEq)]
struct RepositoryRow {
    owner: String,
    repo: String,
    visibility: Visibility,
    default_branch: String,
    fork: bool,
    disk: u64,
    created_at: String,
    updated_at: String,
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl From<RepositoryNode> for RepositoryRow {
    fn from(node: RepositoryNode) -> Self {
        Self {
            owner: node.owner.login,
            repo: node.name,
            visibility: node.visibility,
            default_branch: node
                .default_branch_ref
                .map(|branch| branch.name)
                .unwrap_or_default(),
            fork: node.is_fork,
            disk: node.disk_usage.unwrap_or_default(),
            created_at: timestamp(&node.created_at),
            updated_at: timestamp(&node.updated_at),
        }
    }
}

async fn list_repositories<C: GitHubApi>(
    state: &ReportState<C>,
    org: &str,
) -> Result<Vec<RepositoryNode>, ReportError> {
    let api = &state.api;

    paginate_optional(&format!("{org} repositories"), state.delay, |page| async move {
        let data: RepoListData = api
            .graphql("RepoList", REPO_LIST_QUERY, json!({"owner": org, "page": page}))
            .await?;

        Ok(data.organization.map(|found| found.repositories))
    })
    .await?
    .ok_or_else(|| ReportError::UnknownAccount(org.into()))
}

pub(crate) fn precheck(scope: &Scope) -> Result<(), ScopeError> {
    scope.deny_repository()?;
    Ok(())
}

/// Run the repository report, keeping only repositories of the given
/// visibility (if any).
pub(crate) async fn run<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
    visibility: Option<Visibility>,
) -> Result<ReportOutput, ReportError> {
    precheck(scope)?;

    let accounts = resolve_accounts(state, scope).await?;
    deny_users(&accounts)?;

    let mut rows: Vec<RepositoryRow> = vec![];
    for (idx, account) in accounts.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(state.delay).await;
        }

        let repositories = list_repositories(state, &account.login)
            .instrument(info_span!("repo", account = %account))
            .await?;

        tracing::info!(
            "{completed} {account}: {count} repositories",
            completed = "completed".green(),
            count = repositories.len(),
        );

        rows.extend(
            repositories
                .into_iter()
                .filter(|node| visibility.is_none_or(|wanted| node.visibility == wanted))
                .map(RepositoryRow::from),
        );
    }

    let mut table = Table::new([
        "owner",
        "repo",
        "visibility",
        "default_branch",
        "fork?",
        "disk",
        "created_at",
        "updated_at",
    ]);
    for row in &rows {
        table.push([
            row.owner.clone(),
            row.repo.clone(),
            row.visibility.to_string(),
            row.default_branch.clone(),
            row.fork.to_string(),
            row.disk.to_string(),
            row.created_at.clone(),
            row.updated_at.clone(),
        ]);
    }

    Ok(ReportOutput {
        summary: None,
        table,
        json: serde_json::to_value(&rows)?,
    })
}
