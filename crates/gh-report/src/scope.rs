//! Report scopes, and their resolution into accounts.

use std::fmt::Display;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    github::GitHubApi,
    paging::{Connection, paginate_optional},
    state::{ReportError, ReportState},
};

/// Errors in the requested scope of a report.
///
/// These are always detected before any network access, except for
/// [`ScopeError::UserUnsupported`], which needs an account-type lookup.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ScopeError {
    #[error("no scope given: use one of --enterprise, --owner or --repo")]
    Missing,
    #[error("only one of --enterprise, --owner or --repo may be given")]
    Conflicting,
    #[error("invalid repository {0:?}: expected OWNER/REPO")]
    MalformedRepository(String),
    #[error("repository not supported for this report")]
    RepositoryUnsupported,
    #[error("owner not supported for this report")]
    OwnerUnsupported,
    #[error("{0} is a user account, which is not supported for this report")]
    UserUnsupported(String),
    #[error("--enterprise is required for this report")]
    EnterpriseRequired,
    #[error("GitHub Enterprise Server is not supported for this report")]
    ServerUnsupported,
}

/// What a report runs against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Scope {
    Enterprise(String),
    Owner(String),
    Repository { owner: String, repo: String },
}

impl Scope {
    pub(crate) fn new(
        enterprise: Option<&str>,
        owner: Option<&str>,
        repo: Option<&str>,
    ) -> Result<Self, ScopeError> {
        match (enterprise, owner, repo) {
            (Some(enterprise), None, None) => Ok(Self::Enterprise(enterprise.into())),
            (None, Some(owner), None) => Ok(Self::Owner(owner.into())),
            (None, None, Some(slug)) => match slug.split_once('/') {
                Some((owner, repo))
                    if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
                {
                    Ok(Self::Repository {
                        owner: owner.into(),
                        repo: repo.into(),
                    })
                }
                _ => Err(ScopeError::MalformedRepository(slug.into())),
            },
            (None, None, None) => Err(ScopeError::Missing),
            _ => Err(ScopeError::Conflicting),
        }
    }

    /// Reject a repository scope.
    pub(crate) fn deny_repository(&self) -> Result<&Self, ScopeError> {
        match self {
            Self::Repository { .. } => Err(ScopeError::RepositoryUnsupported),
            _ => Ok(self),
        }
    }

    /// The enterprise slug, for reports that only run against one.
    pub(crate) fn require_enterprise(&self) -> Result<&str, ScopeError> {
        match self {
            Self::Enterprise(enterprise) => Ok(enterprise),
            Self::Owner(_) => Err(ScopeError::OwnerUnsupported),
            Self::Repository { .. } => Err(ScopeError::RepositoryUnsupported),
        }
    }
}

/// The kind of a GitHub account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AccountKind {
    Enterprise,
    Organization,
    User,
}

impl AccountKind {
    /// Classify the `type` field of a `users/{login}` response.
    pub(crate) fn from_user_type(ty: &str) -> Self {
        match ty {
            "Organization" => Self::Organization,
            _ => Self::User,
        }
    }

    /// The REST API path segment for accounts of this kind.
    pub(crate) fn api_prefix(&self) -> &'static str {
        match self {
            Self::Enterprise => "enterprises",
            Self::Organization => "orgs",
            Self::User => "users",
        }
    }
}

/// An enterprise, organization or user under report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Account {
    pub(crate) login: String,
    pub(crate) kind: AccountKind,
}

impl Account {
    pub(crate) fn enterprise(slug: impl Into<String>) -> Self {
        Self {
            login: slug.into(),
            kind: AccountKind::Enterprise,
        }
    }

    pub(crate) fn organization(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            kind: AccountKind::Organization,
        }
    }

    /// The REST API path of this account, e.g. `orgs/octo-org`.
    pub(crate) fn api_path(&self) -> String {
        format!("{}/{}", self.kind.api_prefix(), self.login)
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.login)
    }
}

const ORG_LIST_QUERY: &str = r#"
query OrgList($enterprise: String!, $page: String) {
  enterprise(slug: $enterprise) {
    organizations(first: 100, after: $page, orderBy: {field: LOGIN, direction: ASC}) {
      pageInfo { hasNextPage endCursor }
      nodes { login }
    }
  }
}
"#;

#[derive(Deserialize)]
struct OrgListData {
    enterprise: Option<OrgListEnterprise>,
}

#[derive(Deserialize)]
struct OrgListEnterprise {
    organizations: Connection<OrgNode>,
}

#[derive(Deserialize)]
struct OrgNode {
    login: String,
}

#[derive(Deserialize)]
struct UserInfo {
    #[serde(rename = "type")]
    account_type: String,
}

/// Expand an enterprise into its organizations, or classify a single
/// owner as an organization or user.
///
/// Repository scopes are rejected; reports that support them handle
/// them before resolving.
pub(crate) async fn resolve_accounts<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
) -> Result<Vec<Account>, ReportError> {
    match scope {
        Scope::Enterprise(enterprise) => {
            let api = &state.api;

            let orgs = paginate_optional(
                &format!("{enterprise} organizations"),
                state.delay,
                |page| async move {
                    let data: OrgListData = api
                        .graphql(
                            "OrgList",
                            ORG_LIST_QUERY,
                            json!({"enterprise": enterprise, "page": page}),
                        )
                        .await?;

                    Ok(data.enterprise.map(|found| found.organizations))
                },
            )
            .await?
            .ok_or_else(|| ReportError::UnknownEnterprise(enterprise.clone()))?;

            tracing::debug!("{enterprise} has {} organizations", orgs.len());

            Ok(orgs
                .into_iter()
                .map(|org| Account::organization(org.login))
                .collect())
        }
        Scope::Owner(owner) => {
            let info: UserInfo = state.api.rest(&format!("users/{owner}")).await?;

            Ok(vec![Account {
                login: owner.clone(),
                kind: AccountKind::from_user_type(&info.account_type),
            }])
        }
        Scope::Repository { .. } => Err(ScopeError::RepositoryUnsupported.into()),
    }
}

/// Reject GitHub Enterprise Server hosts.
pub(crate) fn deny_server(standard_host: bool) -> Result<(), ScopeError> {
    if standard_host {
        Ok(())
    } else {
        Err(ScopeError::ServerUnsupported)
    }
}

/// Reject user accounts, for reports that only make sense for
/// organizations.
pub(crate) fn deny_users(accounts: &[Account]) -> Result<(), ScopeError> {
    match accounts
        .iter()
        .find(|account| account.kind == AccountKind::User)
    {
        Some(user) => Err(ScopeError::UserUnsupported(user.login.clone())),
        None => Ok(()),
    }
}
