//! The verified-emails report: each organization member's emails in
//! the organization's verified domains.

use itertools::Itertools as _;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{Instrument as _, info_span};

use crate::{
    github::GitHubApi,
    output::{ReportOutput, Table},
    paging::{Connection, paginate_optional},
    scope::{Scope, ScopeError, deny_server, deny_users, resolve_accounts},
    state::{ReportError, ReportState},
};

const MEMBER_LIST_QUERY: &str = r#"
query MemberList($org: String!, $page: String) {
  organization(login: $org) {
    membersWithRole(first: 100, after: $page) {
      pageInfo { hasNextPage endCursor }
      nodes {
        login
        name
        email
        organizationVerifiedDomainEmails(login: $org)
      }
    }
  }
}
"#;

#[derive(Deserialize)]
struct MemberListData {
    organization: Option<MemberListOrganization>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberListOrganization {
    members_with_role: Connection<Member>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Member {
    login: String,
    #[serde(default, rename(serialize = "full_name"))]
    name: Option<String>,
    /// The public profile email, if any. Empty rather than `null`.
    #[serde(default)]
    email: String,
    #[serde(default, rename(serialize = "verified_emails"))]
    organization_verified_domain_emails: Vec<String>,
}

async fn list_members<C: GitHubApi>(
    state: &ReportState<C>,
    org: &str,
) -> Result<Vec<Member>, ReportError> {
    let api = &state.api;

    paginate_optional(&format!("{org} members"), state.delay, |page| async move {
        let data: MemberListData = api
            .graphql("MemberList", MEMBER_LIST_QUERY, json!({"org": org, "page": page}))
            .await?;

        Ok(data.organization.map(|found| found.members_with_role))
    })
    .await?
    .ok_or_else(|| ReportError::UnknownAccount(org.into()))
}

pub(crate) fn precheck(scope: &Scope, standard_host: bool) -> Result<(), ScopeError> {
    deny_server(standard_host)?;
    scope.deny_repository()?;
    Ok(())
}

/// Run the verified-emails report. A member of several organizations
/// is reported once, with their first organization's emails.
pub(crate) async fn run<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
) -> Result<ReportOutput, ReportError> {
    precheck(scope, state.standard_host)?;

    let accounts = resolve_accounts(state, scope).await?;
    deny_users(&accounts)?;

    let mut members = vec![];
    for (idx, account) in accounts.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(state.delay).await;
        }

        let found = list_members(state, &account.login)
            .instrument(info_span!("verified-emails", account = %account))
            .await?;

        tracing::info!(
            "{completed} {account}: {count} members",
            completed = "completed".green(),
            count = found.len(),
        );
        members.extend(found);
    }

    let members: Vec<_> = members
        .into_iter()
        .unique_by(|member| member.login.clone())
        .collect();

    let mut table = Table::new(["login", "full_name", "email", "verified_emails"]);
    for member in &members {
        table.push([
            member.login.clone(),
            member.name.clone().unwrap_or_default(),
            member.email.clone(),
            member.organization_verified_domain_emails.join(","),
        ]);
    }

    Ok(ReportOutput {
        summary: None,
        table,
        json: serde_json::to_value(&members)?,
    })
}
