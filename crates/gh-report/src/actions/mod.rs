//! The Actions report: which actions each workflow uses, and which
//! permissions it declares.

use owo_colors::OwoColorize;
use tracing::{Instrument as _, info_span};

use crate::{
    github::GitHubApi,
    output::ReportOutput,
    scope::{Scope, ScopeError, deny_server, resolve_accounts},
    state::{ReportError, ReportState},
};

mod fetch;
mod parse;
mod permissions;
mod report;
mod uses;

use report::RepositoryReportEntry;
pub(crate) use uses::AuthorshipFilter;

/// Everything that rules out a run before any network access.
pub(crate) fn precheck(scope: &Scope, standard_host: bool) -> Result<(), ScopeError> {
    deny_server(standard_host)?;
    scope.deny_repository()?;
    Ok(())
}

/// Walk every account in `scope`, one at a time, and report on each of
/// their reportable repositories in the order visited.
pub(crate) async fn collect<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
    filter: AuthorshipFilter,
) -> Result<Vec<RepositoryReportEntry>, ReportError> {
    precheck(scope, state.standard_host)?;

    let accounts = resolve_accounts(state, scope).await?;

    let mut entries = vec![];
    for (idx, account) in accounts.iter().enumerate() {
        if idx > 0 {
            tokio::time::sleep(state.delay).await;
        }

        let repositories = fetch::fetch_repositories(state, account)
            .instrument(info_span!("actions", account = %account))
            .await?;

        let before = entries.len();
        entries.extend(
            repositories
                .iter()
                .filter(|snapshot| {
                    let reportable = snapshot.is_reportable();
                    if !reportable {
                        tracing::debug!(
                            "skipping {repo}: archived, fork or without workflows",
                            repo = snapshot.full_name()
                        );
                    }
                    reportable
                })
                .map(|snapshot| report::assemble_repository(snapshot, filter)),
        );

        tracing::info!(
            "{completed} {account}: {count} repositories with workflows",
            completed = "completed".green(),
            count = entries.len() - before,
        );
    }

    Ok(entries)
}

/// Run the Actions report.
pub(crate) async fn run<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
    filter: AuthorshipFilter,
) -> Result<ReportOutput, ReportError> {
    let entries = collect(state, scope, filter).await?;

    Ok(ReportOutput {
        summary: None,
        table: report::table(&entries),
        json: serde_json::to_value(&entries)?,
    })
}
