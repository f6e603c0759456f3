//! The billing report: Actions minutes, Packages bandwidth, Advanced
//! Security committers and shared storage, per account.

use indexmap::IndexMap;
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use tracing::{Instrument as _, info_span};

use crate::{
    github::GitHubApi,
    output::{ReportOutput, Table},
    scope::{Account, Scope, ScopeError, resolve_accounts},
    state::{ReportError, ReportState},
};

/// One billing settings endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BillingCategory {
    Actions,
    Packages,
    Security,
    Storage,
}

impl BillingCategory {
    pub(crate) const ALL: [Self; 4] = [
        Self::Actions,
        Self::Packages,
        Self::Security,
        Self::Storage,
    ];

    /// The categories selected by the given flags, or every category if
    /// none is set.
    pub(crate) fn selected(
        actions: bool,
        packages: bool,
        security: bool,
        storage: bool,
    ) -> Vec<Self> {
        let selected: Vec<_> = [
            (actions, Self::Actions),
            (packages, Self::Packages),
            (security, Self::Security),
            (storage, Self::Storage),
        ]
        .into_iter()
        .filter_map(|(flag, category)| flag.then_some(category))
        .collect();

        if selected.is_empty() {
            Self::ALL.to_vec()
        } else {
            selected
        }
    }

    fn path(self) -> &'static str {
        match self {
            Self::Actions => "actions",
            Self::Packages => "packages",
            Self::Security => "advanced-security",
            Self::Storage => "shared-storage",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Actions => "action_minutes_used",
            Self::Packages => "gigabytes_bandwidth_used",
            Self::Security => "advanced_security_committers",
            Self::Storage => "estimated_storage_for_month",
        }
    }

    fn amount(self, usage: &BillingUsage) -> f64 {
        match self {
            Self::Actions => usage.total_minutes_used,
            Self::Packages => usage.total_gigabytes_bandwidth_used,
            Self::Security => usage.total_advanced_security_committers,
            Self::Storage => usage.estimated_storage_for_month,
        }
    }
}

/// The one headline figure of each billing response. Each endpoint
/// only fills in its own.
#[derive(Deserialize, Debug, Default)]
struct BillingUsage {
    #[serde(default)]
    total_minutes_used: f64,
    #[serde(default)]
    total_gigabytes_bandwidth_used: f64,
    #[serde(default)]
    total_advanced_security_committers: f64,
    #[serde(default)]
    estimated_storage_for_month: f64,
}

/// The REST path of `category`'s billing settings for `account`.
pub(crate) fn billing_endpoint(account: &Account, category: BillingCategory) -> String {
    format!(
        "{account}/settings/billing/{path}",
        account = account.api_path(),
        path = category.path()
    )
}

#[derive(Serialize, Debug)]
struct AccountBilling {
    account: String,
    #[serde(flatten)]
    usage: IndexMap<&'static str, f64>,
}

fn table(categories: &[BillingCategory], rows: &[AccountBilling]) -> Table {
    let mut table = Table::new(
        std::iter::once("account").chain(categories.iter().map(|category| category.column())),
    );

    for row in rows {
        table.push(
            std::iter::once(row.account.clone())
                .chain(row.usage.values().map(ToString::to_string)),
        );
    }

    table.push(std::iter::once("total".to_string()).chain(categories.iter().map(|category| {
        rows.iter()
            .filter_map(|row| row.usage.get(category.column()))
            .sum::<f64>()
            .to_string()
    })));

    table
}

pub(crate) fn precheck(scope: &Scope) -> Result<(), ScopeError> {
    scope.deny_repository()?;
    Ok(())
}

/// Run the billing report over `categories`.
pub(crate) async fn run<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
    categories: &[BillingCategory],
) -> Result<ReportOutput, ReportError> {
    precheck(scope)?;

    let accounts = resolve_accounts(state, scope).await?;

    let mut rows = vec![];
    let mut requests = 0;
    for account in &accounts {
        let mut usage = IndexMap::new();

        for category in categories {
            if requests > 0 {
                tokio::time::sleep(state.delay).await;
            }
            requests += 1;

            let body: BillingUsage = state
                .api
                .rest(&billing_endpoint(account, *category))
                .instrument(info_span!("billing", account = %account, category = category.path()))
                .await?;

            usage.insert(category.column(), category.amount(&body));
        }

        tracing::info!("{completed} {account}", completed = "completed".green());
        rows.push(AccountBilling {
            account: account.login.clone(),
            usage,
        });
    }

    Ok(ReportOutput {
        summary: None,
        table: table(categories, &rows),
        json: serde_json::to_value(&rows)?,
    })
}
