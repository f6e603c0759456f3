//! The license report: seats purchased and consumed across an
//! enterprise, and who consumes them.

use serde::{Deserialize, Serialize};
use tracing::{Instrument as _, info_span};

use crate::{
    github::GitHubApi,
    output::{ReportOutput, Table},
    scope::{Account, Scope, ScopeError},
    state::{ReportError, ReportState},
};

/// The body of `GET enterprises/{enterprise}/consumed-licenses`.
#[derive(Deserialize, Debug)]
struct ConsumedLicenses {
    total_seats_consumed: i64,
    total_seats_purchased: i64,
    #[serde(default)]
    users: Vec<LicensedUser>,
}

/// Any of these may be `null`, depending on where the user holds a
/// license.
#[derive(Deserialize, Debug)]
struct LicensedUser {
    github_com_login: Option<String>,
    github_com_name: Option<String>,
    github_com_verified_domain_emails: Option<Vec<String>>,
    license_type: Option<String>,
    github_com_user: Option<bool>,
    enterprise_server_user: Option<bool>,
    visual_studio_subscription_user: Option<bool>,
    total_user_accounts: Option<i64>,
}

#[derive(Serialize, Debug, PartialEq)]
struct LicenseUser {
    login: String,
    name: String,
    verified_emails: Vec<String>,
    license_type: String,
    ghec: bool,
    ghes: bool,
    vss: bool,
    accounts: i64,
}

impl From<LicensedUser> for LicenseUser {
    fn from(user: LicensedUser) -> Self {
        Self {
            login: user.github_com_login.unwrap_or_default(),
            name: user.github_com_name.unwrap_or_default(),
            verified_emails: user.github_com_verified_domain_emails.unwrap_or_default(),
            license_type: user.license_type.unwrap_or_default(),
            ghec: user.github_com_user.unwrap_or_default(),
            ghes: user.enterprise_server_user.unwrap_or_default(),
            vss: user.visual_studio_subscription_user.unwrap_or_default(),
            accounts: user.total_user_accounts.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug)]
struct LicenseReport {
    purchased: i64,
    consumed: i64,
    free: i64,
    users: Vec<LicenseUser>,
}

fn check(held: bool) -> &'static str {
    if held { "✅" } else { "❌" }
}

impl LicenseReport {
    fn summary(&self) -> Table {
        let mut table = Table::new(["purchased", "consumed", "free"]);
        table.push([self.purchased, self.consumed, self.free].map(|n| n.to_string()));
        table
    }

    fn users(&self) -> Table {
        let mut table = Table::new([
            "login",
            "name",
            "verified_emails",
            "license_type",
            "ghec",
            "ghes",
            "vss",
            "accounts",
        ]);

        for user in &self.users {
            table.push([
                user.login.clone(),
                user.name.clone(),
                user.verified_emails.join(", "),
                user.license_type.clone(),
                check(user.ghec).into(),
                check(user.ghes).into(),
                check(user.vss).into(),
                user.accounts.to_string(),
            ]);
        }

        table
    }
}

pub(crate) fn precheck(scope: &Scope) -> Result<(), ScopeError> {
    scope.require_enterprise()?;
    Ok(())
}

/// Run the license report. Only enterprise scopes are accepted.
pub(crate) async fn run<C: GitHubApi>(
    state: &ReportState<C>,
    scope: &Scope,
) -> Result<ReportOutput, ReportError> {
    let enterprise = scope.require_enterprise()?;

    let licenses: ConsumedLicenses = state
        .api
        .rest(&format!(
            "{account}/consumed-licenses",
            account = Account::enterprise(enterprise).api_path()
        ))
        .instrument(info_span!("license", enterprise))
        .await?;

    let report = LicenseReport {
        purchased: licenses.total_seats_purchased,
        consumed: licenses.total_seats_consumed,
        free: licenses.total_seats_purchased - licenses.total_seats_consumed,
        users: licenses.users.into_iter().map(Into::into).collect(),
    };

    tracing::debug!("{enterprise} has {} licensed users", report.users.len());

    Ok(ReportOutput {
        summary: Some(report.summary()),
        table: report.users(),
        json: serde_json::to_value(&report)?,
    })
}
