#![warn(clippy::all, clippy::dbg_macro)]

use std::{io::Write, process::ExitCode};

use anstream::{eprintln, stream::IsTerminal};
use anyhow::{Context as _, Result, anyhow};
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::InfoLevel;
use github::{Client, GitHubHost, GitHubToken};
use indicatif::ProgressStyle;
use output::{OutputTargets, ReportOutput};
use owo_colors::OwoColorize;
use repo::Visibility;
use scope::{Scope, ScopeError};
use state::{ReportError, ReportState};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

mod actions;
mod billing;
mod github;
mod license;
mod output;
mod paging;
mod repo;
mod scope;
mod state;
#[cfg(test)]
mod testing;
mod verified_emails;

/// Reports on GitHub enterprises, organizations and users.
#[derive(Parser)]
#[command(about, version)]
struct App {
    /// The enterprise to report on.
    #[arg(short, long, global = true, conflicts_with_all = ["owner", "repo"])]
    enterprise: Option<String>,

    /// The organization or user to report on.
    #[arg(short, long, global = true, conflicts_with = "repo")]
    owner: Option<String>,

    /// The repository to report on, as OWNER/REPO.
    #[arg(short, long, global = true)]
    repo: Option<String>,

    /// The GitHub API token to use.
    #[arg(short, long, global = true, env = "GH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// The GitHub hostname. Defaults to github.com
    #[arg(
        long,
        global = true,
        env = "GH_HOST",
        default_value = "github.com",
        value_parser = GitHubHost::new
    )]
    hostname: GitHubHost,

    /// Save the report as CSV to this path.
    #[arg(long, global = true, value_name = "PATH")]
    csv: Option<Utf8PathBuf>,

    /// Save the report as JSON to this path.
    #[arg(long, global = true, value_name = "PATH")]
    json: Option<Utf8PathBuf>,

    /// Save the report as a Markdown table to this path.
    #[arg(long = "md", global = true, value_name = "PATH")]
    markdown: Option<Utf8PathBuf>,

    /// Don't print the report to the console.
    #[arg(long, global = true)]
    silent: bool,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,

    /// Don't show progress spinners, even if the terminal supports them.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Control the use of color in output.
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    color: Option<ColorMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report on the actions used by workflows, and the permissions they declare.
    Actions(ActionsArgs),
    /// Report on billing for Actions, Packages, Advanced Security and storage.
    Billing(BillingArgs),
    /// Report on enterprise license consumption.
    License,
    /// Report on repositories.
    Repo(RepoArgs),
    /// Report on organization members' verified domain emails.
    VerifiedEmails,
}

#[derive(Args)]
struct ActionsArgs {
    /// Leave out actions authored by GitHub (`actions/*` and `github/*`).
    #[arg(long)]
    exclude: bool,
}

#[derive(Args)]
struct BillingArgs {
    /// Report GitHub Actions minutes.
    #[arg(long)]
    actions: bool,

    /// Report GitHub Packages bandwidth.
    #[arg(long)]
    packages: bool,

    /// Report GitHub Advanced Security active committers.
    #[arg(long)]
    security: bool,

    /// Report shared storage.
    #[arg(long)]
    storage: bool,
}

#[derive(Args)]
#[group(multiple = false)]
struct RepoArgs {
    /// Only list public repositories.
    #[arg(long)]
    public: bool,

    /// Only list private repositories.
    #[arg(long)]
    private: bool,

    /// Only list internal repositories.
    #[arg(long)]
    internal: bool,
}

impl RepoArgs {
    fn visibility(&self) -> Option<Visibility> {
        match (self.public, self.private, self.internal) {
            (true, _, _) => Some(Visibility::Public),
            (_, true, _) => Some(Visibility::Private),
            (_, _, true) => Some(Visibility::Internal),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum ColorMode {
    /// Use color output if the output supports it.
    Auto,
    /// Force color output, even if the output isn't a terminal.
    Always,
    /// Disable color output, even if the output is a compatible terminal.
    Never,
}

impl ColorMode {
    /// A concrete `anstream::ColorChoice` for a stream whose terminal-ness
    /// can't be inferred through a `Box<dyn Write>`.
    fn color_choice_for_terminal(&self, io: impl IsTerminal) -> anstream::ColorChoice {
        match self {
            ColorMode::Auto => {
                if io.is_terminal() {
                    anstream::ColorChoice::Always
                } else {
                    anstream::ColorChoice::Never
                }
            }
            ColorMode::Always => anstream::ColorChoice::Always,
            ColorMode::Never => anstream::ColorChoice::Never,
        }
    }
}

impl From<ColorMode> for anstream::ColorChoice {
    fn from(value: ColorMode) -> Self {
        match value {
            ColorMode::Auto => Self::Auto,
            ColorMode::Always => Self::Always,
            ColorMode::Never => Self::Never,
        }
    }
}

impl App {
    fn scope(&self) -> Result<Scope, ScopeError> {
        Scope::new(
            self.enterprise.as_deref(),
            self.owner.as_deref(),
            self.repo.as_deref(),
        )
        .map_err(|err| match (err, &self.command) {
            (ScopeError::Missing, Commands::License) => ScopeError::EnterpriseRequired,
            (err, _) => err,
        })
    }

    /// Everything that can rule the run out before we touch the network.
    fn precheck(&self, scope: &Scope) -> Result<(), ScopeError> {
        let standard_host = self.hostname.is_standard();

        match &self.command {
            Commands::Actions(_) => actions::precheck(scope, standard_host),
            Commands::Billing(_) => billing::precheck(scope),
            Commands::License => license::precheck(scope),
            Commands::Repo(_) => repo::precheck(scope),
            Commands::VerifiedEmails => verified_emails::precheck(scope, standard_host),
        }
    }

    fn targets(&self) -> OutputTargets {
        OutputTargets {
            csv: self.csv.clone(),
            json: self.json.clone(),
            markdown: self.markdown.clone(),
        }
    }
}

async fn report(
    command: &Commands,
    state: &ReportState<Client>,
    scope: &Scope,
) -> Result<ReportOutput, ReportError> {
    match command {
        Commands::Actions(args) => {
            actions::run(state, scope, actions::AuthorshipFilter::new(args.exclude)).await
        }
        Commands::Billing(args) => {
            let categories = billing::BillingCategory::selected(
                args.actions,
                args.packages,
                args.security,
                args.storage,
            );
            billing::run(state, scope, &categories).await
        }
        Commands::License => license::run(state, scope).await,
        Commands::Repo(args) => repo::run(state, scope, args.visibility()).await,
        Commands::VerifiedEmails => verified_emails::run(state, scope).await,
    }
}

fn run() -> Result<ExitCode> {
    human_panic::setup_panic!();

    let mut app = App::parse();

    let color_mode = match app.color {
        Some(color_mode) => color_mode,
        None => {
            if std::env::var("NO_COLOR").is_ok() {
                ColorMode::Never
            } else if std::env::var("FORCE_COLOR").is_ok()
                || std::env::var("CLICOLOR_FORCE").is_ok()
            {
                ColorMode::Always
            } else {
                ColorMode::Auto
            }
        }
    };

    anstream::ColorChoice::write_global(color_mode.into());

    // `anstream` strips the escapes `tracing_indicatif` needs for line
    // control, so spinners only make sense with color.
    if matches!(color_mode, ColorMode::Never) {
        app.no_progress = true;
    }

    let indicatif_layer = IndicatifLayer::new().with_progress_style(
        ProgressStyle::with_template("{spinner:.cyan} {span_name} {span_fields} {wide_msg}")
            .context("invalid progress template")?,
    );

    let writer = std::sync::Mutex::new(anstream::AutoStream::new(
        Box::new(indicatif_layer.get_stderr_writer()) as Box<dyn Write + Send>,
        color_mode.color_choice_for_terminal(std::io::stderr()),
    ));

    let filter = EnvFilter::builder()
        .with_default_directive(app.verbose.tracing_level_filter().into())
        .from_env()?;

    let reg = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(writer),
        )
        .with(filter);

    if app.no_progress {
        reg.init();
    } else {
        reg.with(indicatif_layer).init();
    }

    let scope = app.scope()?;
    app.precheck(&scope)?;

    let token = app
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("no GitHub token: use --token or set GH_TOKEN"))
        .and_then(|token| GitHubToken::new(token).map_err(|err| anyhow!(err)))?;

    let client = Client::new(&app.hostname, &token)?;
    let state = ReportState::new(client, app.hostname.is_standard());

    tracing::debug!("reporting against {host}", host = app.hostname);

    let output = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(report(&app.command, &state, &scope))?;

    output.emit(app.silent, &app.targets())?;

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    // Returning an ExitCode (rather than calling `std::process::exit`)
    // lets everything drop cleanly.
    match run() {
        Ok(exit) => exit,
        Err(err) => {
            eprintln!(
                "{fatal}: no report was generated",
                fatal = "fatal".red().bold()
            );
            eprintln!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
