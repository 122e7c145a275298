// Entry point and CLI flow.
//
// Both feeds are fetched once at startup. After that every command is a
// synchronous aggregation over the in-memory records:
// - `summary` groups a month's activity by branch and employee,
// - `hierarchy` rolls it up per territory manager,
// - `export` writes either view as CSV,
// - `interactive` (the default) keeps the data loaded and lets the user
//   pick a month, switch views and export the last report.
mod config;
mod error;
mod fetch;
mod hierarchy;
mod loader;
mod output;
mod parser;
mod reports;
mod session;
mod types;
mod util;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::ReportConfig;
use error::ReportError;
use fetch::FeedSource;
use hierarchy::HierarchyResolver;
use loader::LoadReport;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::{ActivityRecord, MappingRecord, Report};

#[derive(Parser, Debug)]
#[command(name = "activity_report", version, about = "Field activity report over published sheet exports")]
struct Cli {
    /// TOML config file (feeds, column layout, targets, special cases)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Activity feed URL or CSV path (overrides the config)
    #[arg(long, global = true)]
    activity: Option<String>,

    /// Mapping feed URL or CSV path (overrides the config)
    #[arg(long, global = true)]
    mapping: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Branch and employee summary for one month
    Summary {
        /// Month as 1-12 or a name ("March", "mar")
        #[arg(short, long)]
        month: String,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Territory manager roster for one month
    Hierarchy {
        #[arg(short, long)]
        month: String,
        /// Territory manager; all of them when omitted
        #[arg(long)]
        tm: Option<String>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write a month's report as CSV
    Export {
        #[arg(short, long)]
        month: String,
        /// Export the territory manager view instead of the branch view
        #[arg(long)]
        tm: Option<String>,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// List territory managers found in the mapping feed
    Managers,
    /// Menu-driven session (default)
    Interactive,
}

/// Records of both feeds, normalized once per run.
struct Dataset {
    config: ReportConfig,
    activity: Vec<ActivityRecord>,
    mapping: Vec<MappingRecord>,
}

impl Dataset {
    fn resolver(&self) -> HierarchyResolver<'_> {
        HierarchyResolver::new(&self.mapping, &self.config.special_cases)
    }

    fn branch_report(&self, month: u32) -> Report {
        Report::Branch(reports::branch_report(&self.activity, month))
    }

    /// Hierarchy view for `tm`, or for every territory manager.
    fn hierarchy_report(&self, month: u32, tm: Option<&str>) -> Result<Report, ReportError> {
        let resolver = self.resolver();
        let managers = match tm {
            Some(input) => vec![resolver
                .find_territory_manager(input)
                .ok_or_else(|| ReportError::UnknownTerritoryManager(input.to_string()))?],
            None => resolver.territory_managers(),
        };
        Ok(Report::Hierarchy(reports::hierarchy_reports(
            &self.activity,
            &resolver,
            &managers,
            month,
        )))
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn print_load_report(feed: &str, report: &LoadReport) {
    println!(
        "Loaded {} feed: {} rows ({} short, {} without employee code)",
        feed,
        util::format_int(report.total_rows),
        util::format_int(report.short_rows),
        util::format_int(report.missing_codes)
    );
}

async fn load_dataset(cli: &Cli) -> Result<Dataset> {
    let config = ReportConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    let activity_src = cli
        .activity
        .as_deref()
        .or(config.activity_feed.as_deref())
        .map(FeedSource::parse);
    let mapping_src = cli
        .mapping
        .as_deref()
        .or(config.mapping_feed.as_deref())
        .map(FeedSource::parse);

    let texts = fetch::fetch_feeds(activity_src.as_ref(), mapping_src.as_ref()).await;
    let (activity, activity_load) = loader::load_activity(&texts.activity, &config.activity_columns);
    let (mapping, mapping_load) = loader::load_mapping(&texts.mapping, &config.mapping_columns);
    info!(
        activity_rows = activity.len(),
        mapping_rows = mapping.len(),
        "feeds loaded"
    );
    print_load_report("activity", &activity_load);
    if mapping_src.is_some() {
        print_load_report("mapping", &mapping_load);
    }
    println!();

    Ok(Dataset {
        config,
        activity,
        mapping,
    })
}

fn finish_report(report: &Report, dataset: &Dataset, json: Option<&Path>) -> Result<()> {
    output::print_report(&mut io::stdout(), report, &dataset.config.targets)?;
    if let Some(path) = json {
        output::write_json(path, report, &dataset.config.targets)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("(Report saved to {})\n", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dataset = load_dataset(&cli).await?;

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Summary { month, json } => {
            let month = util::parse_month_arg(&month)?;
            let report = dataset.branch_report(month);
            finish_report(&report, &dataset, json.as_deref())?;
        }
        Command::Hierarchy { month, tm, json } => {
            let month = util::parse_month_arg(&month)?;
            let report = dataset.hierarchy_report(month, tm.as_deref())?;
            finish_report(&report, &dataset, json.as_deref())?;
        }
        Command::Export { month, tm, out } => {
            let month = util::parse_month_arg(&month)?;
            let report = match tm.as_deref() {
                Some(tm) => dataset.hierarchy_report(month, Some(tm))?,
                None => dataset.branch_report(month),
            };
            let rows = output::write_export(&out, &report, &dataset.config.targets)
                .with_context(|| format!("Export to {} failed", out.display()))?;
            println!(
                "Exported {} rows for {} to {}",
                util::format_int(rows),
                util::month_name(month),
                out.display()
            );
        }
        Command::Managers => {
            let managers = dataset.resolver().territory_managers();
            if managers.is_empty() {
                println!("No territory managers found. Is a mapping feed configured?");
            }
            for name in managers {
                println!("{}", name);
            }
        }
        Command::Interactive => {
            let stdin = io::stdin();
            session::run_session(&dataset, &mut stdin.lock(), &mut io::stdout())
                .context("Interactive session failed")?;
        }
    }
    Ok(())
}
