use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use journal_dedup::{AppConfig, DailySchedule, FeedUpdater, FileStore, GitPublisher, HttpFeedSource};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Fetch journal feeds and strip articles that were already published
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file (built-in journal list when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Update the journals once
    Run {
        /// Date recorded for undated articles (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Only update these journals (short names)
        #[arg(short, long = "journal")]
        journals: Vec<String>,

        /// Report failed journals instead of aborting the run
        #[arg(long)]
        keep_going: bool,

        /// Commit and push the output afterwards
        #[arg(long)]
        publish: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update all journals every day at a fixed hour
    Schedule {
        /// Local hour of the daily run (overrides the configuration)
        #[arg(long)]
        hour: Option<u32>,

        #[arg(long)]
        publish: bool,
    },
    /// List configured journals
    Journals,
}

fn build_updater(config: &AppConfig, keep_going: bool, publish: bool) -> anyhow::Result<FeedUpdater> {
    let store = FileStore::new(&config.ledger_dir, &config.output_dir);
    let source = HttpFeedSource::new(config.fetch.clone()).context("failed to build HTTP client")?;

    let mut updater = FeedUpdater::new(
        Box::new(source),
        Box::new(store.clone()),
        Box::new(store),
        config.engine()?,
        config.rewriter()?,
        config.namespaces(),
    )
    .continue_on_error(keep_going || config.continue_on_error);

    if publish {
        let publish_config = config.publish.clone().unwrap_or_default();
        updater = updater.with_publisher(Box::new(GitPublisher::new(publish_config)));
    }
    Ok(updater)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path).with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::default(),
    };

    match cli.command {
        Command::Run { date, journals, keep_going, publish, json } => {
            let journals = config.select_journals(&journals)?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let updater = build_updater(&config, keep_going, publish)?;

            let report = updater.run_all(&journals, date).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            if report.failures() > 0 {
                error!("{} of {} journals failed", report.failures(), report.journals.len());
                anyhow::bail!("{} journals failed", report.failures());
            }
        }
        Command::Schedule { hour, publish } => {
            let schedule = DailySchedule::new(hour.unwrap_or(config.schedule_hour))?;
            let updater = build_updater(&config, true, publish)?;
            info!("Scheduling daily run at {:02}:00 for {} journals", schedule.hour(), config.journals.len());
            schedule.run_forever(&updater, &config.journals).await;
        }
        Command::Journals => {
            for journal in &config.journals {
                println!("{:<16} {:<45} {}", journal.short_name, journal.name, journal.url);
            }
        }
    }

    Ok(())
}
