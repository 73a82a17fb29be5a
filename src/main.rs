use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod error;
mod grouper;
mod loader;
mod mailer;
mod models;
mod pipeline;
mod report;

use grouper::GroupBy;
use mailer::{ConsoleMailer, SmtpConfig, SmtpMailer};
use pipeline::{AddressPolicy, PipelineConfig};
use report::FilterPolicy;

const DEFAULT_TEMPLATE: &str =
    "Hi {name},\n\nHere is your attendance summary:\n\n{attendance}\n\nRegards,\nFaculty";

#[derive(Parser)]
#[command(name = "attendance-mailer")]
#[command(about = "Groups per-course attendance rows by student and mails each one a summary", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ReportArgs {
    /// Attendance roster (.csv, .tsv, or a spreadsheet workbook)
    #[arg(long)]
    file: PathBuf,
    /// Only report courses with attendance strictly below this percentage
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long, value_enum, default_value_t = GroupBy::Name)]
    group_by: GroupBy,
    /// Synthesize addresses as <roll>@<domain> instead of reading the Email column
    #[arg(long)]
    domain: Option<String>,
    #[arg(long, default_value = "Your Attendance Report")]
    subject: String,
    /// Message template; {name} and {attendance} are the only placeholders
    #[arg(long, default_value = DEFAULT_TEMPLATE)]
    template: String,
    /// Read the message template from a file instead
    #[arg(long, conflicts_with = "template")]
    template_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every student's report to stdout without sending anything
    Preview {
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Send one summary mail per student through the SMTP relay
    Send {
        #[command(flatten)]
        report: ReportArgs,
        /// Sender address, also used as the SMTP username
        #[arg(long)]
        sender: String,
        #[arg(long, default_value = "smtp.gmail.com")]
        relay: String,
        #[arg(long, default_value_t = 587)]
        port: u16,
        /// Environment variable holding the app password
        #[arg(long, default_value = "SMTP_APP_PASSWORD")]
        password_env: String,
        /// Minimum seconds between consecutive submissions to the relay
        #[arg(long, default_value_t = 1)]
        gap_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("attendance_mailer=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preview { report } => {
            let (records, config) =
                prepare(&report, "faculty@localhost".to_string(), Duration::ZERO)?;
            let summary = pipeline::run(&records, &config, &ConsoleMailer).await?;
            println!(
                "Previewed {} message(s): {} skipped (no address), {} skipped (no qualifying rows).",
                summary.sent, summary.skipped_no_address, summary.skipped_no_rows
            );
        }
        Commands::Send {
            report,
            sender,
            relay,
            port,
            password_env,
            gap_secs,
        } => {
            let password = std::env::var(&password_env)
                .with_context(|| format!("{password_env} must hold the SMTP app password"))?;
            let (records, config) =
                prepare(&report, sender.clone(), Duration::from_secs(gap_secs))?;
            let smtp = SmtpMailer::new(&SmtpConfig {
                relay,
                port,
                username: sender,
                password,
            })?;

            let summary = pipeline::run(&records, &config, &smtp).await?;
            print_summary(&summary);
        }
    }

    Ok(())
}

fn prepare(
    args: &ReportArgs,
    sender: String,
    min_gap: Duration,
) -> anyhow::Result<(Vec<models::Record>, PipelineConfig)> {
    let records = loader::load_records(&args.file)
        .with_context(|| format!("failed to load {}", args.file.display()))?;

    let template = match &args.template_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read template {}", path.display()))?,
        None => args.template.clone(),
    };

    let policy = match args.threshold {
        Some(threshold) => FilterPolicy::Below(threshold),
        None => FilterPolicy::All,
    };

    let address = match &args.domain {
        Some(domain) => AddressPolicy::RollDomain(domain.clone()),
        None => AddressPolicy::Column,
    };

    Ok((
        records,
        PipelineConfig {
            sender,
            subject: args.subject.clone(),
            template,
            policy,
            group_by: args.group_by,
            address,
            min_gap,
        },
    ))
}

fn print_summary(summary: &models::RunSummary) {
    println!(
        "Sent {} of {} message(s): {} skipped (no address), {} skipped (no qualifying rows), {} failed.",
        summary.sent,
        summary.total(),
        summary.skipped_no_address,
        summary.skipped_no_rows,
        summary.failed
    );
    for status in &summary.statuses {
        match &status.address {
            Some(address) => println!("- {} <{}>: {}", status.student, address, status.outcome),
            None => println!("- {}: {}", status.student, status.outcome),
        }
    }
}
