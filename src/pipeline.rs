use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::{info, warn};

use crate::error::Result;
use crate::grouper::{self, GroupBy};
use crate::mailer::Mailer;
use crate::models::{Group, Message, Record, RecipientStatus, RunSummary, SendOutcome};
use crate::report::{self, FilterPolicy};

#[derive(Debug, Clone)]
pub enum AddressPolicy {
    /// Take the recipient address from the Email column
    Column,
    /// Synthesize `<roll>@<domain>` from the roll number
    RollDomain(String),
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sender: String,
    pub subject: String,
    pub template: String,
    pub policy: FilterPolicy,
    pub group_by: GroupBy,
    pub address: AddressPolicy,
    pub min_gap: Duration,
}

/// Keeps at least `min_gap` between consecutive submissions to the relay,
/// whether or not the previous one succeeded.
struct SendPacer {
    min_gap: Duration,
    next_ready: Option<Instant>,
}

impl SendPacer {
    fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            next_ready: None,
        }
    }

    async fn acquire(&mut self) {
        if let Some(ready) = self.next_ready {
            sleep_until(ready).await;
        }
        self.next_ready = Some(Instant::now() + self.min_gap);
    }
}

fn resolve_address(group: &Group, policy: &AddressPolicy) -> Option<String> {
    let first = group.records.first()?;

    match policy {
        AddressPolicy::Column => first
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string),
        AddressPolicy::RollDomain(domain) => first
            .roll
            .as_deref()
            .map(str::trim)
            .filter(|roll| !roll.is_empty())
            .map(|roll| format!("{roll}@{domain}")),
    }
}

pub async fn run(
    records: &[Record],
    config: &PipelineConfig,
    mailer: &dyn Mailer,
) -> Result<RunSummary> {
    report::validate_template(&config.template)?;

    let groups = grouper::group_records(records, config.group_by)?;
    let mut pacer = SendPacer::new(config.min_gap);
    let mut summary = RunSummary::default();

    for group in &groups {
        let Some(address) = resolve_address(group, &config.address) else {
            warn!(student = %group.key, "no recipient address, skipping");
            summary.record(RecipientStatus {
                student: group.key.clone(),
                address: None,
                outcome: SendOutcome::SkippedNoAddress,
            });
            continue;
        };

        let Some(table) = report::format_report(group, config.policy) else {
            info!(student = %group.key, "no qualifying rows, skipping");
            summary.record(RecipientStatus {
                student: group.key.clone(),
                address: Some(address),
                outcome: SendOutcome::SkippedNoQualifyingRows,
            });
            continue;
        };

        let message = Message {
            from: config.sender.clone(),
            to: address.clone(),
            subject: config.subject.clone(),
            body: report::render_template(&config.template, &group.key.name, &table),
        };

        pacer.acquire().await;
        let outcome = match mailer.send(&message).await {
            Ok(()) => {
                info!(student = %group.key, to = %address, "message sent");
                SendOutcome::Sent
            }
            Err(err) => {
                warn!(student = %group.key, to = %address, error = %err, "send failed");
                SendOutcome::Failed(err.to_string())
            }
        };

        summary.record(RecipientStatus {
            student: group.key.clone(),
            address: Some(address),
            outcome,
        });
    }

    Ok(summary)
}
