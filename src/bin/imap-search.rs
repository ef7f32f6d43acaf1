#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that runs one IMAP search step against the account configured in
//! the environment

use clap::Parser;
use imap_search_executor::{ImapExecutor, SearchResult, StepConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-search")]
#[command(
    about = "Find the first IMAP message matching the given patterns"
)]
struct Args {
    /// Mailbox to search
    #[arg(long, default_value = "INBOX")]
    mbox: String,

    /// Regex matched against the sender
    #[arg(long)]
    from: Option<String>,

    /// Regex matched against the recipient
    #[arg(long)]
    to: Option<String>,

    /// Regex matched against the decoded subject
    #[arg(long)]
    subject: Option<String>,

    /// Regex matched against the body text
    #[arg(long)]
    body: Option<String>,

    /// Delete the matched message
    #[arg(long, conflicts_with = "move_to")]
    delete: bool,

    /// Move the matched message to this mailbox
    #[arg(long)]
    move_to: Option<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply(self, mut step: StepConfig) -> (StepConfig, bool) {
        step.mailbox = self.mbox;
        step.search_from = self.from.unwrap_or_default();
        step.search_to = self.to.unwrap_or_default();
        step.search_subject = self.subject.unwrap_or_default();
        step.search_body = self.body.unwrap_or_default();
        step.delete_on_success = self.delete;
        step.mailbox_on_success = self.move_to.unwrap_or_default();
        (step, self.json)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let (step, json) = Args::parse().apply(StepConfig::from_env()?);
    let result = ImapExecutor::new(step).run().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(if result.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_result(result: &SearchResult) {
    if result.passed() {
        println!("Subject: {}", result.subject);
        println!("Time:    {:.3}s", result.time_seconds);
        println!("\n--- Body ---\n");
        println!("{}", result.body);
    } else {
        println!("Error:   {}", result.err);
        println!("Time:    {:.3}s", result.time_seconds);
    }
}
