//! reconcile - match bank transactions against invoices and receipts
//!
//! Loads both record sets from JSON, runs one matching pass, prints the
//! outcome and optionally answers questions about it through the
//! configured chat-completions endpoint.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use reconciliation_core::{
    ask, load_batch, AnsweringService, ChatCompletionsClient, ReconConfig, ReconciliationEngine,
    ReconciliationReport,
};

#[derive(Debug, Parser)]
#[command(name = "reconcile", version, about = "Match bank transactions with invoices and receipts")]
struct Cli {
    /// JSON array of bank transactions
    #[arg(long, env = "RECON_TRANSACTIONS", default_value = "data/transactions.json")]
    transactions: PathBuf,

    /// JSON array of attachments (invoices, receipts)
    #[arg(long, env = "RECON_ATTACHMENTS", default_value = "data/attachments.json")]
    attachments: PathBuf,

    /// TOML configuration file; built-in defaults when omitted
    #[arg(long, env = "RECON_CONFIG")]
    config: Option<PathBuf>,

    /// Abort on the first invalid record instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Question to ask about the result (repeatable)
    #[arg(long = "ask", value_name = "QUESTION")]
    questions: Vec<String>,

    /// Keep reading questions from stdin until `exit` or end of input
    #[arg(long, short)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting reconcile v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => ReconConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReconConfig::default(),
    };

    let ingested = load_batch(&cli.transactions, &cli.attachments)
        .context("loading input records")?;
    let rejected = ingested.rejected.len();
    let (transactions, attachments) = if cli.strict {
        ingested.into_strict().context("strict ingestion failed")?
    } else {
        if rejected > 0 {
            warn!(rejected, "Some input records were skipped");
        }
        (ingested.transactions, ingested.attachments)
    };

    let engine = ReconciliationEngine::new(&config.matching);
    let report = engine.reconcile(&transactions, &attachments);

    let wants_answers = !cli.questions.is_empty() || cli.interactive;
    let service = if wants_answers && report.matched.is_empty() {
        warn!("No matched pairs to ask about; skipping questions");
        None
    } else if wants_answers {
        Some(ChatCompletionsClient::new(&config.assistant).context("creating chat client")?)
    } else {
        None
    };

    let mut answers = Vec::new();
    if let Some(service) = &service {
        for question in &cli.questions {
            if let Some(answer) = answer_one(service, &report, question).await {
                answers.push((question.clone(), answer));
            }
        }
    }

    if cli.json {
        let answers: Vec<_> = answers
            .iter()
            .map(|(question, answer)| json!({ "question": question, "answer": answer }))
            .collect();
        let output = json!({ "report": report, "answers": answers });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report);
        for (question, answer) in &answers {
            println!("\nQ: {question}\nA: {answer}");
        }
    }

    if cli.interactive {
        if let Some(service) = &service {
            interactive_loop(service, &report).await?;
        }
    }

    Ok(())
}

async fn answer_one(
    service: &dyn AnsweringService,
    report: &ReconciliationReport,
    question: &str,
) -> Option<String> {
    match ask(service, report, question).await {
        Ok(answer) => Some(answer),
        Err(e) => {
            error!("Could not answer {:?}: {}", question, e);
            None
        }
    }
}

async fn interactive_loop(
    service: &dyn AnsweringService,
    report: &ReconciliationReport,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nQuestion (or 'exit'): ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        if let Some(answer) = answer_one(service, report, question).await {
            stdout.write_all(format!("{answer}\n").as_bytes()).await?;
        }
    }
    Ok(())
}

fn print_report(report: &ReconciliationReport) {
    println!("{}", report.summary());

    println!("\nMatched pairs:");
    if report.matched.is_empty() {
        println!("  (none)");
    }
    for pair in &report.matched {
        println!(
            "  transaction {} ({}, {}) <-> attachment {} [{}] via {}",
            pair.transaction.id,
            pair.transaction.amount,
            pair.transaction.contact_name().unwrap_or("-"),
            pair.attachment.id,
            pair.attachment.kind.as_deref().unwrap_or("-"),
            pair.basis
        );
    }

    println!("\nUnmatched transactions:");
    if report.unmatched_transactions.is_empty() {
        println!("  (none)");
    }
    for tx in &report.unmatched_transactions {
        println!(
            "  {} ({}, {}) reference {}",
            tx.id,
            tx.amount,
            tx.contact_name().unwrap_or("-"),
            tx.reference.as_deref().unwrap_or("-")
        );
    }

    println!("\nUnmatched attachments:");
    if report.unmatched_attachments.is_empty() {
        println!("  (none)");
    }
    for att in &report.unmatched_attachments {
        println!(
            "  {} [{}] total {} from {} reference {}",
            att.id,
            att.kind.as_deref().unwrap_or("-"),
            att.data
                .total_amount
                .as_ref()
                .map(|amount| amount.to_string())
                .unwrap_or_else(|| "-".to_string()),
            att.counterparty().unwrap_or("-"),
            att.data.reference.as_deref().unwrap_or("-")
        );
    }
}
