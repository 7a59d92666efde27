//! Reconcile the bundled sample data and ask a question about it

use reconciliation_core::utils::ScriptedAnsweringService;
use reconciliation_core::{ask, load_batch, ReconciliationEngine, ScoreBreakdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Reconciliation Core - Sample Run\n");

    // 1. Load and validate the sample records
    let ingested = load_batch("data/transactions.json", "data/attachments.json")?;
    println!(
        "Loaded {} transactions and {} attachments ({} rejected)\n",
        ingested.transactions.len(),
        ingested.attachments.len(),
        ingested.rejected.len()
    );
    let (transactions, attachments) = ingested.into_strict()?;

    // 2. Run the greedy matcher
    let engine = ReconciliationEngine::default();
    let report = engine.reconcile(&transactions, &attachments);
    println!("{}\n", report.summary());

    for pair in &report.matched {
        let ScoreBreakdown {
            amount,
            counterparty,
            date,
        } = engine
            .matcher()
            .scorer()
            .breakdown(&pair.transaction, &pair.attachment);
        println!(
            "  ✓ transaction {} <-> {} via {} (amount {}, counterparty {}, date {})",
            pair.transaction.id, pair.attachment.id, pair.basis, amount, counterparty, date
        );
    }
    for tx in &report.unmatched_transactions {
        println!("  ✗ transaction {} has no supporting document", tx.id);
    }
    for att in &report.unmatched_attachments {
        println!("  ✗ attachment {} has no payment", att.id);
    }
    println!();

    // 3. Ask a question through an offline answering service
    let service = ScriptedAnsweringService::new("Transaction 3 (Zed, -75) is unmatched.");
    let question = "Which payments lack a receipt?";
    let answer = ask(&service, &report, question).await?;
    println!("Q: {question}\nA: {answer}");

    let request = &service.requests()[0];
    println!(
        "\nThe service saw {} matched, {} unmatched transactions and {} unmatched attachments.",
        request.context.matched.len(),
        request.context.unmatched_transactions.len(),
        request.context.unmatched_attachments.len()
    );

    Ok(())
}
