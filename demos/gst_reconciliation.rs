//! GST edge cases: tax-line merging, unmatched diagnostics, NZ display codes

use expense_recon_core::{Jurisdiction, Lookups, RawRow, ReconEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Expense Recon Core - GST Reconciliation Examples\n");

    let engine = ReconEngine::new(Jurisdiction::new_zealand(), Lookups::default())?;

    let base = |account: &str| {
        RawRow::new()
            .with("Journal Payer Payment Type Name", "COMPANY")
            .with("Report Entry Payment Code Name", "CASH")
            .with("Employee ID", "E205")
            .with("Report ID", "R2024-017")
            .with("Journal Account Code", account)
            .with("Report Submit Date", "12/02/2024")
            .with("Report Entry Transaction Date", "09/02/2024")
            .with("Report Entry Vendor Name", "Harbour Taxis")
            .with("Report Entry Expense Type Name", "Ground Transport")
            .with("Department", "805500")
    };

    let rows = vec![
        // Expense line posted without tax; the standalone debit entries
        // below carry the GST and merge onto it by key.
        base("620100")
            .with("Journal Amount", 115.0)
            .with("Report Entry Total Tax Posted Amount", 0.0),
        base("620100")
            .with("Journal Debit or Credit", "DR")
            .with("Journal Amount", 9.0),
        base("620100")
            .with("Journal Debit or Credit", "DR")
            .with("Journal Amount", 6.0),
        // A tax entry whose account matches no expense line: it becomes a
        // review diagnostic instead of failing the batch.
        base("701000")
            .with("Journal Debit or Credit", "DR")
            .with("Journal Amount", 4.25),
    ];

    let output = engine.process_batch(&rows);

    println!("🗺️ Jurisdiction: {} (15% GST, Q display codes)\n", engine.jurisdiction().code);

    println!("📊 Aggregated ledger (note the 81-prefixed cost center):");
    for line in &output.aggregated {
        println!(
            "  {} {} {} gross {} tax {} net {} cost-center {}",
            line.report_id,
            line.display_account,
            line.display_tax_code,
            line.gross,
            line.tax,
            line.net,
            line.department
        );
    }
    println!();

    println!("🚩 Unmatched tax entries:");
    for item in &output.unmatched_tax {
        println!("  {} tax {} -> {}", item.key_display, item.tax_found, item.action);
    }
    println!();

    println!("⚖️ Reconciliation (diagnostics included):");
    for row in &output.reconciliation {
        if row.diagnostic.is_empty() {
            println!(
                "  {} {} gross {} net {} tax {} -> {}",
                row.employee_id, row.report_id, row.gross, row.net, row.tax, row.status
            );
        } else {
            println!("  {} tax {} -> {} ({})", row.report_id, row.tax, row.status, row.diagnostic);
        }
    }
    println!();

    if output.rate_check.is_conforming() {
        println!("✅ All effective rates within the NZ band");
    } else {
        println!(
            "⚠️ {} aggregated rows outside the rate band",
            output.rate_check.flagged
        );
    }

    Ok(())
}
