//! End-to-end expense batch walkthrough

use expense_recon_core::{
    EmployeeLookup, Jurisdiction, Lookups, RawRow, ReconEngine, VendorLookup,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Expense Recon Core - Batch Walkthrough\n");

    // 1. Lookup tables, normally loaded by an adapter
    let lookups = Lookups::new(
        VendorLookup::from_pairs([("Jane Smith", "20001"), ("John Doe", "20002")]),
        EmployeeLookup::from_pairs([("E100", "30001")]),
    );

    let engine = ReconEngine::new(Jurisdiction::australia(), lookups)?;

    // 2. One extract's worth of raw rows
    let row = |account: &str, gross: f64, tax: f64| {
        RawRow::new()
            .with("Journal Payer Payment Type Name", "COMPANY")
            .with("Report Entry Payment Code Name", "CASH")
            .with("Employee ID", "E100")
            .with("Employee First Name", "Jane")
            .with("Employee Last Name", "Smith")
            .with("Report ID", "R2024-001")
            .with("Journal Account Code", account)
            .with("Report Submit Date", "05/01/2024")
            .with("Report Entry Transaction Date", "03/01/2024")
            .with("Report Entry Vendor Name", "Cafe Uno")
            .with("Report Entry Expense Type Name", "Meals")
            .with("Department", "801000")
            .with("Journal Amount", gross)
            .with("Report Entry Total Tax Posted Amount", tax)
    };

    let rows = vec![
        row("620100", 110.0, 10.0), // standard-taxed
        row("620200", 100.0, 0.0),  // zero-rated
        row("620300", 108.0, 8.0),  // mixed supply, will split
    ];

    // 3. Run the batch
    let output = engine.process_batch(&rows);

    println!("📦 Batch {}", output.meta.batch_id);
    println!(
        "  {} input rows, {} dropped, {} expense lines after splitting\n",
        output.meta.input_rows, output.meta.dropped_rows, output.meta.expense_lines
    );

    println!("📊 Aggregated ledger:");
    for line in &output.aggregated {
        println!(
            "  {} {} {} gross {:>8} tax {:>6} net {:>8} [{}]{}",
            line.report_id,
            line.display_account,
            line.display_tax_code,
            line.gross,
            line.tax,
            line.net,
            line.mixed,
            if line.segment.is_empty() {
                String::new()
            } else {
                format!(" ({})", line.segment)
            },
        );
    }
    println!();

    println!("⚖️ Reconciliation:");
    for row in &output.reconciliation {
        println!(
            "  {} {} gross {} net {} tax {} difference {} -> {}",
            row.employee_id, row.report_id, row.gross, row.net, row.tax, row.difference, row.status
        );
        if row.any_mixed {
            println!("    mixed: {}", row.mixed_note);
        }
    }
    println!();

    println!("📋 Posting view:");
    for row in &output.posting {
        println!(
            "  {:<10} {:<14} {:>8} {:<3} {}",
            row.employee_id, row.account, row.amount, row.tax_code, row.text
        );
    }

    Ok(())
}
