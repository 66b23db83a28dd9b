//! CSV export for sweep rows and breakdown tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::engine::breakdown::BreakdownTable;
use crate::engine::types::LoadFactorRow;

/// Column header for the sweep-row export.
const ROW_HEADER: &str = "load_factor,average_load_kw,total_energy_kwh,demand_cost,\
                          energy_cost,fixed_cost,total_cost,effective_rate,allocation";

/// Missing effective rates are written as an empty cell.
fn rate_cell(rate: Option<f64>) -> String {
    rate.map(|r| format!("{r:.6}")).unwrap_or_default()
}

/// Exports sweep rows to a CSV file at the given path.
///
/// # Arguments
///
/// * `rows` - Rows of a monthly or annual sweep
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_rows_csv(rows: &[LoadFactorRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_rows_csv(rows, io::BufWriter::new(file))
}

/// Writes sweep rows as CSV to any writer.
///
/// One line per load factor with the cost totals and the allocation source.
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_rows_csv(rows: &[LoadFactorRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(ROW_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            format!("{:.2}", r.load_factor),
            format!("{:.4}", r.average_load_kw),
            format!("{:.4}", r.total_energy_kwh),
            format!("{:.4}", r.demand_cost),
            format!("{:.4}", r.energy_cost),
            format!("{:.4}", r.fixed_cost),
            format!("{:.4}", r.total_cost),
            rate_cell(r.effective_rate),
            r.allocation.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a comprehensive breakdown table to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_breakdown_csv(table: &BreakdownTable, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_breakdown_csv(table, io::BufWriter::new(file))
}

/// Writes a breakdown table as CSV: quantity, rate and cost for every period
/// column group, then the row totals.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_breakdown_csv(table: &BreakdownTable, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(table.header())?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(1 + 3 * row.cells.len() + 5);
        record.push(format!("{:.2}", row.load_factor));
        for cell in &row.cells {
            record.push(format!("{:.4}", cell.quantity));
            record.push(format!("{:.6}", cell.rate));
            record.push(format!("{:.4}", cell.cost));
        }
        record.extend([
            format!("{:.4}", row.demand_cost),
            format!("{:.4}", row.energy_cost),
            format!("{:.4}", row.fixed_cost),
            format!("{:.4}", row.total_cost),
            rate_cell(row.effective_rate),
        ]);
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}
