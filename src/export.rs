// 📤 CSV export - one line per expense, in list order

use crate::expense::Expense;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Category")]
    category: &'static str,
}

impl<'a> From<&'a Expense> for CsvRow<'a> {
    fn from(expense: &'a Expense) -> Self {
        CsvRow {
            id: expense.id,
            description: &expense.description,
            amount: expense.display_amount(),
            category: expense.category.as_str(),
        }
    }
}

/// Write `expenses` as CSV to any writer. Returns the number of rows.
pub fn write_csv<W: Write>(writer: W, expenses: &[Expense]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    if expenses.is_empty() {
        // serialize() only emits the header alongside the first record
        wtr.write_record(["Id", "Description", "Amount", "Category"])?;
    }
    for expense in expenses {
        wtr.serialize(CsvRow::from(expense))
            .with_context(|| format!("Failed to write expense {}", expense.id))?;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(expenses.len())
}

pub fn export_csv(path: &Path, expenses: &[Expense]) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, expenses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::Category;

    #[test]
    fn test_write_csv_rows_in_order() {
        let expenses = vec![
            Expense::new(1, "Coffee".into(), "4.5".into(), Category::Food),
            Expense::new(2, "Taxi, late".into(), "18".into(), Category::Transport),
        ];
        let mut out = Vec::new();

        let written = write_csv(&mut out, &expenses).unwrap();

        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Id,Description,Amount,Category\n\
             1,Coffee,4.50,Food\n\
             2,\"Taxi, late\",18.00,Transport\n"
        );
    }

    #[test]
    fn test_write_csv_empty_has_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Id,Description,Amount,Category\n");
    }

    #[test]
    fn test_export_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expenses.csv");
        let expenses = vec![Expense::new(7, "Rent".into(), "900".into(), Category::Bills)];

        export_csv(&path, &expenses).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("7,Rent,900.00,Bills\n"));
    }
}
