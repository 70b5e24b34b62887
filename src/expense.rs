// 💸 Expense Record - the single entity this tracker owns
//
// Identity: integer id (creation timestamp in ms), never changes on edit
// Values: description, amount (kept as the text the user typed), category

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CATEGORY
// ============================================================================

/// Fixed set of categories an expense can be filed under.
/// Serialized as the display name so the stored slot stays human readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Bills,
    Entertainment,
    Health,
    Other,
}

impl Category {
    /// All categories, in selector order
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Shopping,
        Category::Bills,
        Category::Entertainment,
        Category::Health,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Entertainment => "Entertainment",
            Category::Health => "Health",
            Category::Other => "Other",
        }
    }

    fn position(&self) -> usize {
        Category::ALL.iter().position(|c| c == self).unwrap_or(0)
    }

    /// Next category in selector order (wraps around)
    pub fn next(&self) -> Self {
        Category::ALL[(self.position() + 1) % Category::ALL.len()]
    }

    /// Previous category in selector order (wraps around)
    pub fn previous(&self) -> Self {
        let len = Category::ALL.len();
        Category::ALL[(self.position() + len - 1) % len]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    /// Case-insensitive match on the display name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("Unknown category: {}", wanted))
    }
}

// ============================================================================
// EXPENSE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Stable identity - unique within the list
    pub id: i64,

    pub description: String,

    /// Amount exactly as entered (e.g. "4.5"); formatted on display.
    /// A bare JSON number in storage is read back as its text form.
    #[serde(deserialize_with = "amount_as_text")]
    pub amount: String,

    pub category: Category,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredAmount {
    Text(String),
    Number(serde_json::Number),
}

fn amount_as_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match StoredAmount::deserialize(deserializer)? {
        StoredAmount::Text(text) => text,
        StoredAmount::Number(number) => number.to_string(),
    })
}

impl Expense {
    pub fn new(id: i64, description: String, amount: String, category: Category) -> Self {
        Expense {
            id,
            description,
            amount,
            category,
        }
    }

    /// Numeric value of the amount, if it parses
    pub fn amount_value(&self) -> Option<f64> {
        parse_amount(&self.amount)
    }

    /// Amount with two fixed decimals, as shown in the list
    pub fn display_amount(&self) -> String {
        format_amount(&self.amount)
    }
}

/// Parse a user-entered amount. Only finite, non-negative decimals count.
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        // "-0" parses as negative zero
        .map(f64::abs)
}

/// Format an amount with exactly two decimals ("4.5" -> "4.50").
/// Text that is not a valid amount renders as "--".
pub fn format_amount(raw: &str) -> String {
    match parse_amount(raw) {
        Some(value) => format!("{:.2}", value),
        None => "--".to_string(),
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ExpenseStats {
    pub count: usize,
    pub total: f64,
    /// (category, count, total) in selector order; categories with no
    /// expenses are omitted
    pub by_category: Vec<(Category, usize, f64)>,
}

/// Summarize a list of expenses. Unparseable amounts count toward `count`
/// but contribute nothing to the totals.
pub fn summarize(expenses: &[Expense]) -> ExpenseStats {
    let mut stats = ExpenseStats::default();
    let mut per_category = [(0usize, 0.0f64); Category::ALL.len()];

    for expense in expenses {
        let value = expense.amount_value().unwrap_or(0.0);
        stats.count += 1;
        stats.total += value;

        let entry = &mut per_category[expense.category.position()];
        entry.0 += 1;
        entry.1 += value;
    }

    stats.by_category = Category::ALL
        .iter()
        .zip(per_category.iter())
        .filter(|(_, (count, _))| *count > 0)
        .map(|(category, (count, total))| (*category, *count, *total))
        .collect();

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_two_decimals() {
        assert_eq!(format_amount("4.50"), "4.50");
        assert_eq!(format_amount("4.5"), "4.50");
        assert_eq!(format_amount("12"), "12.00");
        assert_eq!(format_amount(" 0.126 "), "0.13");
        assert_eq!(format_amount("abc"), "--");
        assert_eq!(format_amount("-3"), "--");
    }

    #[test]
    fn test_parse_amount_rejects_non_finite() {
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), Some(0.0));
    }

    #[test]
    fn test_category_from_str_case_insensitive() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" Bills ".parse::<Category>().unwrap(), Category::Bills);
        assert!("Groceries".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_cycle_wraps() {
        assert_eq!(Category::Food.previous(), Category::Other);
        assert_eq!(Category::Other.next(), Category::Food);
        assert_eq!(Category::Food.next(), Category::Transport);
    }

    #[test]
    fn test_expense_serializes_with_text_fields() {
        let expense = Expense::new(1, "Coffee".to_string(), "4.50".to_string(), Category::Food);
        let json = serde_json::to_value(&expense).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "description": "Coffee",
                "amount": "4.50",
                "category": "Food",
            })
        );
    }

    #[test]
    fn test_numeric_amount_reads_as_text() {
        let expense: Expense = serde_json::from_str(
            r#"{"id":2,"description":"Bus","amount":2.5,"category":"Transport"}"#,
        )
        .unwrap();

        assert_eq!(expense.amount, "2.5");
        assert_eq!(expense.display_amount(), "2.50");

        // Written back out as text
        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["amount"], serde_json::json!("2.5"));
    }

    #[test]
    fn test_summarize_groups_by_category() {
        let expenses = vec![
            Expense::new(1, "Coffee".into(), "4.50".into(), Category::Food),
            Expense::new(2, "Bus".into(), "2".into(), Category::Transport),
            Expense::new(3, "Lunch".into(), "10.25".into(), Category::Food),
        ];

        let stats = summarize(&expenses);

        assert_eq!(stats.count, 3);
        assert!((stats.total - 16.75).abs() < 1e-9);
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category[0].0, Category::Food);
        assert_eq!(stats.by_category[0].1, 2);
        assert!((stats.by_category[0].2 - 14.75).abs() < 1e-9);
        assert_eq!(stats.by_category[1].0, Category::Transport);
    }
}
