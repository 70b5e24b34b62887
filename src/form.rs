// 📝 Expense form - input fields plus create/edit mode

use crate::expense::{parse_amount, Category, Expense};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Editing the expense with this id
    Edit(i64),
}

impl FormMode {
    pub fn submit_label(&self) -> &'static str {
        match self {
            FormMode::Create => "Add Expense",
            FormMode::Edit(_) => "Save Changes",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "Add New Expense",
            FormMode::Edit(_) => "Edit Expense",
        }
    }
}

/// Fields that passed validation, trimmed
#[derive(Debug, Clone, PartialEq)]
pub struct ValidInput {
    pub description: String,
    pub amount: String,
    pub category: Category,
}

#[derive(Debug, Clone)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    pub category: Option<Category>,
    mode: FormMode,
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpenseForm {
    pub fn new() -> Self {
        ExpenseForm {
            description: String::new(),
            amount: String::new(),
            category: None,
            mode: FormMode::Create,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    /// Id of the expense being edited, if any
    pub fn editing_id(&self) -> Option<i64> {
        match self.mode {
            FormMode::Create => None,
            FormMode::Edit(id) => Some(id),
        }
    }

    /// Pre-fill from `expense` and switch to edit mode, replacing any
    /// previous edit target.
    pub fn start_edit(&mut self, expense: &Expense) {
        self.description = expense.description.clone();
        self.amount = expense.amount.clone();
        self.category = Some(expense.category);
        self.mode = FormMode::Edit(expense.id);
    }

    /// Clear every field and go back to create mode
    pub fn reset(&mut self) {
        *self = ExpenseForm::new();
    }

    /// Trimmed input, or `None` if any field is missing or the amount is
    /// not a non-negative number.
    pub fn validate(&self) -> Option<ValidInput> {
        let description = self.description.trim();
        let amount = self.amount.trim();
        let category = self.category?;

        if description.is_empty() || amount.is_empty() {
            return None;
        }
        parse_amount(amount)?;

        Some(ValidInput {
            description: description.to_string(),
            amount: amount.to_string(),
            category,
        })
    }

    /// Step the category selector forward; an empty selector starts at the
    /// first category.
    pub fn next_category(&mut self) {
        self.category = Some(match self.category {
            Some(c) => c.next(),
            None => Category::ALL[0],
        });
    }

    pub fn previous_category(&mut self) {
        self.category = Some(match self.category {
            Some(c) => c.previous(),
            None => Category::ALL[Category::ALL.len() - 1],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(description: &str, amount: &str, category: Option<Category>) -> ExpenseForm {
        let mut form = ExpenseForm::new();
        form.description = description.to_string();
        form.amount = amount.to_string();
        form.category = category;
        form
    }

    #[test]
    fn test_new_form_is_create_mode() {
        let form = ExpenseForm::new();
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.mode().submit_label(), "Add Expense");
        assert_eq!(form.mode().title(), "Add New Expense");
        assert_eq!(form.editing_id(), None);
    }

    #[test]
    fn test_validate_trims_fields() {
        let form = filled("  Coffee ", " 4.50 ", Some(Category::Food));
        let input = form.validate().unwrap();

        assert_eq!(input.description, "Coffee");
        assert_eq!(input.amount, "4.50");
        assert_eq!(input.category, Category::Food);
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(filled("   ", "4.50", Some(Category::Food)).validate().is_none());
        assert!(filled("Coffee", "  ", Some(Category::Food)).validate().is_none());
        assert!(filled("Coffee", "4.50", None).validate().is_none());
    }

    #[test]
    fn test_validate_rejects_bad_amount() {
        assert!(filled("Coffee", "four", Some(Category::Food)).validate().is_none());
        assert!(filled("Coffee", "-1", Some(Category::Food)).validate().is_none());
    }

    #[test]
    fn test_start_edit_prefills_and_retargets() {
        let a = Expense::new(1, "Coffee".into(), "4.50".into(), Category::Food);
        let b = Expense::new(2, "Bus".into(), "2".into(), Category::Transport);
        let mut form = ExpenseForm::new();

        form.start_edit(&a);
        assert_eq!(form.mode(), FormMode::Edit(1));
        assert_eq!(form.mode().submit_label(), "Save Changes");
        assert_eq!(form.description, "Coffee");

        form.start_edit(&b);
        assert_eq!(form.editing_id(), Some(2));
        assert_eq!(form.amount, "2");
        assert_eq!(form.category, Some(Category::Transport));
    }

    #[test]
    fn test_reset_clears_everything() {
        let a = Expense::new(1, "Coffee".into(), "4.50".into(), Category::Food);
        let mut form = ExpenseForm::new();
        form.start_edit(&a);

        form.reset();

        assert_eq!(form.mode(), FormMode::Create);
        assert!(form.description.is_empty());
        assert!(form.amount.is_empty());
        assert_eq!(form.category, None);
    }

    #[test]
    fn test_category_selector_starts_at_ends() {
        let mut form = ExpenseForm::new();
        form.next_category();
        assert_eq!(form.category, Some(Category::Food));

        form.reset();
        form.previous_category();
        assert_eq!(form.category, Some(Category::Other));
    }
}
