// 🎛️ View-Controller - turns user events into store mutations and rebuilds
// the list view from the store after each one.

use crate::expense::{summarize, Expense, ExpenseStats};
use crate::form::{ExpenseForm, FormMode};
use crate::storage::Storage;
use crate::store::ExpenseStore;
use anyhow::Result;
use tracing::{debug, info};

/// User interaction, tagged with the row it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Submit,
    Edit(i64),
    Delete(i64),
}

/// What handling an event did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Added(Expense),
    /// Edit submitted; `false` when the target no longer existed
    Updated { id: i64, found: bool },
    Deleted { id: i64, found: bool },
    EditStarted(i64),
    /// Invalid form or stale edit target; nothing changed
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRow {
    pub id: i64,
    pub description: String,
    pub category: String,
    /// Two-decimal amount, e.g. "4.50"
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListView {
    /// Placeholder shown instead of the list
    Empty,
    Rows(Vec<ExpenseRow>),
}

impl ListView {
    pub const PLACEHOLDER: &'static str = "No expenses recorded yet";

    pub fn rows(&self) -> &[ExpenseRow] {
        match self {
            ListView::Empty => &[],
            ListView::Rows(rows) => rows,
        }
    }

    /// Id of the record rendered at `index`
    pub fn id_at(&self, index: usize) -> Option<i64> {
        self.rows().get(index).map(|row| row.id)
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }
}

pub struct ViewController<S: Storage> {
    store: ExpenseStore<S>,
    pub form: ExpenseForm,
    view: ListView,
}

impl<S: Storage> ViewController<S> {
    pub fn new(store: ExpenseStore<S>) -> Self {
        let mut controller = ViewController {
            store,
            form: ExpenseForm::new(),
            view: ListView::Empty,
        };
        controller.render();
        controller
    }

    pub fn store(&self) -> &ExpenseStore<S> {
        &self.store
    }

    pub fn mode(&self) -> FormMode {
        self.form.mode()
    }

    /// Last rendered list
    pub fn view(&self) -> &ListView {
        &self.view
    }

    pub fn stats(&self) -> ExpenseStats {
        summarize(self.store.list())
    }

    /// Rebuild the whole list view from the store
    pub fn render(&mut self) -> &ListView {
        self.view = build_view(self.store.list());
        &self.view
    }

    /// Handle one event to completion. Errors only come from the storage
    /// write; the in-memory list has already changed by then.
    pub fn handle(&mut self, event: UiEvent) -> Result<Outcome> {
        debug!(?event, "Handling event");
        match event {
            UiEvent::Submit => self.submit(),
            UiEvent::Edit(id) => Ok(self.edit(id)),
            UiEvent::Delete(id) => self.delete(id),
        }
    }

    fn submit(&mut self) -> Result<Outcome> {
        let Some(input) = self.form.validate() else {
            return Ok(Outcome::Ignored);
        };

        let mode = self.form.mode();
        let result = match mode {
            FormMode::Create => self
                .store
                .add(&input.description, &input.amount, input.category)
                .map(Outcome::Added),
            FormMode::Edit(id) => self
                .store
                .update(id, &input.description, &input.amount, input.category)
                .map(|found| Outcome::Updated { id, found }),
        };

        self.render();
        self.form.reset();

        let outcome = result?;
        match &outcome {
            Outcome::Added(expense) => info!(id = expense.id, "Expense added"),
            Outcome::Updated { id, found } => info!(id, found, "Expense updated"),
            _ => {}
        }
        Ok(outcome)
    }

    fn edit(&mut self, id: i64) -> Outcome {
        match self.store.get(id) {
            Some(expense) => {
                self.form.start_edit(expense);
                Outcome::EditStarted(id)
            }
            None => {
                debug!(id, "Edit target is gone");
                Outcome::Ignored
            }
        }
    }

    fn delete(&mut self, id: i64) -> Result<Outcome> {
        let result = self.store.remove(id);
        self.render();

        let found = result?;
        info!(id, found, "Expense deleted");
        Ok(Outcome::Deleted { id, found })
    }
}

fn build_view(expenses: &[Expense]) -> ListView {
    if expenses.is_empty() {
        return ListView::Empty;
    }

    ListView::Rows(
        expenses
            .iter()
            .map(|expense| ExpenseRow {
                id: expense.id,
                description: expense.description.clone(),
                category: expense.category.to_string(),
                amount: expense.display_amount(),
            })
            .collect(),
    )
}
