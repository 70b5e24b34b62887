// 📒 Expense Store - owns the list, mirrors it to storage on every mutation

use crate::expense::{Category, Expense};
use crate::storage::{Storage, EXPENSES_SLOT};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

pub struct ExpenseStore<S: Storage> {
    storage: S,
    expenses: Vec<Expense>,
    last_id: i64,
}

impl<S: Storage> ExpenseStore<S> {
    /// Load the persisted list. An absent or malformed slot yields an empty
    /// list; only a failure to reach the storage itself is an error.
    pub fn load(storage: S) -> Result<Self> {
        let raw = storage
            .read(EXPENSES_SLOT)
            .context("Failed to read persisted expenses")?;

        let expenses = match raw {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<Expense>>(&raw) {
                Ok(expenses) => expenses,
                Err(e) => {
                    warn!(error = %e, "Persisted expenses are malformed, starting empty");
                    Vec::new()
                }
            },
        };

        let last_id = expenses.iter().map(|e| e.id).max().unwrap_or(0);
        debug!(count = expenses.len(), "Loaded expenses");

        Ok(ExpenseStore {
            storage,
            expenses,
            last_id,
        })
    }

    /// Current list in insertion order
    pub fn list(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn get(&self, id: i64) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Append a new expense and persist. The id is the creation time in ms,
    /// bumped past the last issued id when the clock has not moved on.
    pub fn add(&mut self, description: &str, amount: &str, category: Category) -> Result<Expense> {
        let id = self.next_id()?;
        let expense = Expense::new(id, description.to_string(), amount.to_string(), category);
        self.expenses.push(expense.clone());
        debug!(id, "Added expense");

        self.persist()?;
        Ok(expense)
    }

    /// Replace the fields of the expense with `id`, keeping its position.
    /// Returns `false` without touching storage if there is no such expense.
    pub fn update(
        &mut self,
        id: i64,
        description: &str,
        amount: &str,
        category: Category,
    ) -> Result<bool> {
        let Some(expense) = self.expenses.iter_mut().find(|e| e.id == id) else {
            debug!(id, "Update skipped, no such expense");
            return Ok(false);
        };

        expense.description = description.to_string();
        expense.amount = amount.to_string();
        expense.category = category;
        debug!(id, "Updated expense");

        self.persist()?;
        Ok(true)
    }

    /// Remove the expense with `id` if present. Persists either way.
    pub fn remove(&mut self, id: i64) -> Result<bool> {
        let before = self.expenses.len();
        if let Some(index) = self.expenses.iter().position(|e| e.id == id) {
            self.expenses.remove(index);
        }
        let removed = self.expenses.len() < before;
        debug!(id, removed, "Removed expense");

        self.persist()?;
        Ok(removed)
    }

    /// Serialize the whole list and overwrite the slot
    pub fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.expenses).context("Failed to serialize expenses")?;
        self.storage
            .write(EXPENSES_SLOT, &json)
            .context("Failed to persist expenses")
    }

    /// Drop the in-memory list and clear the slot
    pub fn clear(&mut self) -> Result<()> {
        self.expenses.clear();
        self.storage
            .remove(EXPENSES_SLOT)
            .context("Failed to clear persisted expenses")
    }

    /// Hand the storage back, e.g. to reload it as after a restart
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn next_id(&mut self) -> Result<i64> {
        let now = Utc::now().timestamp_millis();
        let bumped = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("Expense id space exhausted"))?;
        self.last_id = now.max(bumped);
        Ok(self.last_id)
    }
}
