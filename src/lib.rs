// Expense Tracker - Core Library
// Exposes the store and view-controller for the terminal UI, the CLI, and the API server

pub mod config;
pub mod controller;
pub mod expense;
pub mod export;
pub mod form;
pub mod logging;
pub mod storage;
pub mod store;

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use config::{Backend, Cli, Command, Settings};
pub use controller::{ExpenseRow, ListView, Outcome, UiEvent, ViewController};
pub use expense::{format_amount, parse_amount, summarize, Category, Expense, ExpenseStats};
pub use export::{export_csv, write_csv};
pub use form::{ExpenseForm, FormMode, ValidInput};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage, EXPENSES_SLOT};
pub use store::ExpenseStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
