use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use expense_tracker::{
    export_csv, logging, Category, Cli, Command, ExpenseStore, ListView, Outcome, Settings,
    Storage, UiEvent, ViewController,
};

type BoxedStorage = Box<dyn Storage + Send>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;
    settings.apply_cli(&cli);

    match cli.command.clone().unwrap_or(Command::Ui) {
        Command::Ui => run_ui_mode(&settings),
        Command::List => {
            logging::init_stderr();
            run_list(&settings)
        }
        Command::Add {
            description,
            amount,
            category,
        } => {
            logging::init_stderr();
            run_add(&settings, description, amount, &category)
        }
        Command::Export { path } => {
            logging::init_stderr();
            let store = open_store(&settings)?;
            let written = export_csv(&path, store.list())?;
            println!("✓ Exported {} expenses to {}", written, path.display());
            Ok(())
        }
        Command::Reset => {
            logging::init_stderr();
            let mut store = open_store(&settings)?;
            let count = store.len();
            store.clear()?;
            println!("✓ Cleared {} expenses", count);
            Ok(())
        }
    }
}

fn open_store(settings: &Settings) -> Result<ExpenseStore<BoxedStorage>> {
    let storage = settings.open_storage()?;
    info!(backend = ?settings.backend, path = %settings.data_path.display(), "Storage opened");
    ExpenseStore::load(storage)
}

fn run_list(settings: &Settings) -> Result<()> {
    let controller = ViewController::new(open_store(settings)?);

    match controller.view() {
        ListView::Empty => println!("{}", ListView::PLACEHOLDER),
        ListView::Rows(rows) => {
            for row in rows {
                println!(
                    "{:>15}  {:<30}  {:<14}  {}{}",
                    row.id, row.description, row.category, settings.currency, row.amount
                );
            }
        }
    }

    let stats = controller.stats();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (category, count, total) in &stats.by_category {
        println!("{:<14} {:>4}  {}{:.2}", category, count, settings.currency, total);
    }
    println!("Total: {} expenses, {}{:.2}", stats.count, settings.currency, stats.total);
    Ok(())
}

/// Goes through the same form validation as the UI
fn run_add(settings: &Settings, description: String, amount: String, category: &str) -> Result<()> {
    let mut controller = ViewController::new(open_store(settings)?);
    controller.form.description = description;
    controller.form.amount = amount;
    controller.form.category = category.parse::<Category>().ok();

    match controller.handle(UiEvent::Submit)? {
        Outcome::Added(expense) => {
            println!(
                "✓ Added {} ({}, {}{})",
                expense.description,
                expense.category,
                settings.currency,
                expense.display_amount()
            );
            Ok(())
        }
        _ => bail!(
            "Expense not added: needs a description, a non-negative amount, and one of: {}",
            Category::ALL.map(|c| c.as_str()).join(", ")
        ),
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(settings: &Settings) -> Result<()> {
    logging::init_file(&settings.log_file)?;

    let controller = ViewController::new(open_store(settings)?);
    let mut app = expense_tracker::ui::App::new(controller, settings.currency.clone());
    expense_tracker::ui::run_ui(&mut app)?;

    info!("UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the API: cargo run --bin expense-server --features server");
    std::process::exit(1);
}
