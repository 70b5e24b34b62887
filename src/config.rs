// ⚙️ Settings: defaults -> expense-tracker.toml -> EXPENSE_* env -> CLI flags

use crate::storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "expense-tracker.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SQLite database file
    Sqlite,
    /// Directory of JSON files
    Json,
    /// Nothing is kept after exit
    Memory,
}

impl Backend {
    fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            "memory" => Ok(Backend::Memory),
            other => bail!("Unknown storage backend: {}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    /// Database file (sqlite) or directory (json)
    pub data_path: PathBuf,
    /// Prefix shown before amounts
    pub currency: String,
    pub log_file: PathBuf,
    pub server_bind: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            data_path: PathBuf::from("expenses.db"),
            currency: "₹".into(),
            log_file: PathBuf::from("expense-tracker.log"),
            server_bind: "127.0.0.1:3000".into(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the settings file (if present) and then the
    /// environment.
    pub fn load(settings_file: &Path) -> Result<Self> {
        Self::load_with(settings_file, |key| std::env::var(key).ok())
    }

    fn load_with(settings_file: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match fs::read_to_string(settings_file) {
            Ok(raw) => toml::from_str::<Settings>(&raw)
                .with_context(|| format!("Invalid settings file {}", settings_file.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Settings::default(),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read settings file {}", settings_file.display())
                })
            }
        };
        settings.apply_env(var)?;
        Ok(settings)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var("EXPENSE_BACKEND") {
            self.backend = Backend::parse(&v)?;
        }
        if let Some(v) = var("EXPENSE_DATA") {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = var("EXPENSE_CURRENCY") {
            self.currency = v;
        }
        if let Some(v) = var("EXPENSE_LOG_FILE") {
            self.log_file = PathBuf::from(v);
        }
        if let Some(v) = var("EXPENSE_BIND") {
            self.server_bind = v;
        }
        Ok(())
    }

    /// Command line flags win over everything else
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
        if let Some(path) = &cli.data {
            self.data_path = path.clone();
        }
        if let Some(currency) = &cli.currency {
            self.currency = currency.clone();
        }
        if let Some(log_file) = &cli.log_file {
            self.log_file = log_file.clone();
        }
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn Storage + Send>> {
        Ok(match self.backend {
            Backend::Sqlite => Box::new(SqliteStorage::open(&self.data_path)?),
            Backend::Json => Box::new(FileStorage::open(&self.data_path)?),
            Backend::Memory => Box::new(MemoryStorage::new()),
        })
    }
}

#[derive(Debug, Parser)]
#[command(name = "expense-tracker", version, about = "Track expenses from the terminal")]
pub struct Cli {
    /// Settings file to read
    #[arg(long, default_value = SETTINGS_FILE)]
    pub config: PathBuf,

    /// Database file (sqlite) or directory (json)
    #[arg(long)]
    pub data: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Symbol shown before amounts
    #[arg(long)]
    pub currency: Option<String>,

    /// Where the terminal UI writes its log
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Interactive terminal UI (default)
    Ui,
    /// Print every expense and the totals
    List,
    /// Add one expense
    Add {
        description: String,
        amount: String,
        category: String,
    },
    /// Write all expenses to a CSV file
    Export { path: PathBuf },
    /// Delete every stored expense
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_with(&dir.path().join("nope.toml"), |_| None).unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unreadable_settings_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        // A directory can't be read as a file
        let result = Settings::load_with(dir.path(), |_| None);

        assert!(result.is_err());
        assert!(format!("{:#}", result.unwrap_err()).contains("Failed to read settings file"));
    }

    #[test]
    fn test_settings_file_partial_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "backend = \"json\"\ncurrency = \"$\"\n").unwrap();

        let settings = Settings::load_with(&path, |_| None).unwrap();

        assert_eq!(settings.backend, Backend::Json);
        assert_eq!(settings.currency, "$");
        assert_eq!(settings.data_path, PathBuf::from("expenses.db"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(&path, "backend = \"json\"\n").unwrap();
        let env: HashMap<&str, &str> = [("EXPENSE_BACKEND", "Memory"), ("EXPENSE_CURRENCY", "€")]
            .into_iter()
            .collect();

        let settings = Settings::load_with(&path, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(settings.backend, Backend::Memory);
        assert_eq!(settings.currency, "€");
    }

    #[test]
    fn test_env_rejects_unknown_backend() {
        let mut settings = Settings::default();
        let result = settings.apply_env(|key| (key == "EXPENSE_BACKEND").then(|| "mongo".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from([
            "expense-tracker",
            "--backend",
            "json",
            "--data",
            "/tmp/expenses",
            "add",
            "Coffee",
            "4.50",
            "Food",
        ]);
        let mut settings = Settings::default();

        settings.apply_cli(&cli);

        assert_eq!(settings.backend, Backend::Json);
        assert_eq!(settings.data_path, PathBuf::from("/tmp/expenses"));
        assert!(matches!(cli.command, Some(Command::Add { .. })));
    }
}
