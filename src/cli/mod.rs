pub mod accounts;
pub mod init;
pub mod lists;
pub mod materialize;
pub mod operations;
pub mod recurring;
pub mod serve;
pub mod status;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::db::get_connection;
use crate::error::{BudgetError, Result};
use crate::settings::get_db_path;

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| BudgetError::InvalidDate(value.to_string()))
}

pub(crate) fn parse_date_opt(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value.map(parse_date).transpose()
}

/// Validate a `YYYY-MM` month filter.
pub(crate) fn parse_month(value: &str) -> Result<String> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m").to_string())
        .map_err(|_| BudgetError::Other(format!("Invalid month: {value} (expected YYYY-MM)")))
}

pub(crate) fn open_db() -> Result<rusqlite::Connection> {
    let path = get_db_path();
    if !path.exists() {
        return Err(BudgetError::Other(format!(
            "No database at {}. Run `pennywise init` first.",
            path.display()
        )));
    }
    get_connection(&path)
}

#[derive(Parser)]
#[command(name = "pennywise", about = "Family budgeting backend with scheduled recurring operations.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for pennywise data (default: ~/Documents/pennywise)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Currency code shown next to amounts (default: EUR)
        #[arg(long)]
        currency: Option<String>,
    },
    /// Manage bank accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Manage operation categories.
    Categories {
        #[command(subcommand)]
        command: NamedCommands,
    },
    /// Manage payment methods.
    #[command(name = "payment-methods")]
    PaymentMethods {
        #[command(subcommand)]
        command: NamedCommands,
    },
    /// Record and list one-off operations.
    Operations {
        #[command(subcommand)]
        command: OperationsCommands,
    },
    /// Manage recurring operation templates.
    Recurring {
        #[command(subcommand)]
        command: RecurringCommands,
    },
    /// Run one materialization pass now.
    Materialize {
        /// Target date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Run the daily materializer in the foreground until Ctrl-C.
    Serve,
    /// Show the data directory and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a bank account.
    Add {
        /// Account name, e.g. 'Joint Checking'
        name: String,
        /// Account type: PERSONAL or JOINT
        #[arg(long = "type", default_value = "PERSONAL")]
        account_type: String,
        /// Bank name
        #[arg(long)]
        bank: Option<String>,
        /// Opening balance
        #[arg(long = "initial-balance", default_value = "0", allow_negative_numbers = true)]
        initial_balance: f64,
    },
    /// List all accounts with their current balance.
    List,
}

#[derive(Subcommand)]
pub enum NamedCommands {
    /// Add an entry.
    Add {
        /// Display name
        name: String,
    },
    /// List active entries.
    List,
    /// Delete an entry. Existing operations keep it.
    Delete {
        /// Name or ID
        key: String,
    },
}

#[derive(Subcommand)]
pub enum OperationsCommands {
    /// Record a one-off operation.
    Add {
        /// Account name or ID
        #[arg(long)]
        account: String,
        /// INCOME or EXPENSE
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        label: String,
        /// Positive amount; the type gives the sign
        #[arg(long)]
        amount: f64,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Category name or ID
        #[arg(long)]
        category: String,
        /// Payment method name or ID
        #[arg(long = "payment-method")]
        payment_method: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List operations.
    List {
        /// Account name or ID
        #[arg(long)]
        account: Option<String>,
        /// Month: YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Add a recurring template.
    Add {
        /// Account name or ID
        #[arg(long)]
        account: String,
        /// INCOME or EXPENSE
        #[arg(long = "type")]
        kind: String,
        #[arg(long)]
        label: String,
        /// Positive amount; the type gives the sign
        #[arg(long)]
        amount: f64,
        /// DAILY, WEEKLY, MONTHLY, EVERY_2_MONTHS, EVERY_3_MONTHS, EVERY_6_MONTHS, YEARLY
        #[arg(long)]
        frequency: String,
        /// ISO weekday (1-7) for WEEKLY, day of month (1-31) otherwise; ignored for DAILY
        #[arg(long, default_value = "1")]
        moment: u32,
        /// First date: YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Last date: YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        /// Maximum number of operations to create
        #[arg(long)]
        duration: Option<u32>,
        /// Category name or ID
        #[arg(long)]
        category: String,
        /// Payment method name or ID
        #[arg(long = "payment-method")]
        payment_method: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// List recurring templates.
    List {
        /// Include deactivated templates
        #[arg(long)]
        all: bool,
    },
    /// Stop a template from producing new operations.
    Deactivate {
        /// Template ID (shown in `pennywise recurring list`)
        id: i64,
    },
}
