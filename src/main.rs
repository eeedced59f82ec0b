mod cli;
mod db;
mod error;
mod fmt;
mod materializer;
mod models;
mod schedule;
mod scheduler;
mod settings;
mod store;

use clap::Parser;

use cli::lists::NamedList;
use cli::{AccountsCommands, Cli, Commands, NamedCommands, OperationsCommands, RecurringCommands};

fn init_tracing(default_level: &str) {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn named(list: NamedList, command: NamedCommands) -> error::Result<()> {
    match command {
        NamedCommands::Add { name } => cli::lists::add(list, &name),
        NamedCommands::List => cli::lists::list(list),
        NamedCommands::Delete { key } => cli::lists::delete(list, &key),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(if matches!(cli.command, Commands::Serve) { "info" } else { "warn" });

    let result = match cli.command {
        Commands::Init { data_dir, currency } => cli::init::run(data_dir, currency),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                bank,
                initial_balance,
            } => cli::accounts::add(&name, &account_type, bank.as_deref(), initial_balance),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Categories { command } => named(NamedList::Categories, command),
        Commands::PaymentMethods { command } => named(NamedList::PaymentMethods, command),
        Commands::Operations { command } => match command {
            OperationsCommands::Add {
                account,
                kind,
                label,
                amount,
                date,
                category,
                payment_method,
                comment,
            } => cli::operations::add(cli::operations::AddArgs {
                account: &account,
                kind: &kind,
                label: &label,
                amount,
                date: date.as_deref(),
                category: &category,
                payment_method: payment_method.as_deref(),
                comment: comment.as_deref(),
            }),
            OperationsCommands::List { account, month } => {
                cli::operations::list(account.as_deref(), month.as_deref())
            }
        },
        Commands::Recurring { command } => match command {
            RecurringCommands::Add {
                account,
                kind,
                label,
                amount,
                frequency,
                moment,
                start,
                end,
                duration,
                category,
                payment_method,
                comment,
            } => cli::recurring::add(cli::recurring::AddArgs {
                account: &account,
                kind: &kind,
                label: &label,
                amount,
                frequency: &frequency,
                moment,
                start: start.as_deref(),
                end: end.as_deref(),
                duration,
                category: &category,
                payment_method: payment_method.as_deref(),
                comment: comment.as_deref(),
            }),
            RecurringCommands::List { all } => cli::recurring::list(all),
            RecurringCommands::Deactivate { id } => cli::recurring::deactivate(id),
        },
        Commands::Materialize { date } => cli::materialize::run(date.as_deref()),
        Commands::Serve => cli::serve::run(),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
