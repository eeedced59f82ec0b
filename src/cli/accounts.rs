use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::cli::open_db;
use crate::db::get_metadata;
use crate::error::Result;
use crate::fmt::{money, signed};
use crate::models::{AccountType, OperationKind};
use crate::store::list_accounts;

pub fn add(name: &str, account_type: &str, bank: Option<&str>, initial_balance: f64) -> Result<()> {
    let account_type: AccountType = account_type.parse()?;
    let conn = open_db()?;
    conn.execute(
        "INSERT INTO accounts (name, account_type, bank, initial_balance) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, account_type, bank, initial_balance],
    )?;
    println!("Added account: {name}");
    Ok(())
}

/// Opening balance plus every income minus every expense recorded so far.
pub fn balance(conn: &Connection, account_id: i64, initial_balance: f64) -> Result<f64> {
    let mut stmt = conn.prepare("SELECT kind, SUM(amount) FROM operations WHERE account_id = ?1 GROUP BY kind")?;
    let totals: Vec<(OperationKind, f64)> = stmt
        .query_map([account_id], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(totals
        .into_iter()
        .fold(initial_balance, |acc, (kind, total)| acc + signed(kind, total)))
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let currency = get_metadata(&conn, "currency").unwrap_or_else(|| "EUR".to_string());

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Bank", "Balance"]);
    for account in list_accounts(&conn)? {
        let current = balance(&conn, account.id, account.initial_balance)?;
        table.add_row(vec![
            Cell::new(account.id),
            Cell::new(&account.name),
            Cell::new(account.account_type),
            Cell::new(account.bank.unwrap_or_default()),
            Cell::new(money(current, &currency)),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
