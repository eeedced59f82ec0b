use crate::db::{get_connection, get_metadata};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::{load_settings, DB_FILE};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());
    println!("Interval:   every {}h", settings.interval_hours);

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let currency = get_metadata(&conn, "currency");
        println!("Currency:   {}", currency.as_deref().unwrap_or("(not set)"));

        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let operations: i64 = conn.query_row("SELECT count(*) FROM operations", [], |r| r.get(0))?;
        let materialized: i64 = conn.query_row(
            "SELECT count(*) FROM operations WHERE recurring_item_id IS NOT NULL",
            [],
            |r| r.get(0),
        )?;
        let active: i64 = conn.query_row(
            "SELECT count(*) FROM recurring_items WHERE is_active = 1",
            [],
            |r| r.get(0),
        )?;
        let last: Option<String> = conn.query_row(
            "SELECT max(date) FROM operations WHERE recurring_item_id IS NOT NULL",
            [],
            |r| r.get(0),
        )?;

        println!();
        println!("Accounts:          {accounts}");
        println!("Operations:        {operations}");
        println!("  from recurring:  {materialized}");
        println!("Active recurring:  {active}");
        println!("Last materialized: {}", last.as_deref().unwrap_or("never"));
    } else {
        println!();
        println!("Database not found. Run `pennywise init` to set up.");
    }

    Ok(())
}
