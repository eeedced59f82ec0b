use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{BudgetError, Result};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    account_type TEXT NOT NULL,
    bank TEXT,
    initial_balance REAL NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_deleted INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS payment_methods (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    is_deleted INTEGER DEFAULT 0
);

CREATE TABLE IF NOT EXISTS recurring_items (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    label TEXT NOT NULL,
    amount REAL NOT NULL,
    account_id INTEGER NOT NULL,
    frequency TEXT NOT NULL,
    moment INTEGER NOT NULL,
    start_date TEXT,
    end_date TEXT,
    duration INTEGER,
    category_id INTEGER NOT NULL,
    payment_method_id INTEGER,
    comment TEXT,
    is_active INTEGER DEFAULT 1,
    -- Local calendar date; anchors interval frequencies without a start date.
    created_on TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id),
    FOREIGN KEY (payment_method_id) REFERENCES payment_methods(id)
);

CREATE TABLE IF NOT EXISTS operations (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    label TEXT NOT NULL,
    amount REAL NOT NULL,
    date TEXT NOT NULL,
    account_id INTEGER NOT NULL,
    category_id INTEGER NOT NULL,
    payment_method_id INTEGER,
    comment TEXT,
    recurring_item_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (account_id) REFERENCES accounts(id),
    FOREIGN KEY (category_id) REFERENCES categories(id),
    FOREIGN KEY (payment_method_id) REFERENCES payment_methods(id),
    FOREIGN KEY (recurring_item_id) REFERENCES recurring_items(id)
);

CREATE INDEX IF NOT EXISTS idx_operations_key ON operations(account_id, date, label);

-- Backstop for the materializer's duplicate check.
CREATE UNIQUE INDEX IF NOT EXISTS idx_operations_recurring_key
    ON operations(account_id, date, label) WHERE recurring_item_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const DEFAULT_CATEGORIES: &[&str] = &[
    "Salary",
    "Loan",
    "Rent",
    "Groceries",
    "Restaurants",
    "Leisure",
    "Fuel",
    "Children",
    "Clothing",
    "Health",
    "School",
    "After-school",
    "Insurance",
    "Energy",
];

const DEFAULT_PAYMENT_METHODS: &[&str] = &["Card", "Cheque", "Transfer", "Cash"];

/// How long a connection waits for another writer's lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// (key, value) written once when the database is created.
const DEFAULT_METADATA: &[(&str, &str)] = &[("currency", "EUR")];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    seed_names(conn, "categories", DEFAULT_CATEGORIES)?;
    seed_names(conn, "payment_methods", DEFAULT_PAYMENT_METHODS)?;
    for (key, value) in DEFAULT_METADATA {
        conn.execute(
            "INSERT OR IGNORE INTO metadata (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
    }
    Ok(())
}

fn seed_names(conn: &Connection, table: &str, names: &[&str]) -> Result<()> {
    let count: i64 = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))?;
    if count == 0 {
        let sql = format!("INSERT INTO {table} (name) VALUES (?1)");
        for name in names {
            conn.execute(&sql, [name])?;
        }
    }
    Ok(())
}

pub fn get_metadata(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| row.get(0))
        .ok()
}

pub fn set_metadata(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        [key, value],
    )?;
    Ok(())
}

/// Resolve an account by numeric id or by exact name.
pub fn resolve_account(conn: &Connection, account: &str) -> Result<i64> {
    lookup_id(conn, "accounts", "", account)?.ok_or_else(|| BudgetError::UnknownAccount(account.to_string()))
}

/// Resolve a category that has not been deleted.
pub fn resolve_category(conn: &Connection, category: &str) -> Result<i64> {
    lookup_id(conn, "categories", LIVE, category)?
        .ok_or_else(|| BudgetError::UnknownCategory(category.to_string()))
}

/// Resolve a payment method that has not been deleted.
pub fn resolve_payment_method(conn: &Connection, method: &str) -> Result<i64> {
    lookup_id(conn, "payment_methods", LIVE, method)?
        .ok_or_else(|| BudgetError::UnknownPaymentMethod(method.to_string()))
}

const LIVE: &str = " AND is_deleted = 0";

fn lookup_id(conn: &Connection, table: &str, filter: &str, key: &str) -> Result<Option<i64>> {
    if let Ok(id) = key.parse::<i64>() {
        let found = conn
            .query_row(&format!("SELECT id FROM {table} WHERE id = ?1{filter}"), [id], |row| row.get(0))
            .optional()?;
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(conn
        .query_row(&format!("SELECT id FROM {table} WHERE name = ?1{filter}"), [key], |row| row.get(0))
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &[
            "accounts",
            "categories",
            "payment_methods",
            "operations",
            "recurring_items",
            "metadata",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0)).unwrap();
        assert_eq!(count, DEFAULT_CATEGORIES.len() as i64);
    }

    #[test]
    fn test_init_db_seeds_defaults() {
        let (_dir, conn) = test_db();
        let methods: i64 = conn.query_row("SELECT count(*) FROM payment_methods", [], |r| r.get(0)).unwrap();
        assert_eq!(methods, 4);
        assert_eq!(get_metadata(&conn, "currency").as_deref(), Some("EUR"));
        assert_eq!(get_metadata(&conn, "timezone"), None);
    }

    #[test]
    fn test_set_metadata_overwrites() {
        let (_dir, conn) = test_db();
        set_metadata(&conn, "currency", "USD").unwrap();
        init_db(&conn).unwrap();
        assert_eq!(get_metadata(&conn, "currency").as_deref(), Some("USD"));
        assert_eq!(get_metadata(&conn, "missing"), None);
    }

    #[test]
    fn test_resolve_by_name_or_id() {
        let (_dir, conn) = test_db();
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES ('Joint Checking', 'JOINT')",
            [],
        )
        .unwrap();
        let id = conn.last_insert_rowid();
        assert_eq!(resolve_account(&conn, "Joint Checking").unwrap(), id);
        assert_eq!(resolve_account(&conn, &id.to_string()).unwrap(), id);
        assert!(matches!(
            resolve_account(&conn, "Nope"),
            Err(BudgetError::UnknownAccount(_))
        ));
        assert!(resolve_category(&conn, "Rent").is_ok());
        assert!(matches!(
            resolve_payment_method(&conn, "Bitcoin"),
            Err(BudgetError::UnknownPaymentMethod(_))
        ));
    }

    #[test]
    fn test_resolve_skips_deleted_entries() {
        let (_dir, conn) = test_db();
        let id = resolve_category(&conn, "Fuel").unwrap();
        conn.execute("UPDATE categories SET is_deleted = 1 WHERE id = ?1", [id]).unwrap();
        assert!(matches!(resolve_category(&conn, "Fuel"), Err(BudgetError::UnknownCategory(_))));
        assert!(resolve_category(&conn, &id.to_string()).is_err());

        conn.execute("UPDATE payment_methods SET is_deleted = 1 WHERE name = 'Cheque'", []).unwrap();
        assert!(resolve_payment_method(&conn, "Cheque").is_err());
        assert!(resolve_payment_method(&conn, "Card").is_ok());
    }
}
