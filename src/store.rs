//! Row-level access to operations and recurring templates.
//!
//! Every function takes a plain `&Connection`, so the same calls work inside a
//! `rusqlite::Transaction` (which derefs to `Connection`).

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::error::{BudgetError, Result};
use crate::models::{Account, NewOperation, NewRecurringItem, Operation, RecurringItem};
use crate::schedule::today;

const RECURRING_COLUMNS: &str = "id, kind, label, amount, account_id, frequency, moment, \
     start_date, end_date, duration, category_id, payment_method_id, comment, is_active, \
     created_on";

const OPERATION_COLUMNS: &str = "id, kind, label, amount, date, account_id, category_id, \
     payment_method_id, comment, recurring_item_id";

fn recurring_from_row(row: &Row<'_>) -> rusqlite::Result<RecurringItem> {
    Ok(RecurringItem {
        id: row.get(0)?,
        kind: row.get(1)?,
        label: row.get(2)?,
        amount: row.get(3)?,
        account_id: row.get(4)?,
        frequency: row.get(5)?,
        moment: row.get(6)?,
        start_date: row.get(7)?,
        end_date: row.get(8)?,
        duration: row.get(9)?,
        category_id: row.get(10)?,
        payment_method_id: row.get(11)?,
        comment: row.get(12)?,
        active: row.get(13)?,
        created_on: row.get(14)?,
    })
}

fn operation_from_row(row: &Row<'_>) -> rusqlite::Result<Operation> {
    Ok(Operation {
        id: row.get(0)?,
        kind: row.get(1)?,
        label: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        account_id: row.get(5)?,
        category_id: row.get(6)?,
        payment_method_id: row.get(7)?,
        comment: row.get(8)?,
        recurring_item_id: row.get(9)?,
    })
}

// ---------------------------------------------------------------------------
// Recurring templates
// ---------------------------------------------------------------------------

/// All active templates, ordered by id so passes are reproducible.
pub fn list_active_templates(conn: &Connection) -> Result<Vec<RecurringItem>> {
    let sql = format!("SELECT {RECURRING_COLUMNS} FROM recurring_items WHERE is_active = 1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], recurring_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn list_templates(conn: &Connection, include_inactive: bool) -> Result<Vec<RecurringItem>> {
    if !include_inactive {
        return list_active_templates(conn);
    }
    let sql = format!("SELECT {RECURRING_COLUMNS} FROM recurring_items ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], recurring_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub fn get_template(conn: &Connection, id: i64) -> Result<Option<RecurringItem>> {
    let sql = format!("SELECT {RECURRING_COLUMNS} FROM recurring_items WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map([id], recurring_from_row)?;
    Ok(rows.next().transpose()?)
}

/// Insert a template created today, in local time.
pub fn insert_template(conn: &Connection, item: &NewRecurringItem) -> Result<i64> {
    insert_template_on(conn, item, today())
}

pub fn insert_template_on(conn: &Connection, item: &NewRecurringItem, created_on: NaiveDate) -> Result<i64> {
    conn.execute(
        "INSERT INTO recurring_items (kind, label, amount, account_id, frequency, moment, \
         start_date, end_date, duration, category_id, payment_method_id, comment, created_on) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            item.kind,
            item.label,
            item.amount,
            item.account_id,
            item.frequency,
            item.moment,
            item.start_date,
            item.end_date,
            item.duration,
            item.category_id,
            item.payment_method_id,
            item.comment,
            created_on,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Stop future materialization. The template row and its history are kept.
pub fn deactivate_template(conn: &Connection, id: i64) -> Result<RecurringItem> {
    match get_template(conn, id)? {
        None => Err(BudgetError::Other(format!("No recurring item with ID {id}"))),
        Some(item) if !item.active => Err(BudgetError::Other(format!(
            "Recurring item {id} is already inactive"
        ))),
        Some(item) => {
            conn.execute("UPDATE recurring_items SET is_active = 0 WHERE id = ?1", [id])?;
            Ok(item)
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Duplicate guard: exact match on account, date and label.
pub fn operation_exists(conn: &Connection, account_id: i64, date: NaiveDate, label: &str) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM operations WHERE account_id = ?1 AND date = ?2 AND label = ?3)",
        params![account_id, date, label],
        |row| row.get(0),
    )?;
    Ok(found)
}

pub fn insert_operation(conn: &Connection, op: &NewOperation) -> Result<i64> {
    conn.execute(
        "INSERT INTO operations (kind, label, amount, date, account_id, category_id, \
         payment_method_id, comment, recurring_item_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            op.kind,
            op.label,
            op.amount,
            op.date,
            op.account_id,
            op.category_id,
            op.payment_method_id,
            op.comment,
            op.recurring_item_id,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Number of operations the materializer has produced for a template.
pub fn materialized_count(conn: &Connection, recurring_item_id: i64) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT count(*) FROM operations WHERE recurring_item_id = ?1",
        [recurring_item_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Operations ordered by date then id, optionally narrowed to one account
/// and/or a `YYYY-MM` month.
pub fn list_operations(conn: &Connection, account_id: Option<i64>, month: Option<&str>) -> Result<Vec<Operation>> {
    let mut clauses = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(id) = account_id {
        values.push(Box::new(id));
        clauses.push(format!("account_id = ?{}", values.len()));
    }
    if let Some(m) = month {
        values.push(Box::new(format!("{m}%")));
        clauses.push(format!("date LIKE ?{}", values.len()));
    }
    let filter = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("SELECT {OPERATION_COLUMNS} FROM operations{filter} ORDER BY date, id");
    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(param_refs.as_slice(), operation_from_row)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

pub fn list_accounts(conn: &Connection) -> Result<Vec<Account>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, account_type, bank, initial_balance FROM accounts ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Account {
            id: row.get(0)?,
            name: row.get(1)?,
            account_type: row.get(2)?,
            bank: row.get(3)?,
            initial_balance: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::models::{Frequency, OperationKind};

    pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    pub(crate) fn add_account(conn: &Connection, name: &str) -> i64 {
        conn.execute(
            "INSERT INTO accounts (name, account_type) VALUES (?1, 'PERSONAL')",
            [name],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub(crate) fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }

    pub(crate) fn template(account_id: i64, category_id: i64, label: &str, frequency: Frequency, moment: u32) -> NewRecurringItem {
        NewRecurringItem {
            kind: OperationKind::Expense,
            label: label.to_string(),
            amount: 850.0,
            account_id,
            frequency,
            moment,
            start_date: None,
            end_date: None,
            duration: None,
            category_id,
            payment_method_id: None,
            comment: None,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_template_roundtrip_preserves_fields() {
        let (_dir, conn) = test_db();
        let acct = add_account(&conn, "Checking");
        let cat = category_id(&conn, "Rent");
        let mut new = template(acct, cat, "Rent", Frequency::Every3Months, 31);
        new.start_date = Some(date(2024, 1, 31));
        new.duration = Some(4);
        new.comment = Some("landlord".to_string());
        let id = insert_template(&conn, &new).unwrap();

        let item = get_template(&conn, id).unwrap().unwrap();
        assert_eq!(item.frequency, Frequency::Every3Months);
        assert_eq!(item.moment, 31);
        assert_eq!(item.start_date, Some(date(2024, 1, 31)));
        assert_eq!(item.end_date, None);
        assert_eq!(item.duration, Some(4));
        assert_eq!(item.comment.as_deref(), Some("landlord"));
        assert!(item.active);
        assert_eq!(item.created_on, today());
    }

    #[test]
    fn test_created_on_is_independent_of_utc_timestamp() {
        let (_dir, conn) = test_db();
        let acct = add_account(&conn, "Checking");
        let cat = category_id(&conn, "Insurance");
        let id = insert_template_on(
            &conn,
            &template(acct, cat, "Car insurance", Frequency::Every2Months, 1),
            date(2024, 2, 1),
        )
        .unwrap();
        // 00:30 on Feb 1 in UTC+1 is still Jan 31 in UTC.
        conn.execute(
            "UPDATE recurring_items SET created_at = '2024-01-31 23:30:00' WHERE id = ?1",
            [id],
        )
        .unwrap();

        let item = get_template(&conn, id).unwrap().unwrap();
        assert_eq!(item.created_on, date(2024, 2, 1));
        assert_eq!(item.anchor(), date(2024, 2, 1));
    }

    #[test]
    fn test_deactivate_hides_from_active_list() {
        let (_dir, conn) = test_db();
        let acct = add_account(&conn, "Checking");
        let cat = category_id(&conn, "Energy");
        let keep = insert_template(&conn, &template(acct, cat, "Power", Frequency::Monthly, 5)).unwrap();
        let stop = insert_template(&conn, &template(acct, cat, "Gas", Frequency::Monthly, 5)).unwrap();

        deactivate_template(&conn, stop).unwrap();

        let active: Vec<i64> = list_active_templates(&conn).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(active, vec![keep]);
        assert_eq!(list_templates(&conn, true).unwrap().len(), 2);
        assert!(deactivate_template(&conn, stop).is_err());
        assert!(deactivate_template(&conn, 999).is_err());
    }

    #[test]
    fn test_operation_exists_is_exact() {
        let (_dir, conn) = test_db();
        let acct = add_account(&conn, "Checking");
        let other = add_account(&conn, "Savings");
        let cat = category_id(&conn, "Rent");
        let item = get_template(
            &conn,
            insert_template(&conn, &template(acct, cat, "Rent", Frequency::Monthly, 1)).unwrap(),
        )
        .unwrap()
        .unwrap();
        insert_operation(&conn, &item.to_operation(date(2024, 5, 1))).unwrap();

        assert!(operation_exists(&conn, acct, date(2024, 5, 1), "Rent").unwrap());
        assert!(!operation_exists(&conn, acct, date(2024, 5, 1), "rent").unwrap());
        assert!(!operation_exists(&conn, acct, date(2024, 5, 2), "Rent").unwrap());
        assert!(!operation_exists(&conn, other, date(2024, 5, 1), "Rent").unwrap());
        assert_eq!(materialized_count(&conn, item.id).unwrap(), 1);
    }

    #[test]
    fn test_list_operations_filters() {
        let (_dir, conn) = test_db();
        let acct = add_account(&conn, "Checking");
        let other = add_account(&conn, "Savings");
        let cat = category_id(&conn, "Groceries");
        for (account_id, d) in [(acct, date(2024, 5, 3)), (acct, date(2024, 6, 3)), (other, date(2024, 5, 9))] {
            insert_operation(
                &conn,
                &NewOperation {
                    kind: OperationKind::Expense,
                    label: "Market".to_string(),
                    amount: 42.5,
                    date: d,
                    account_id,
                    category_id: cat,
                    payment_method_id: None,
                    comment: None,
                    recurring_item_id: None,
                },
            )
            .unwrap();
        }

        assert_eq!(list_operations(&conn, None, None).unwrap().len(), 3);
        assert_eq!(list_operations(&conn, Some(acct), None).unwrap().len(), 2);
        let may = list_operations(&conn, None, Some("2024-05")).unwrap();
        assert_eq!(may.len(), 2);
        assert!(may.iter().all(|op| op.recurring_item_id.is_none()));
        assert_eq!(list_operations(&conn, Some(other), Some("2024-06")).unwrap().len(), 0);
    }
}
