//! Categories and payment methods: flat, named lists with soft delete.

use comfy_table::{Cell, Table};
use rusqlite::{Connection, OptionalExtension};

use crate::cli::open_db;
use crate::db::{resolve_category, resolve_payment_method};
use crate::error::{BudgetError, Result};

#[derive(Debug, Clone, Copy)]
pub enum NamedList {
    Categories,
    PaymentMethods,
}

impl NamedList {
    fn table(&self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::PaymentMethods => "payment_methods",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Categories => "Categories",
            Self::PaymentMethods => "Payment methods",
        }
    }
}

/// Add `name`, or restore it when it was deleted earlier.
pub fn insert(conn: &Connection, list: NamedList, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BudgetError::Other("Name cannot be empty".to_string()));
    }
    let existing: Option<(i64, bool)> = conn
        .query_row(
            &format!("SELECT id, is_deleted FROM {} WHERE name = ?1", list.table()),
            [name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    match existing {
        Some((_, false)) => Err(BudgetError::Other(format!("'{name}' already exists"))),
        Some((id, true)) => {
            conn.execute(&format!("UPDATE {} SET is_deleted = 0 WHERE id = ?1", list.table()), [id])?;
            Ok(id)
        }
        None => {
            conn.execute(&format!("INSERT INTO {} (name) VALUES (?1)", list.table()), [name])?;
            Ok(conn.last_insert_rowid())
        }
    }
}

/// Soft-delete an entry by id or name. Operations and templates that point
/// at it keep their reference; it just can no longer be picked.
pub fn remove(conn: &Connection, list: NamedList, key: &str) -> Result<(i64, String)> {
    let id = match list {
        NamedList::Categories => resolve_category(conn, key)?,
        NamedList::PaymentMethods => resolve_payment_method(conn, key)?,
    };
    let name: String = conn.query_row(
        &format!("SELECT name FROM {} WHERE id = ?1", list.table()),
        [id],
        |row| row.get(0),
    )?;
    conn.execute(&format!("UPDATE {} SET is_deleted = 1 WHERE id = ?1", list.table()), [id])?;
    Ok((id, name))
}

pub fn names(conn: &Connection, list: NamedList) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name FROM {} WHERE is_deleted = 0 ORDER BY name",
        list.table()
    ))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn add(list: NamedList, name: &str) -> Result<()> {
    let conn = open_db()?;
    let id = insert(&conn, list, name)?;
    println!("Added {}: {} (ID {id})", list.title().to_lowercase(), name.trim());
    Ok(())
}

pub fn delete(list: NamedList, key: &str) -> Result<()> {
    let conn = open_db()?;
    let (id, name) = remove(&conn, list, key)?;
    println!("Deleted {}: {name} (ID {id})", list.title().to_lowercase());
    Ok(())
}

pub fn list(list: NamedList) -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);
    for (id, name) in names(&conn, list)? {
        table.add_row(vec![Cell::new(id), Cell::new(name)]);
    }
    println!("{}\n{table}", list.title());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::test_db;

    #[test]
    fn test_insert_and_list() {
        let (_dir, conn) = test_db();
        insert(&conn, NamedList::Categories, "Pets").unwrap();
        let names: Vec<String> = names(&conn, NamedList::Categories)
            .unwrap()
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert!(names.contains(&"Pets".to_string()));
        assert!(names.contains(&"Rent".to_string()));
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let (_dir, conn) = test_db();
        assert!(insert(&conn, NamedList::PaymentMethods, "Cash").is_err());
        assert!(insert(&conn, NamedList::PaymentMethods, "   ").is_err());
        assert!(insert(&conn, NamedList::PaymentMethods, "Mobile pay").is_ok());
        assert_eq!(names(&conn, NamedList::PaymentMethods).unwrap().len(), 5);
    }

    #[test]
    fn test_remove_hides_entry() {
        let (_dir, conn) = test_db();
        let (id, name) = remove(&conn, NamedList::Categories, "Leisure").unwrap();
        assert_eq!(name, "Leisure");
        assert!(names(&conn, NamedList::Categories)
            .unwrap()
            .iter()
            .all(|(_, n)| n != "Leisure"));
        assert!(remove(&conn, NamedList::Categories, &id.to_string()).is_err());

        let cash = remove(&conn, NamedList::PaymentMethods, "Cash").unwrap().0;
        assert_eq!(names(&conn, NamedList::PaymentMethods).unwrap().len(), 3);
        assert_eq!(insert(&conn, NamedList::PaymentMethods, "Cash").unwrap(), cash);
        assert_eq!(names(&conn, NamedList::PaymentMethods).unwrap().len(), 4);
    }

    #[test]
    fn test_remove_keeps_existing_operations() {
        let (_dir, conn) = test_db();
        let acct = crate::store::tests::add_account(&conn, "Checking");
        let cat = crate::store::tests::category_id(&conn, "Health");
        conn.execute(
            "INSERT INTO operations (kind, label, amount, date, account_id, category_id) \
             VALUES ('EXPENSE', 'Doctor', 25.0, '2024-03-04', ?1, ?2)",
            [acct, cat],
        )
        .unwrap();

        remove(&conn, NamedList::Categories, "Health").unwrap();
        let kept: i64 = conn
            .query_row("SELECT category_id FROM operations WHERE label = 'Doctor'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(kept, cat);
    }
}
