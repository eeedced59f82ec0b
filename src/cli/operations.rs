use comfy_table::{Cell, Table};

use crate::cli::{open_db, parse_date_opt, parse_month};
use crate::db::{get_metadata, resolve_account, resolve_category, resolve_payment_method};
use crate::error::{BudgetError, Result};
use crate::fmt::{money, signed};
use crate::models::{NewOperation, OperationKind, MAX_LABEL_LEN};
use crate::store::{insert_operation, list_operations};

pub struct AddArgs<'a> {
    pub account: &'a str,
    pub kind: &'a str,
    pub label: &'a str,
    pub amount: f64,
    pub date: Option<&'a str>,
    pub category: &'a str,
    pub payment_method: Option<&'a str>,
    pub comment: Option<&'a str>,
}

pub fn add(args: AddArgs<'_>) -> Result<()> {
    let kind: OperationKind = args.kind.parse()?;
    let date = parse_date_opt(args.date)?.unwrap_or_else(|| crate::schedule::today());
    let label = args.label.trim();
    if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
        return Err(BudgetError::Other(format!("Label must be 1 to {MAX_LABEL_LEN} characters")));
    }
    if !(args.amount > 0.0) {
        return Err(BudgetError::Other(
            "Amount must be positive; use --type for the sign".to_string(),
        ));
    }

    let conn = open_db()?;
    let op = NewOperation {
        kind,
        label: label.to_string(),
        amount: args.amount,
        date,
        account_id: resolve_account(&conn, args.account)?,
        category_id: resolve_category(&conn, args.category)?,
        payment_method_id: args
            .payment_method
            .map(|m| resolve_payment_method(&conn, m))
            .transpose()?,
        comment: args.comment.map(str::to_string),
        recurring_item_id: None,
    };
    let id = insert_operation(&conn, &op)?;
    println!("Added operation {id}: {label} on {date}");
    Ok(())
}

pub fn list(account: Option<&str>, month: Option<&str>) -> Result<()> {
    let conn = open_db()?;
    let account_id = account.map(|a| resolve_account(&conn, a)).transpose()?;
    let month = month.map(parse_month).transpose()?;
    let currency = get_metadata(&conn, "currency").unwrap_or_else(|| "EUR".to_string());

    let ops = list_operations(&conn, account_id, month.as_deref())?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Account", "Label", "Amount", "Source"]);
    for op in &ops {
        table.add_row(vec![
            Cell::new(op.id),
            Cell::new(op.date),
            Cell::new(op.account_id),
            Cell::new(&op.label),
            Cell::new(money(signed(op.kind, op.amount), &currency)),
            Cell::new(match op.recurring_item_id {
                Some(id) => format!("recurring #{id}"),
                None => "manual".to_string(),
            }),
        ]);
    }
    let net: f64 = ops.iter().map(|op| signed(op.kind, op.amount)).sum();
    println!("Operations\n{table}");
    println!("Net: {}", money(net, &currency));
    Ok(())
}
