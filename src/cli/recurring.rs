use comfy_table::{Cell, Table};

use crate::cli::{open_db, parse_date_opt};
use crate::db::{resolve_account, resolve_category, resolve_payment_method};
use crate::error::Result;
use crate::models::{Frequency, NewRecurringItem, OperationKind, RecurringItem};
use crate::store::{deactivate_template, insert_template, list_templates};

pub struct AddArgs<'a> {
    pub account: &'a str,
    pub kind: &'a str,
    pub label: &'a str,
    pub amount: f64,
    pub frequency: &'a str,
    pub moment: u32,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
    pub duration: Option<u32>,
    pub category: &'a str,
    pub payment_method: Option<&'a str>,
    pub comment: Option<&'a str>,
}

pub fn add(args: AddArgs<'_>) -> Result<()> {
    let kind: OperationKind = args.kind.parse()?;
    let frequency: Frequency = args.frequency.parse()?;
    let conn = open_db()?;

    let item = NewRecurringItem {
        kind,
        label: args.label.trim().to_string(),
        amount: args.amount,
        account_id: resolve_account(&conn, args.account)?,
        frequency,
        moment: if frequency == Frequency::Daily { 0 } else { args.moment },
        start_date: parse_date_opt(args.start)?,
        end_date: parse_date_opt(args.end)?,
        duration: args.duration,
        category_id: resolve_category(&conn, args.category)?,
        payment_method_id: args
            .payment_method
            .map(|m| resolve_payment_method(&conn, m))
            .transpose()?,
        comment: args.comment.map(str::to_string),
    };
    item.validate()?;

    let id = insert_template(&conn, &item)?;
    println!("Added recurring item {id}: '{}' {}", item.label, describe(frequency, item.moment));
    Ok(())
}

/// Human-readable schedule, e.g. "monthly on day 31".
pub fn describe(frequency: Frequency, moment: u32) -> String {
    const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];
    match frequency {
        Frequency::Daily => "daily".to_string(),
        Frequency::Weekly => {
            let day = WEEKDAYS.get(moment.saturating_sub(1) as usize).copied().unwrap_or("?");
            format!("weekly on {day}")
        }
        Frequency::Monthly => format!("monthly on day {moment}"),
        Frequency::Yearly => format!("yearly on day {moment}"),
        other => {
            let months = other.interval_months().unwrap_or(1);
            format!("every {months} months on day {moment}")
        }
    }
}

fn period(item: &RecurringItem) -> String {
    match (item.start_date, item.end_date) {
        (None, None) => String::new(),
        (Some(s), None) => format!("from {s}"),
        (None, Some(e)) => format!("until {e}"),
        (Some(s), Some(e)) => format!("{s} to {e}"),
    }
}

pub fn list(include_inactive: bool) -> Result<()> {
    let conn = open_db()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Account", "Type", "Label", "Amount", "Schedule", "Period", "Limit", "Active"]);
    for item in list_templates(&conn, include_inactive)? {
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(item.account_id),
            Cell::new(item.kind),
            Cell::new(&item.label),
            Cell::new(format!("{:.2}", item.amount)),
            Cell::new(describe(item.frequency, item.moment)),
            Cell::new(period(&item)),
            Cell::new(item.duration.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(if item.active { "yes" } else { "no" }),
        ]);
    }
    println!("Recurring items\n{table}");
    Ok(())
}

pub fn deactivate(id: i64) -> Result<()> {
    let conn = open_db()?;
    let item = deactivate_template(&conn, id)?;
    println!("Deactivated recurring item {id}: '{}'", item.label);
    Ok(())
}
