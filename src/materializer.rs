use chrono::NaiveDate;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info};

use crate::error::Result;
use crate::models::RecurringItem;
use crate::schedule::{fires_on, in_interval, within_period};
use crate::store::{insert_operation, list_active_templates, materialized_count, operation_exists};

/// Why a template produced nothing on a given date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    NotDue,
    OutOfPeriod,
    DurationReached,
    AlreadyMaterialized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub considered: usize,
    pub created: usize,
    pub not_due: usize,
    pub out_of_period: usize,
    pub duration_reached: usize,
    pub already_materialized: usize,
}

impl MaterializeReport {
    fn record(&mut self, skip: Skip) {
        match skip {
            Skip::NotDue => self.not_due += 1,
            Skip::OutOfPeriod => self.out_of_period += 1,
            Skip::DurationReached => self.duration_reached += 1,
            Skip::AlreadyMaterialized => self.already_materialized += 1,
        }
    }
}

/// Check the calendar and bound rules that need no database access.
pub fn schedule_check(item: &RecurringItem, date: NaiveDate) -> std::result::Result<(), Skip> {
    if !fires_on(item.frequency, item.moment, date) || !in_interval(item.frequency, item.anchor(), date) {
        return Err(Skip::NotDue);
    }
    if !within_period(item.start_date, item.end_date, date) {
        return Err(Skip::OutOfPeriod);
    }
    Ok(())
}

fn check(conn: &Connection, item: &RecurringItem, date: NaiveDate) -> Result<std::result::Result<(), Skip>> {
    if let Err(skip) = schedule_check(item, date) {
        return Ok(Err(skip));
    }
    if let Some(limit) = item.duration {
        if materialized_count(conn, item.id)? >= limit {
            return Ok(Err(Skip::DurationReached));
        }
    }
    if operation_exists(conn, item.account_id, date, &item.label)? {
        return Ok(Err(Skip::AlreadyMaterialized));
    }
    Ok(Ok(()))
}

/// Run one materialization pass for `date`.
///
/// Every active template that fires on `date` and has no operation yet for
/// its (account, date, label) gets one. All inserts share one transaction:
/// either the whole pass is committed or nothing is.
///
/// The write lock is taken up front so a busy database makes the pass wait
/// on the connection's busy timeout rather than fail on its first insert.
pub fn materialize(conn: &mut Connection, date: NaiveDate) -> Result<MaterializeReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = MaterializeReport::default();

    for item in list_active_templates(&tx)? {
        report.considered += 1;
        match check(&tx, &item, date)? {
            Err(skip) => {
                debug!(template = item.id, label = %item.label, ?skip, "template skipped");
                report.record(skip);
            }
            Ok(()) => {
                let op_id = insert_operation(&tx, &item.to_operation(date))?;
                debug!(template = item.id, operation = op_id, label = %item.label, "operation created");
                report.created += 1;
            }
        }
    }

    tx.commit()?;
    info!(
        %date,
        considered = report.considered,
        created = report.created,
        "materialization pass committed"
    );
    Ok(report)
}
