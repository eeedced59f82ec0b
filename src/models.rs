use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::error::BudgetError;

/// Implements text (de)serialization for a string-backed enum column.
macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: BudgetError| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Income,
    Expense,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl FromStr for OperationKind {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            _ => Err(BudgetError::InvalidKind(s.to_string())),
        }
    }
}

sql_text_enum!(OperationKind);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Personal,
    Joint,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Joint => "JOINT",
        }
    }
}

impl FromStr for AccountType {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PERSONAL" => Ok(Self::Personal),
            "JOINT" => Ok(Self::Joint),
            _ => Err(BudgetError::InvalidAccountType(s.to_string())),
        }
    }
}

sql_text_enum!(AccountType);

/// How often a recurring template produces an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Every2Months,
    Every3Months,
    Every6Months,
    Yearly,
}

impl Frequency {
    pub const ALL: [Frequency; 7] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Every2Months,
        Self::Every3Months,
        Self::Every6Months,
        Self::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Every2Months => "EVERY_2_MONTHS",
            Self::Every3Months => "EVERY_3_MONTHS",
            Self::Every6Months => "EVERY_6_MONTHS",
            Self::Yearly => "YEARLY",
        }
    }

    /// Number of calendar months between two fires, for the monthly family.
    pub fn interval_months(&self) -> Option<u32> {
        match self {
            Self::Daily | Self::Weekly => None,
            Self::Monthly => Some(1),
            Self::Every2Months => Some(2),
            Self::Every3Months => Some(3),
            Self::Every6Months => Some(6),
            Self::Yearly => Some(12),
        }
    }
}

impl FromStr for Frequency {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| BudgetError::InvalidFrequency(s.to_string()))
    }
}

sql_text_enum!(Frequency);

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub account_type: AccountType,
    pub bank: Option<String>,
    pub initial_balance: f64,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub id: i64,
    pub kind: OperationKind,
    pub label: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub account_id: i64,
    pub category_id: i64,
    pub payment_method_id: Option<i64>,
    pub comment: Option<String>,
    /// Set only on operations produced by the materializer.
    pub recurring_item_id: Option<i64>,
}

/// An operation staged for insertion.
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub kind: OperationKind,
    pub label: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub account_id: i64,
    pub category_id: i64,
    pub payment_method_id: Option<i64>,
    pub comment: Option<String>,
    pub recurring_item_id: Option<i64>,
}

/// A recurring template. Never mutated by the materializer.
#[derive(Debug, Clone)]
pub struct RecurringItem {
    pub id: i64,
    pub kind: OperationKind,
    pub label: String,
    pub amount: f64,
    pub account_id: i64,
    pub frequency: Frequency,
    /// ISO weekday (1-7) for weekly, day of month (1-31) for the monthly family.
    pub moment: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub category_id: i64,
    pub payment_method_id: Option<i64>,
    pub comment: Option<String>,
    pub active: bool,
    pub created_on: NaiveDate,
}

impl RecurringItem {
    /// Date from which interval frequencies count elapsed months.
    pub fn anchor(&self) -> NaiveDate {
        self.start_date.unwrap_or(self.created_on)
    }

    pub fn to_operation(&self, date: NaiveDate) -> NewOperation {
        NewOperation {
            kind: self.kind,
            label: self.label.clone(),
            amount: self.amount,
            date,
            account_id: self.account_id,
            category_id: self.category_id,
            payment_method_id: self.payment_method_id,
            comment: self.comment.clone(),
            recurring_item_id: Some(self.id),
        }
    }
}

/// Input for a new recurring template, validated before insert.
#[derive(Debug, Clone)]
pub struct NewRecurringItem {
    pub kind: OperationKind,
    pub label: String,
    pub amount: f64,
    pub account_id: i64,
    pub frequency: Frequency,
    pub moment: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration: Option<u32>,
    pub category_id: i64,
    pub payment_method_id: Option<i64>,
    pub comment: Option<String>,
}

pub const MAX_LABEL_LEN: usize = 255;

impl NewRecurringItem {
    /// Input checks done before a template reaches the store. The materializer
    /// relies on them and only clamps month lengths itself.
    pub fn validate(&self) -> crate::error::Result<()> {
        let label = self.label.trim();
        if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
            return Err(BudgetError::Other(format!(
                "Label must be 1 to {MAX_LABEL_LEN} characters"
            )));
        }
        if !(self.amount > 0.0) {
            return Err(BudgetError::Other(
                "Amount must be positive; use the operation type for the sign".to_string(),
            ));
        }
        let allowed = match self.frequency {
            Frequency::Daily => None,
            Frequency::Weekly => Some((1, 7, "expected an ISO weekday, 1 = Monday to 7 = Sunday")),
            _ => Some((1, 31, "expected a day of month between 1 and 31")),
        };
        if let Some((min, max, reason)) = allowed {
            if !(min..=max).contains(&self.moment) {
                return Err(BudgetError::InvalidMoment {
                    frequency: self.frequency.to_string(),
                    moment: self.moment,
                    reason: reason.to_string(),
                });
            }
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(BudgetError::Other(format!(
                    "End date {end} is before start date {start}"
                )));
            }
        }
        if self.duration == Some(0) {
            return Err(BudgetError::Other("Duration must be at least 1".to_string()));
        }
        Ok(())
    }
}
