use thiserror::Error;

#[derive(Error, Debug)]
pub enum BudgetError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid operation type: {0} (expected INCOME or EXPENSE)")]
    InvalidKind(String),

    #[error("Invalid account type: {0} (expected PERSONAL or JOINT)")]
    InvalidAccountType(String),

    #[error("Invalid moment {moment} for {frequency}: {reason}")]
    InvalidMoment {
        frequency: String,
        moment: u32,
        reason: String,
    },

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Materialization pass exceeded {0} ms")]
    PassTimeout(u64),

    #[error("Previous materialization pass still running")]
    PassInFlight,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BudgetError>;
