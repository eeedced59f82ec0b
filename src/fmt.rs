use crate::models::OperationKind;

/// Format an amount with thousands separators and the currency code: 1,234.56 EUR
pub fn money(val: f64, currency: &str) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();
    let sign = if negative { "-" } else { "" };
    format!("{sign}{with_commas}.{dec_part} {currency}")
}

/// Amount as it affects the balance: expenses are shown negative.
pub fn signed(kind: OperationKind, amount: f64) -> f64 {
    match kind {
        OperationKind::Income => amount,
        OperationKind::Expense => -amount,
    }
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
