//! Display helpers for transaction fields.

use chrono::Local;

use crate::model::{ledger_time_to_utc, CurrencyAmount, DROPS_PER_NATIVE, NATIVE_SYMBOL};

const ADDRESS_HEAD: usize = 6;
const ADDRESS_TAIL: usize = 4;

/// `"1.5 XRP"` for native amounts, `"<value> <currency>"` otherwise.
pub fn format_amount(amount: &CurrencyAmount) -> String {
    match amount {
        CurrencyAmount::Native { drops } => match drops.trim().parse::<i64>() {
            Ok(drops) => format!("{} {}", drops as f64 / DROPS_PER_NATIVE, NATIVE_SYMBOL),
            Err(_) => format!("Invalid {} amount", NATIVE_SYMBOL),
        },
        CurrencyAmount::Issued {
            value, currency, ..
        } => format!("{} {}", value, currency),
    }
}

/// Local time rendering of a ledger timestamp.
pub fn format_ledger_date(date: Option<u32>) -> String {
    match date.and_then(ledger_time_to_utc) {
        Some(utc) => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "Unknown date".to_string(),
    }
}

/// Shorten an account address to `rHb9CJ...tyTh` form.
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= ADDRESS_HEAD + ADDRESS_TAIL {
        return address.to_string();
    }

    let head: String = chars[..ADDRESS_HEAD].iter().collect();
    let tail: String = chars[chars.len() - ADDRESS_TAIL..].iter().collect();
    format!("{}...{}", head, tail)
}
