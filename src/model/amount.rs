//! Normalized monetary amounts.

use serde::{Deserialize, Serialize};

/// Display symbol of the ledger's base asset.
pub const NATIVE_SYMBOL: &str = "XRP";

/// Drops per display unit of the native asset.
pub const DROPS_PER_NATIVE: f64 = 1_000_000.0;

/// A monetary field resolved from its wire shape.
///
/// The wire carries native amounts as a plain string of drops and issued
/// amounts as an object. The classifier resolves the shape once; nothing
/// downstream looks at the raw JSON again. Native drops are kept as the
/// wire text so a malformed value still carries its currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurrencyAmount {
    /// Native asset, drops as sent on the wire.
    Native { drops: String },
    /// Issuer-scoped asset with an arbitrary-precision decimal value.
    Issued {
        value: String,
        currency: String,
        issuer: Option<String>,
    },
}

/// Failure to turn an amount into a native-equivalent number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unparsable {currency} amount {value:?}")]
pub struct AmountParseError {
    pub value: String,
    pub currency: String,
}

impl CurrencyAmount {
    pub fn native(drops: i64) -> Self {
        Self::Native {
            drops: drops.to_string(),
        }
    }

    /// Native amount from unvalidated wire text.
    pub fn native_text(drops: impl Into<String>) -> Self {
        Self::Native {
            drops: drops.into(),
        }
    }

    pub fn issued(value: impl Into<String>, currency: impl Into<String>, issuer: Option<&str>) -> Self {
        Self::Issued {
            value: value.into(),
            currency: currency.into(),
            issuer: issuer.map(str::to_string),
        }
    }

    /// Label used for the currency histogram.
    pub fn currency_label(&self) -> &str {
        match self {
            Self::Native { .. } => NATIVE_SYMBOL,
            Self::Issued { currency, .. } => currency,
        }
    }

    #[inline]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }

    /// Amount in native display units, when the amount is denominated in the
    /// native asset.
    ///
    /// Returns `Ok(None)` for issued currencies other than the native symbol
    /// and an error when native drops are not an integer or an issued
    /// native-symbol value does not parse.
    pub fn native_equivalent(&self) -> Result<Option<f64>, AmountParseError> {
        match self {
            Self::Native { drops } => match drops.trim().parse::<i64>() {
                Ok(drops) => Ok(Some(drops as f64 / DROPS_PER_NATIVE)),
                Err(_) => Err(AmountParseError {
                    value: drops.clone(),
                    currency: NATIVE_SYMBOL.to_string(),
                }),
            },
            Self::Issued { value, currency, .. } if currency == NATIVE_SYMBOL => {
                match value.trim().parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(Some(v)),
                    _ => Err(AmountParseError {
                        value: value.clone(),
                        currency: currency.clone(),
                    }),
                }
            }
            Self::Issued { .. } => Ok(None),
        }
    }
}
