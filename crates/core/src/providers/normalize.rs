//! Shape-variance adapter for provider responses.
//!
//! The provider SDK is inconsistent about response shapes: enum-like fields
//! arrive either as a plain string (`"depository"`) or as an object wrapping
//! the value (`{"value": "depository"}`), and numeric fields arrive as JSON
//! numbers, numeric strings, or null. These types resolve the variance once,
//! at deserialization, so canonical models never see it.

use rust_decimal::Decimal;
use serde::Deserialize;

/// An enum-like provider field: raw string or `{value}` wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumField {
    Plain(String),
    Tagged { value: String },
}

impl EnumField {
    /// Coerce to the underlying string value.
    pub fn into_inner(self) -> String {
        match self {
            EnumField::Plain(s) => s,
            EnumField::Tagged { value } => value,
        }
    }
}

/// A numeric provider field: number, numeric string, or null.
///
/// Missing and null values default to zero before decimal conversion —
/// a null must never propagate into a stored decimal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumField {
    Num(f64),
    Text(String),
    Null(Option<()>),
}

impl NumField {
    /// Coerce to a `Decimal`, defaulting to zero when absent or unparseable.
    pub fn to_decimal(&self) -> Decimal {
        match self {
            NumField::Num(n) => Decimal::try_from(*n).unwrap_or(Decimal::ZERO),
            NumField::Text(s) => s.parse().unwrap_or(Decimal::ZERO),
            NumField::Null(_) => Decimal::ZERO,
        }
    }

    /// Coerce to `Some(Decimal)` only when a value is actually present.
    pub fn to_decimal_opt(&self) -> Option<Decimal> {
        match self {
            NumField::Null(_) => None,
            other => Some(other.to_decimal()),
        }
    }
}

impl Default for NumField {
    fn default() -> Self {
        NumField::Null(None)
    }
}

/// Coerce an optional enum-like field to its string value.
pub fn enum_to_string(field: Option<EnumField>) -> Option<String> {
    field.map(EnumField::into_inner)
}

/// Coerce an optional currency code, defaulting to USD when the provider
/// omits it.
pub fn currency_or_default(code: Option<String>) -> String {
    code.filter(|c| !c.is_empty())
        .unwrap_or_else(|| "USD".to_string())
}
