//! Transaction records and the historical-violation lookup.
//!
//! A [`Record`] is a loosely typed field map as handed over by a record
//! source (CSV row, JSON object). Rules read fields through typed accessors
//! that coerce leniently and report values that cannot be coerced as a
//! [`FieldError`] instead of panicking.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::options::ConfigError;

/// Field names consumed by the rule set.
pub mod fields {
    pub const CUSTOMER_ID: &str = "Customer_ID";
    pub const TRANSACTION_AMOUNT: &str = "Transaction_Amount";
    pub const REPORTED_AMOUNT: &str = "Reported_Amount";
    pub const IS_CROSS_CURRENCY: &str = "is_cross_currency";
    pub const ACCOUNT_BALANCE: &str = "Account_Balance";
    pub const ACCOUNT_FLAG: &str = "Account_Flag";
    pub const TRANSACTION_DATE: &str = "Transaction_Date";
    pub const CURRENCY: &str = "Currency";
    pub const IS_CROSS_BORDER: &str = "is_cross_border";
}

/// Textual date layout accepted for `Transaction_Date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

lazy_static! {
    /// Strict `YYYY-MM-DD` shape; chrono alone accepts unpadded months and days.
    static ref DATE_SHAPE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Errors building a record from external data.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Record must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Failed to parse JSON record: {0}")]
    Json(#[from] serde_json::Error),
}

/// A field value that is present but unusable for its field's type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} value '{value}' {reason}")]
pub struct FieldError {
    /// Field name (e.g. `Transaction_Date`)
    pub field: String,

    /// The raw value as rendered text
    pub value: String,

    /// Why the value was rejected
    pub reason: String,
}

impl FieldError {
    fn new(field: &str, value: &FieldValue, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// A single loosely typed field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(Decimal),
    Text(String),
}

impl FieldValue {
    /// Whether the value counts as absent (null or blank text).
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow the text payload, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Null,
            JsonValue::Bool(b) => FieldValue::Bool(*b),
            JsonValue::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map(FieldValue::Number)
                    .unwrap_or(FieldValue::Text(text))
            }
            JsonValue::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, ""),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n.normalize()),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(Decimal::from(value))
    }
}

/// One transaction, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

// Goes through `serde_json::Value` so identifiers like "0987654321" stay text.
impl<'de> Deserialize<'de> for Record {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Record::from_json_value(&value).map_err(serde::de::Error::custom)
    }
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insertion.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Build a record from a JSON object.
    pub fn from_json_value(value: &JsonValue) -> Result<Self, RecordError> {
        let object = value.as_object().ok_or_else(|| {
            let kind = match value {
                JsonValue::Array(_) => "array",
                JsonValue::String(_) => "string",
                JsonValue::Number(_) => "number",
                JsonValue::Bool(_) => "boolean",
                JsonValue::Null => "null",
                JsonValue::Object(_) => "object",
            };
            RecordError::NotAnObject(kind.to_string())
        })?;

        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect();

        Ok(Self { fields })
    }

    /// Parse a record from JSON text.
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::from_json_value(&value)
    }

    /// Build a record from parallel header and cell slices (a CSV row).
    ///
    /// Blank cells are dropped so that they read as absent fields.
    pub fn from_row<H, C>(headers: &[H], cells: &[C]) -> Self
    where
        H: AsRef<str>,
        C: AsRef<str>,
    {
        let fields = headers
            .iter()
            .zip(cells.iter())
            .filter(|(_, cell)| !cell.as_ref().trim().is_empty())
            .map(|(h, cell)| {
                (
                    h.as_ref().trim().to_string(),
                    FieldValue::Text(cell.as_ref().trim().to_string()),
                )
            })
            .collect();

        Self { fields }
    }

    /// Raw access to a field; blank values read as absent.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field).filter(|v| !v.is_blank())
    }

    /// Whether the field is present and non-blank.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Number of stored fields (including blank ones).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a field as a decimal amount.
    pub fn decimal(&self, field: &str) -> Result<Option<Decimal>, FieldError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };

        match value {
            FieldValue::Number(n) => Ok(Some(*n)),
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                Decimal::from_str(trimmed)
                    .or_else(|_| Decimal::from_scientific(trimmed))
                    .map(Some)
                    .map_err(|_| FieldError::new(field, value, "is not a decimal number"))
            }
            _ => Err(FieldError::new(field, value, "is not a decimal number")),
        }
    }

    /// Read a field as a boolean flag.
    pub fn flag(&self, field: &str) -> Result<Option<bool>, FieldError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };

        match value {
            FieldValue::Bool(b) => Ok(Some(*b)),
            FieldValue::Number(n) if n.is_zero() => Ok(Some(false)),
            FieldValue::Number(n) if *n == Decimal::ONE => Ok(Some(true)),
            FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "y" => Ok(Some(true)),
                "false" | "0" | "no" | "n" => Ok(Some(false)),
                _ => Err(FieldError::new(field, value, "is not a boolean flag")),
            },
            _ => Err(FieldError::new(field, value, "is not a boolean flag")),
        }
    }

    /// Read a field as text. Never fails; non-text values yield `None`.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_str).map(str::trim)
    }

    /// Read a field as a `YYYY-MM-DD` calendar date.
    pub fn date(&self, field: &str) -> Result<Option<NaiveDate>, FieldError> {
        let Some(value) = self.get(field) else {
            return Ok(None);
        };

        let not_a_date = || FieldError::new(field, value, "is not a valid YYYY-MM-DD date");

        let text = value.as_str().map(str::trim).ok_or_else(not_a_date)?;
        if !DATE_SHAPE.is_match(text) {
            return Err(not_a_date());
        }

        NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map(Some)
            .map_err(|_| not_a_date())
    }

    /// The customer identifier rendered as a lookup key.
    pub fn customer_id(&self) -> Option<String> {
        self.get(fields::CUSTOMER_ID).map(|v| v.to_string().trim().to_string())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Prior-violation counts per customer, owned by the caller.
///
/// The engine only ever borrows this; an absent lookup is an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalViolations {
    counts: BTreeMap<String, u32>,
}

impl HistoricalViolations {
    /// An empty lookup.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse from YAML (`customer_id: count` mapping).
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse from JSON (`{"customer_id": count}` object).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a file, choosing the parser by extension (`.json` or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    /// Set the count for a customer.
    pub fn insert(&mut self, customer_id: impl Into<String>, count: u32) {
        self.counts.insert(customer_id.into(), count);
    }

    /// Prior-violation count for a customer, if known.
    pub fn get(&self, customer_id: &str) -> Option<u32> {
        self.counts.get(customer_id).copied()
    }

    /// Number of customers with a recorded count.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no customer has a recorded count.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u32)> for HistoricalViolations {
    fn from_iter<I: IntoIterator<Item = (K, u32)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_json_object() {
        let record = Record::from_json(
            r#"{"Customer_ID": "1234567890", "Transaction_Amount": 100.50, "is_cross_border": true}"#,
        )
        .unwrap();

        assert_eq!(record.customer_id().as_deref(), Some("1234567890"));
        assert_eq!(record.decimal(fields::TRANSACTION_AMOUNT).unwrap(), Some(dec!(100.50)));
        assert_eq!(record.flag(fields::IS_CROSS_BORDER).unwrap(), Some(true));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let result = Record::from_json("[1, 2, 3]");
        assert!(matches!(result, Err(RecordError::NotAnObject(kind)) if kind == "array"));
    }

    #[test]
    fn test_from_row_drops_blank_cells() {
        let headers = ["Customer_ID", "Reported_Amount", "Currency"];
        let cells = ["42", "  ", "USD"];
        let record = Record::from_row(&headers, &cells);

        assert!(record.contains(fields::CUSTOMER_ID));
        assert!(!record.contains(fields::REPORTED_AMOUNT));
        assert_eq!(record.text(fields::CURRENCY), Some("USD"));
    }

    #[test]
    fn test_decimal_coercion_from_text() {
        let record = Record::new().with(fields::ACCOUNT_BALANCE, "-50.25");
        assert_eq!(record.decimal(fields::ACCOUNT_BALANCE).unwrap(), Some(dec!(-50.25)));
    }

    #[test]
    fn test_decimal_rejects_garbage() {
        let record = Record::new().with(fields::TRANSACTION_AMOUNT, "12 dollars");
        let err = record.decimal(fields::TRANSACTION_AMOUNT).unwrap_err();
        assert_eq!(err.field, "Transaction_Amount");
        assert_eq!(err.value, "12 dollars");
    }

    #[test]
    fn test_flag_coercion() {
        let record = Record::new()
            .with("a", "TRUE")
            .with("b", "no")
            .with("c", 1i64)
            .with("d", "maybe");

        assert_eq!(record.flag("a").unwrap(), Some(true));
        assert_eq!(record.flag("b").unwrap(), Some(false));
        assert_eq!(record.flag("c").unwrap(), Some(true));
        assert!(record.flag("d").is_err());
        assert_eq!(record.flag("missing").unwrap(), None);
    }

    #[test]
    fn test_date_requires_padded_format() {
        let ok = Record::new().with(fields::TRANSACTION_DATE, "2025-03-05");
        assert_eq!(
            ok.date(fields::TRANSACTION_DATE).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5)
        );

        let unpadded = Record::new().with(fields::TRANSACTION_DATE, "2025-3-5");
        assert!(unpadded.date(fields::TRANSACTION_DATE).is_err());

        let impossible = Record::new().with(fields::TRANSACTION_DATE, "2025-02-30");
        assert!(impossible.date(fields::TRANSACTION_DATE).is_err());
    }

    #[test]
    fn test_numeric_customer_id_is_normalized() {
        let record = Record::new().with(fields::CUSTOMER_ID, 987i64);
        assert_eq!(record.customer_id().as_deref(), Some("987"));
    }

    #[test]
    fn test_history_from_yaml() {
        let history = HistoricalViolations::from_yaml(
            "'1234567890': 3\n'0987654321': 1\n",
        )
        .unwrap();

        assert_eq!(history.get("1234567890"), Some(3));
        assert_eq!(history.get("0987654321"), Some(1));
        assert_eq!(history.get("unknown"), None);
    }
}
