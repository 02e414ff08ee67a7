// ── Form values ──
//
// Form inputs are loosely typed: a quantity box may hold "", "12.5" or
// "12.5kg" while the user is typing. `Numeric` keeps all three apart; they
// only collapse to "absent" when a payload is built for the backend.

use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::model::Row;

/// Derived totals keep four decimal places.
const TOTAL_PRECISION: f64 = 10_000.0;

/// A numeric input as typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Numeric {
    #[default]
    Unset,
    Invalid(String),
    Value(f64),
}

impl Numeric {
    /// Parse user input. Blank is `Unset`; anything that is not a finite
    /// number is `Invalid`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Unset;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Self::Value(v),
            _ => Self::Invalid(raw.to_owned()),
        }
    }

    /// The value, with unset and invalid input counting as 0.
    pub fn value_or_zero(&self) -> f64 {
        match self {
            Self::Value(v) => *v,
            Self::Unset | Self::Invalid(_) => 0.0,
        }
    }

    /// A derived total: rounded, with 0 shown as an empty field.
    pub fn total(sum: f64) -> Self {
        let rounded = (sum * TOTAL_PRECISION).round() / TOTAL_PRECISION;
        if rounded == 0.0 {
            Self::Unset
        } else {
            Self::Value(rounded)
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Invalid(raw) => f.write_str(raw),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

/// One form field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    #[default]
    Unset,
    Text(String),
    Number(Numeric),
    Bool(bool),
    /// Repeating group (e.g. the bag / weight entries of a purchase).
    List(Vec<FormValues>),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn number(v: f64) -> Self {
        Self::Number(Numeric::Value(v))
    }

    /// Whether a required field would count as filled in.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Unset | Self::Number(Numeric::Unset) => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(entries) => entries.is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Numeric reading; anything non-numeric degrades to 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => n.value_or_zero(),
            Self::Text(s) => Numeric::parse(s).value_or_zero(),
            Self::Unset | Self::Bool(_) | Self::List(_) => 0.0,
        }
    }

    /// Text reading of a scalar.
    pub fn as_text(&self) -> String {
        match self {
            Self::Unset | Self::List(_) => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Unset,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_f64().map_or(Self::Unset, Self::number),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::List(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => FormValues::from_map(map),
                        scalar => {
                            let mut entry = FormValues::new();
                            entry.set("value", Self::from_json(scalar));
                            entry
                        }
                    })
                    .collect(),
            ),
            Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// JSON for a payload; `None` means "leave the key out".
    fn to_json(&self) -> Option<Value> {
        match self {
            Self::Unset | Self::Number(Numeric::Unset | Numeric::Invalid(_)) => None,
            Self::Text(s) => Some(Value::String(s.clone())),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Number(Numeric::Value(v)) => Some(number_json(*v)),
            Self::List(entries) => Some(Value::Array(
                entries.iter().map(FormValues::to_payload).collect(),
            )),
        }
    }
}

/// Whole numbers go out as integers so `20` does not become `20.0`.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn number_json(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::Number(Number::from(v as i64))
    } else {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

/// Ordered field map of a form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues {
    fields: IndexMap<String, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fill from an existing row (edit / view).
    pub fn from_row(row: &Row) -> Self {
        Self::from_map(row.fields())
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            fields: map
                .iter()
                .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.set(field, value);
        self
    }

    /// Numeric reading of a field, 0 when missing or non-numeric.
    pub fn number(&self, field: &str) -> f64 {
        self.get(field).map_or(0.0, FieldValue::as_f64)
    }

    /// Display text of a field, `""` when missing.
    pub fn display(&self, field: &str) -> String {
        self.get(field).map(FieldValue::as_text).unwrap_or_default()
    }

    pub fn entries(&self, field: &str) -> &[FormValues] {
        match self.get(field) {
            Some(FieldValue::List(entries)) => entries,
            _ => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// JSON body for create / update. Unset and unparsable numbers are
    /// left out.
    pub fn to_payload(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
                .collect(),
        )
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_keeps_unset_and_invalid_apart() {
        assert_eq!(Numeric::parse("  "), Numeric::Unset);
        assert_eq!(Numeric::parse("12kg"), Numeric::Invalid("12kg".into()));
        assert_eq!(Numeric::parse(" 5.5 "), Numeric::Value(5.5));
        assert_eq!(Numeric::parse("NaN"), Numeric::Invalid("NaN".into()));
    }

    #[test]
    fn totals_round_and_blank_zero() {
        assert_eq!(Numeric::total(0.1 + 0.2).to_string(), "0.3");
        assert_eq!(Numeric::total(20.0).to_string(), "20");
        assert_eq!(Numeric::total(0.000_01).to_string(), "");
    }

    #[test]
    fn payload_omits_absent_numbers() {
        let values: FormValues = [
            ("partyName", FieldValue::text("Lakshmi Traders")),
            ("rate", FieldValue::Number(Numeric::Invalid("2,100".into()))),
            ("bags", FieldValue::Number(Numeric::Unset)),
            ("quantity", FieldValue::number(20.0)),
            ("moisture", FieldValue::number(14.5)),
            (
                "entries",
                FieldValue::List(vec![
                    FormValues::new().with("quantity", FieldValue::text("10")),
                ]),
            ),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            values.to_payload(),
            json!({
                "partyName": "Lakshmi Traders",
                "quantity": 20,
                "moisture": 14.5,
                "entries": [{"quantity": "10"}],
            })
        );
    }

    #[test]
    fn from_row_reads_nested_entries() {
        let row = Row::from_value(json!({
            "_id": "p1",
            "quantity": 15.5,
            "entries": [{"quantity": "10"}, {"quantity": 5.5}],
        }));
        let values = FormValues::from_row(&row);
        assert_eq!(values.display("quantity"), "15.5");
        assert_eq!(values.entries("entries").len(), 2);
        assert_eq!(values.entries("entries")[1].display("quantity"), "5.5");
    }
}
