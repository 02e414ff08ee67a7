// ── Record identity and the opaque row type ──
//
// Every ledger and registry record is carried as a `Row`: the backend's
// JSON object plus its extracted identity. The dashboard never needs the
// per-ledger schema; forms and tables address fields by name.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ── RowId ───────────────────────────────────────────────────────────

/// Backend-assigned record identifier (`_id`, or `id` on older endpoints).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── Row ─────────────────────────────────────────────────────────────

/// A domain record (purchase, broker, committee member, milling entry...).
///
/// Rows are immutable: [`with_fields`](Self::with_fields) produces a new
/// row and leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    id: Option<RowId>,
    fields: Map<String, Value>,
}

impl Row {
    /// Build a row from a JSON object, extracting `_id` / `id`.
    ///
    /// Non-object values become a row with a single `value` field so that
    /// odd server payloads still render instead of failing the page.
    pub fn from_value(value: Value) -> Self {
        let fields = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };
        let id = ["_id", "id"]
            .iter()
            .find_map(|key| match fields.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => Some(RowId::new(s.clone())),
                Some(Value::Number(n)) => Some(RowId::new(n.to_string())),
                _ => None,
            });
        Self { id, fields }
    }

    /// `None` for rows that have not been created yet.
    pub fn id(&self) -> Option<&RowId> {
        self.id.as_ref()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String rendering of a field for tables and plain output.
    pub fn display_field(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// A new row with `patch` merged over this row's fields.
    pub fn with_fields(&self, patch: Map<String, Value>) -> Self {
        let mut fields = self.fields.clone();
        fields.extend(patch);
        Self::from_value(Value::Object(fields))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}
