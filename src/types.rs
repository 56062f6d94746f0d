use chrono::NaiveDateTime;
use serde_json::Value;

/// A single spreadsheet cell as handed over by the sheet reader
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Null,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl From<&Value> for RawCell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawCell::Null,
            Value::Bool(b) => RawCell::Bool(*b),
            Value::Number(n) => n.as_f64().map(RawCell::Number).unwrap_or(RawCell::Null),
            Value::String(s) => RawCell::Text(s.clone()),
            // Nested JSON has no spreadsheet equivalent; keep its text form
            other => RawCell::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawCell {
    fn from(value: &str) -> Self {
        RawCell::Text(value.to_string())
    }
}

impl From<String> for RawCell {
    fn from(value: String) -> Self {
        RawCell::Text(value)
    }
}

impl From<f64> for RawCell {
    fn from(value: f64) -> Self {
        RawCell::Number(value)
    }
}

impl From<i64> for RawCell {
    fn from(value: i64) -> Self {
        RawCell::Number(value as f64)
    }
}

impl From<bool> for RawCell {
    fn from(value: bool) -> Self {
        RawCell::Bool(value)
    }
}

impl From<NaiveDateTime> for RawCell {
    fn from(value: NaiveDateTime) -> Self {
        RawCell::Date(value)
    }
}

/// One spreadsheet record: headers in sheet order mapped to their raw cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, RawCell)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, cell: impl Into<RawCell>) {
        self.cells.push((header.into(), cell.into()));
    }

    /// Builder-style variant of [`Row::push`]
    pub fn with(mut self, header: impl Into<String>, cell: impl Into<RawCell>) -> Self {
        self.push(header, cell);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawCell)> {
        self.cells.iter().map(|(h, c)| (h.as_str(), c))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Build a row from a JSON object, keeping key order. Non-objects yield None.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(
            object
                .iter()
                .map(|(k, v)| (k.clone(), RawCell::from(v)))
                .collect(),
        )
    }
}

impl FromIterator<(String, RawCell)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, RawCell)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

/// Classifier gating the person-only and organisation-only field groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Organisation,
    Other,
}

impl EntityKind {
    pub fn classify(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return EntityKind::Other;
        };
        match raw.trim().to_uppercase().as_str() {
            "PERSON" => EntityKind::Person,
            "COMPANY" | "ORGANISATION" | "ORGANIZATION" => EntityKind::Organisation,
            _ => EntityKind::Other,
        }
    }

    pub fn is_organisation(self) -> bool {
        self == EntityKind::Organisation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_entity_kind() {
        assert_eq!(EntityKind::classify(Some("PERSON")), EntityKind::Person);
        assert_eq!(EntityKind::classify(Some(" person ")), EntityKind::Person);
        assert_eq!(EntityKind::classify(Some("Company")), EntityKind::Organisation);
        assert_eq!(EntityKind::classify(Some("ORGANISATION")), EntityKind::Organisation);
        assert_eq!(EntityKind::classify(Some("organization")), EntityKind::Organisation);
        assert_eq!(EntityKind::classify(Some("Vessel")), EntityKind::Other);
        assert_eq!(EntityKind::classify(None), EntityKind::Other);
    }

    #[test]
    fn test_row_from_json_keeps_key_order() {
        let row = Row::from_json(&json!({"zeta": 1, "alpha": "a", "mid": null})).unwrap();
        let headers: Vec<&str> = row.headers().collect();
        assert_eq!(headers, vec!["zeta", "alpha", "mid"]);

        let cells: Vec<&RawCell> = row.iter().map(|(_, c)| c).collect();
        assert_eq!(cells[0], &RawCell::Number(1.0));
        assert_eq!(cells[1], &RawCell::Text("a".to_string()));
        assert_eq!(cells[2], &RawCell::Null);
    }

    #[test]
    fn test_row_from_json_rejects_non_objects() {
        assert!(Row::from_json(&json!([1, 2])).is_none());
        assert!(Row::from_json(&json!("row")).is_none());
    }
}
