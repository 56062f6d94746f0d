use serde_json::Value;

use crate::types::RawCell;

/// The single emptiness rule behind every field-inclusion decision.
///
/// Absent values, NaN numbers, blank or `"nan"` text and zero-length
/// collections are empty. `0`, `false` and `"0"` are not.
pub trait IsEmpty {
    fn is_empty_value(&self) -> bool;
}

fn is_blank_text(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

impl IsEmpty for str {
    fn is_empty_value(&self) -> bool {
        is_blank_text(self)
    }
}

impl IsEmpty for String {
    fn is_empty_value(&self) -> bool {
        is_blank_text(self)
    }
}

impl IsEmpty for f64 {
    fn is_empty_value(&self) -> bool {
        self.is_nan()
    }
}

impl IsEmpty for RawCell {
    fn is_empty_value(&self) -> bool {
        match self {
            RawCell::Null => true,
            RawCell::Text(s) => is_blank_text(s),
            RawCell::Number(n) => n.is_nan(),
            RawCell::Bool(_) | RawCell::Date(_) => false,
        }
    }
}

impl IsEmpty for Value {
    fn is_empty_value(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => is_blank_text(s),
            Value::Array(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}

impl<T> IsEmpty for [T] {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmpty for Vec<T> {
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl<T: IsEmpty + ?Sized> IsEmpty for &T {
    fn is_empty_value(&self) -> bool {
        (**self).is_empty_value()
    }
}

impl<T: IsEmpty> IsEmpty for Option<T> {
    fn is_empty_value(&self) -> bool {
        self.as_ref().map_or(true, IsEmpty::is_empty_value)
    }
}

/// Recursively drop object keys and array items whose value is empty.
///
/// Containers emptied by the pass are dropped by their parent in turn.
pub fn strip_empty(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, strip_empty(v)))
                .filter(|(_, v)| !v.is_empty_value())
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(strip_empty)
                .filter(|v| !v.is_empty_value())
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_cells() {
        assert!(RawCell::Null.is_empty_value());
        assert!(RawCell::Text(String::new()).is_empty_value());
        assert!(RawCell::Text("  ".to_string()).is_empty_value());
        assert!(RawCell::Text("\t".to_string()).is_empty_value());
        assert!(RawCell::Text("NaN".to_string()).is_empty_value());
        assert!(RawCell::Text("nan".to_string()).is_empty_value());
        assert!(RawCell::Number(f64::NAN).is_empty_value());
        assert!(None::<&RawCell>.is_empty_value());
    }

    #[test]
    fn test_falsy_but_meaningful_cells_are_kept() {
        assert!(!RawCell::Number(0.0).is_empty_value());
        assert!(!RawCell::Bool(false).is_empty_value());
        assert!(!RawCell::Text("0".to_string()).is_empty_value());
        assert!(!RawCell::Text("nano".to_string()).is_empty_value());
    }

    #[test]
    fn test_empty_json_values() {
        assert!(json!(null).is_empty_value());
        assert!(json!("").is_empty_value());
        assert!(json!("  ").is_empty_value());
        assert!(json!("NaN").is_empty_value());
        assert!(json!([]).is_empty_value());
        assert!(json!({}).is_empty_value());

        assert!(!json!(0).is_empty_value());
        assert!(!json!(false).is_empty_value());
        assert!(!json!("0").is_empty_value());
        assert!(!json!([0]).is_empty_value());
    }

    #[test]
    fn test_empty_collections() {
        assert!(Vec::<String>::new().is_empty_value());
        assert!(!vec!["a".to_string()].is_empty_value());
        assert!(None::<String>.is_empty_value());
        assert!(Some(String::from(" ")).is_empty_value());
    }

    #[test]
    fn test_strip_empty_is_recursive() {
        let value = json!({
            "objectType": "client",
            "name": "",
            "titles": [],
            "addresses": [{"city": null, "line": " "}],
            "lists": [{"id": "A", "since": null, "hierarchy": [{"id": "A", "name": "nan"}]}],
            "active": false,
            "count": 0
        });

        let stripped = strip_empty(value);

        assert_eq!(
            stripped,
            json!({
                "objectType": "client",
                "lists": [{"id": "A", "hierarchy": [{"id": "A"}]}],
                "active": false,
                "count": 0
            })
        );
    }
}
