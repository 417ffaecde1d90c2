//! Mapping a JSON record onto a table row
//!
//! Declared columns are pulled out of the record; whatever is left is kept
//! as JSON text in the overflow column.

use crate::config::{Table, OVERFLOW_COLUMN};
use crate::storage::{FieldValue, Row};
use serde_json::{Map, Value};

/// Split a record into a row for `table`, consuming the record
pub fn record_to_row(table: &Table, mut record: Map<String, Value>) -> serde_json::Result<Row> {
    let mut row = Row::new();

    for (name, _) in table.stored_columns() {
        match record.remove(name) {
            Some(Value::Null) | None => {}
            Some(value) => row.insert(name, to_field_value(value)?),
        }
    }

    let extra = serde_json::to_string(&Value::Object(record))?;
    row.insert(OVERFLOW_COLUMN, FieldValue::Text(extra));

    Ok(row)
}

/// Convert a JSON primitive (or nested structure) into a bindable value
pub fn to_field_value(value: Value) -> serde_json::Result<FieldValue> {
    let field = match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Integer(i64::from(b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if n.is_u64() {
                // Beyond i64: keep the exact digits
                FieldValue::Text(n.to_string())
            } else {
                FieldValue::Real(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => FieldValue::Text(s),
        nested @ (Value::Array(_) | Value::Object(_)) => {
            FieldValue::Text(serde_json::to_string(&nested)?)
        }
    };
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;
    use serde_json::json;

    fn orders_table() -> Table {
        let schema = ConfigLoader::from_value(json!({
            "orders": {
                "id": {"type": "INTEGER", "pk": true},
                "total": {"type": "REAL"},
                "note": {"type": "TEXT"},
                "customer": {"type": "INTEGER", "references": "customers", "referencesOn": "id"},
                "tags": {"references": "tags", "referencesOn": "id", "manyOn": "orderTags"}
            }
        }))
        .unwrap();
        schema.table("orders").unwrap().clone()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_declared_fields_leave_overflow() {
        let record = object(json!({
            "id": 1,
            "total": 9.5,
            "customer": 7,
            "coupon": "SPRING",
            "items": [{"sku": "a"}]
        }));

        let row = record_to_row(&orders_table(), record).unwrap();

        assert_eq!(row.get("id"), Some(&FieldValue::Integer(1)));
        assert_eq!(row.get("total"), Some(&FieldValue::Real(9.5)));
        assert_eq!(row.get("customer"), Some(&FieldValue::Integer(7)));

        let Some(FieldValue::Text(extra)) = row.get(OVERFLOW_COLUMN) else {
            panic!("overflow column missing");
        };
        let overflow: Value = serde_json::from_str(extra).unwrap();
        assert_eq!(overflow, json!({"coupon": "SPRING", "items": [{"sku": "a"}]}));
    }

    #[test]
    fn test_null_and_missing_fields_are_unset() {
        let record = object(json!({"id": 2, "note": null}));
        let row = record_to_row(&orders_table(), record).unwrap();

        assert_eq!(row.get("note"), None);
        assert_eq!(row.get("total"), None);
        assert_eq!(row.get(OVERFLOW_COLUMN), Some(&FieldValue::Text("{}".into())));
    }

    #[test]
    fn test_many_to_many_field_stays_in_overflow() {
        let record = object(json!({"id": 3, "tags": ["a", "b"]}));
        let row = record_to_row(&orders_table(), record).unwrap();

        assert_eq!(row.get("tags"), None);
        assert_eq!(
            row.get(OVERFLOW_COLUMN),
            Some(&FieldValue::Text(r#"{"tags":["a","b"]}"#.into()))
        );
    }

    #[test]
    fn test_overflow_is_last() {
        let record = object(json!({"note": "hi", "id": 4}));
        let row = record_to_row(&orders_table(), record).unwrap();
        let columns: Vec<&str> = row.columns().collect();
        assert_eq!(columns, vec!["id", "note", "extra"]);
    }

    #[test]
    fn test_field_value_conversion() {
        assert_eq!(to_field_value(json!(true)).unwrap(), FieldValue::Integer(1));
        assert_eq!(to_field_value(json!(-3)).unwrap(), FieldValue::Integer(-3));
        assert_eq!(
            to_field_value(json!(u64::MAX)).unwrap(),
            FieldValue::Text(u64::MAX.to_string())
        );
        assert_eq!(to_field_value(json!("x")).unwrap(), FieldValue::Text("x".into()));
        assert_eq!(
            to_field_value(json!({"a": 1})).unwrap(),
            FieldValue::Text(r#"{"a":1}"#.into())
        );
    }
}
