use rusqlite::types::Value;

use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

/// Convert statement arguments into owned values that can cross to the worker thread.
#[must_use]
pub fn convert_params(params: &[RowValues]) -> Vec<Value> {
    params.iter().map(row_value_to_sqlite_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn converts_every_variant() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let converted = convert_params(&[
            RowValues::Bool(true),
            RowValues::Timestamp(ts),
            RowValues::JSON(json!({"a": 1})),
            RowValues::Null,
        ]);
        assert_eq!(
            converted,
            vec![
                Value::Integer(1),
                Value::Text("2024-01-02 03:04:05".into()),
                Value::Text(r#"{"a":1}"#.into()),
                Value::Null,
            ]
        );
    }
}
