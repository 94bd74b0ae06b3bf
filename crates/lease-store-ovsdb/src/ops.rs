//! Lease table operations and row encoding
//!
//! Column layout of the lease table:
//!
//! | column            | OVSDB type              |
//! |-------------------|-------------------------|
//! | `expiry_time`     | string                  |
//! | `mac_address`     | string (index)          |
//! | `ip_address`      | string                  |
//! | `client_hostname` | optional string (set)   |
//! | `client_id`       | optional string (set)   |

use lease_core::{Field, LeaseRecord};
use serde_json::{Map, Value, json};

use crate::rpc::RpcError;

/// Column names in table order
pub const COLUMNS: [&str; 5] = [
    "expiry_time",
    "mac_address",
    "ip_address",
    "client_hostname",
    "client_id",
];

/// Columns declared as `{"min": 0, "max": 1}` sets
fn is_optional_column(field: Field) -> bool {
    matches!(field, Field::ClientHostname | Field::ClientId)
}

fn all_fields() -> [Field; 5] {
    [
        Field::ExpiryTime,
        Field::MacAddress,
        Field::IpAddress,
        Field::ClientHostname,
        Field::ClientId,
    ]
}

fn match_key(key: &str) -> Value {
    json!([["mac_address", "==", key]])
}

/// Row object carrying the set fields of `record`
///
/// Unset fields are left out so the server keeps its default (insert) or
/// the current value (update).
pub fn encode_row(record: &LeaseRecord) -> Value {
    let mut row = Map::new();
    for field in all_fields() {
        if let Some(value) = record.get(field) {
            row.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }
    Value::Object(row)
}

/// Decode a row from a `select` result
pub fn decode_row(row: &Value) -> Result<LeaseRecord, RpcError> {
    let object = row
        .as_object()
        .ok_or_else(|| RpcError::Malformed(format!("row is not an object: {}", row)))?;

    let mut record = LeaseRecord::default();
    for field in all_fields() {
        let value = match object.get(field.name()) {
            Some(value) => decode_column(field, value)?,
            None => None,
        };
        record.set(field, value);
    }
    Ok(record)
}

fn decode_column(field: Field, value: &Value) -> Result<Option<String>, RpcError> {
    match value {
        // Plain string columns cannot hold "absent"; the empty default stands in
        Value::String(s) if s.is_empty() && !is_optional_column(field) => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Array(parts) => match parts.as_slice() {
            [Value::String(tag), Value::Array(members)] if tag == "set" => {
                match members.as_slice() {
                    [] => Ok(None),
                    [Value::String(s)] => Ok(Some(s.clone())),
                    _ => Err(RpcError::Malformed(format!(
                        "column {} holds more than one string: {}",
                        field, value
                    ))),
                }
            }
            _ => Err(RpcError::Malformed(format!(
                "unexpected value for column {}: {}",
                field, value
            ))),
        },
        other => Err(RpcError::Malformed(format!(
            "unexpected value for column {}: {}",
            field, other
        ))),
    }
}

pub fn insert(table: &str, record: &LeaseRecord) -> Value {
    json!({ "op": "insert", "table": table, "row": encode_row(record) })
}

/// Update the row matching `key`, writing only the set fields of `changes`
pub fn update(table: &str, key: &str, changes: &LeaseRecord) -> Value {
    let mut changes = changes.clone();
    changes.mac_address = None;
    json!({
        "op": "update",
        "table": table,
        "where": match_key(key),
        "row": encode_row(&changes),
    })
}

pub fn delete(table: &str, key: &str) -> Value {
    json!({ "op": "delete", "table": table, "where": match_key(key) })
}

/// Delete every row
pub fn clear(table: &str) -> Value {
    json!({ "op": "delete", "table": table, "where": [] })
}

pub fn select_all(table: &str) -> Value {
    json!({ "op": "select", "table": table, "where": [], "columns": COLUMNS })
}

pub fn select_key(table: &str, key: &str) -> Value {
    json!({ "op": "select", "table": table, "where": match_key(key), "columns": COLUMNS })
}

/// `count` member of an update or delete result
pub fn count(result: &Value) -> Result<u64, RpcError> {
    result
        .get("count")
        .and_then(Value::as_u64)
        .ok_or_else(|| RpcError::Malformed(format!("result has no count: {}", result)))
}

/// `rows` member of a select result, decoded
pub fn rows(result: &Value) -> Result<Vec<LeaseRecord>, RpcError> {
    result
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| RpcError::Malformed(format!("result has no rows: {}", result)))?
        .iter()
        .map(decode_row)
        .collect()
}
