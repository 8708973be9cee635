//! Record-service collaborator contract.
//!
//! The remote backend stores each record kind in a named table and speaks
//! flat JSON records. [`RecordClient`] is the seam: the HTTP client
//! implements it for production and tests substitute an in-process fake.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RemoteError;

/// A flat record as exchanged with the record service.
pub type RemoteRecord = serde_json::Map<String, Value>;

/// Default page size for fetches.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Paging window for fetch calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

/// Comparison applied by a where clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhereOperator {
    EqualTo,
    ExactMatch,
    Contains,
}

/// A single filter condition on a fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereClause {
    pub field_name: String,
    pub operator: WhereOperator,
    pub values: Vec<Value>,
}

impl WhereClause {
    /// `field == value`.
    #[must_use]
    pub fn equal_to(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field_name: field.to_string(),
            operator: WhereOperator::EqualTo,
            values: vec![value.into()],
        }
    }

    /// `field` exactly matches `value` (string comparison).
    #[must_use]
    pub fn exact_match(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field_name: field.to_string(),
            operator: WhereOperator::ExactMatch,
            values: vec![value.into()],
        }
    }

    /// Returns true if `record` satisfies this clause.
    ///
    /// Used by in-process fakes; the real service evaluates clauses itself.
    #[must_use]
    pub fn matches(&self, record: &RemoteRecord) -> bool {
        let Some(actual) = record.get(&self.field_name) else {
            return false;
        };
        self.values.iter().any(|expected| match self.operator {
            WhereOperator::EqualTo | WhereOperator::ExactMatch => actual == expected,
            WhereOperator::Contains => match (actual.as_str(), expected.as_str()) {
                (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
                _ => false,
            },
        })
    }
}

/// Parameters of a fetch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    /// Field projection.
    pub fields: Vec<String>,
    #[serde(rename = "where", default, skip_serializing_if = "Vec::is_empty")]
    pub where_clauses: Vec<WhereClause>,
    pub paging_info: PageInfo,
}

impl FetchQuery {
    /// Fetch `fields` with the given paging window.
    #[must_use]
    pub fn new(fields: &[&str], paging: PageInfo) -> Self {
        Self {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            where_clauses: Vec::new(),
            paging_info: paging,
        }
    }

    /// Adds a filter clause.
    #[must_use]
    pub fn filter(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }
}

/// Table-oriented client for the remote record service.
///
/// `Ok(None)` / `Ok(false)` mean the addressed record does not exist; the
/// stores turn that into their `NotFound` errors. Implementations never
/// retry.
pub trait RecordClient: Send + Sync {
    /// Fetch a page of records.
    fn fetch_records(&self, table: &str, query: &FetchQuery) -> Result<Vec<RemoteRecord>, RemoteError>;

    /// Get one record by id.
    fn get_record(
        &self,
        table: &str,
        id: u64,
        fields: &[&str],
    ) -> Result<Option<RemoteRecord>, RemoteError>;

    /// Create a record; returns the stored record including its `Id`.
    fn create_record(&self, table: &str, record: RemoteRecord) -> Result<RemoteRecord, RemoteError>;

    /// Merge `record` into the stored record `id`; returns the merged record.
    fn update_record(
        &self,
        table: &str,
        id: u64,
        record: RemoteRecord,
    ) -> Result<Option<RemoteRecord>, RemoteError>;

    /// Delete record `id`.
    fn delete_record(&self, table: &str, id: u64) -> Result<bool, RemoteError>;
}

/// Status code the service reports for a missing record.
const NOT_FOUND_CODE: u64 = 404;

fn envelope_ok(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn envelope_code(body: &Value) -> Option<u64> {
    body.get("code").and_then(Value::as_u64)
}

fn envelope_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string()
}

fn as_record(value: &Value, table: &str) -> Result<RemoteRecord, RemoteError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| RemoteError::DeserializationFailed {
            message: format!("expected a record object from table '{table}'"),
        })
}

fn rejected(table: &str, operation: &str, body: &Value) -> RemoteError {
    RemoteError::Rejected {
        table: table.to_string(),
        operation: operation.to_string(),
        message: envelope_message(body),
    }
}

/// Decode a fetch response envelope: `{"success": true, "data": [...]}`.
pub fn decode_fetch(table: &str, body: &Value) -> Result<Vec<RemoteRecord>, RemoteError> {
    if !envelope_ok(body) {
        return Err(rejected(table, "fetch", body));
    }
    match body.get("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(rows)) => rows.iter().map(|row| as_record(row, table)).collect(),
        Some(_) => Err(RemoteError::DeserializationFailed {
            message: format!("fetch on '{table}' returned non-array data"),
        }),
    }
}

/// Decode a get response envelope: `{"success": true, "data": {...}|null}`.
pub fn decode_get(table: &str, body: &Value) -> Result<Option<RemoteRecord>, RemoteError> {
    if !envelope_ok(body) {
        if envelope_code(body) == Some(NOT_FOUND_CODE) {
            return Ok(None);
        }
        return Err(rejected(table, "get", body));
    }
    match body.get("data") {
        None | Some(Value::Null) => Ok(None),
        Some(data) => as_record(data, table).map(Some),
    }
}

/// Decode a create/update envelope:
/// `{"success": true, "results": [{"success": true, "data": {...}}]}`.
///
/// Returns `Ok(None)` when the single result reports a missing record.
pub fn decode_write(
    table: &str,
    operation: &str,
    body: &Value,
) -> Result<Option<RemoteRecord>, RemoteError> {
    if !envelope_ok(body) {
        return Err(rejected(table, operation, body));
    }
    let result = body
        .get("results")
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or_else(|| RemoteError::DeserializationFailed {
            message: format!("{operation} on '{table}' returned no results"),
        })?;
    if !envelope_ok(result) {
        if envelope_code(result) == Some(NOT_FOUND_CODE) {
            return Ok(None);
        }
        return Err(rejected(table, operation, result));
    }
    let data = result.get("data").unwrap_or(&Value::Null);
    as_record(data, table).map(Some)
}

/// Decode a delete envelope: `{"success": true}`.
pub fn decode_delete(table: &str, body: &Value) -> Result<bool, RemoteError> {
    if envelope_ok(body) {
        return Ok(true);
    }
    if envelope_code(body) == Some(NOT_FOUND_CODE) {
        return Ok(false);
    }
    Err(rejected(table, "delete", body))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_fetch_query_wire_shape() {
        let query = FetchQuery::new(&["Id", "title"], PageInfo::default())
            .filter(WhereClause::exact_match("stage", "proposal"));
        let wire = serde_json::to_value(&query).unwrap();
        assert_eq!(wire["pagingInfo"]["limit"], 100);
        assert_eq!(wire["pagingInfo"]["offset"], 0);
        assert_eq!(wire["where"][0]["fieldName"], "stage");
        assert_eq!(wire["where"][0]["operator"], "ExactMatch");
    }

    #[test]
    fn test_where_clause_matches() {
        let mut record = RemoteRecord::new();
        record.insert("first_name".into(), json!("Anna"));
        record.insert("contact_id".into(), json!(4));

        assert!(WhereClause::equal_to("contact_id", 4).matches(&record));
        assert!(!WhereClause::equal_to("contact_id", 5).matches(&record));
        let contains = WhereClause {
            field_name: "first_name".into(),
            operator: WhereOperator::Contains,
            values: vec![json!("ann")],
        };
        assert!(contains.matches(&record));
        assert!(!WhereClause::equal_to("missing", 1).matches(&record));
    }

    #[test]
    fn test_decode_fetch() {
        let body = json!({"success": true, "data": [{"Id": 1}, {"Id": 2}]});
        assert_eq!(decode_fetch("deal", &body).unwrap().len(), 2);

        let empty = json!({"success": true});
        assert!(decode_fetch("deal", &empty).unwrap().is_empty());

        let failed = json!({"success": false, "message": "bad key"});
        let err = decode_fetch("deal", &failed).unwrap_err();
        assert!(err.to_string().contains("bad key"));
    }

    #[test]
    fn test_decode_get_not_found() {
        let body = json!({"success": false, "code": 404, "message": "missing"});
        assert_eq!(decode_get("contact", &body).unwrap(), None);

        let body = json!({"success": true, "data": null});
        assert_eq!(decode_get("contact", &body).unwrap(), None);
    }

    #[test]
    fn test_decode_write() {
        let body = json!({"success": true, "results": [{"success": true, "data": {"Id": 9}}]});
        let record = decode_write("deal", "create", &body).unwrap().unwrap();
        assert_eq!(record["Id"], 9);

        let missing = json!({"success": true, "results": [{"success": false, "code": 404}]});
        assert_eq!(decode_write("deal", "update", &missing).unwrap(), None);

        let rejected = json!({"success": true, "results": [{"success": false, "message": "invalid"}]});
        assert!(matches!(
            decode_write("deal", "update", &rejected).unwrap_err(),
            RemoteError::Rejected { .. }
        ));

        let no_results = json!({"success": true, "results": []});
        assert!(matches!(
            decode_write("deal", "create", &no_results).unwrap_err(),
            RemoteError::DeserializationFailed { .. }
        ));
    }

    #[test]
    fn test_decode_delete() {
        assert!(decode_delete("deal", &json!({"success": true})).unwrap());
        assert!(!decode_delete("deal", &json!({"success": false, "code": 404})).unwrap());
        assert!(decode_delete("deal", &json!({"success": false})).is_err());
    }
}
