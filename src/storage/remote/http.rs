//! Blocking HTTP implementation of [`RecordClient`].
//!
//! Every operation is a `POST {base_url}/tables/{table}/{operation}` with a
//! JSON body, authenticated by the project id and public key headers. The
//! response envelopes are decoded by the functions in [`super::client`].

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::storage::remote::client::{
    decode_delete, decode_fetch, decode_get, decode_write, FetchQuery, RecordClient, RemoteRecord,
};
use crate::storage::remote::fields::ID;

const PROJECT_HEADER: &str = "X-Project-Id";
const KEY_HEADER: &str = "X-Public-Key";

/// Record-service client over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpRecordClient {
    http: Client,
    base_url: String,
    project_id: String,
    public_key: String,
}

impl HttpRecordClient {
    /// Build a client for the service at `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::ConnectionFailed {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            public_key: public_key.into(),
        })
    }

    /// Build a client from remote backend settings.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(
            config.base_url.clone(),
            config.project_id.clone(),
            config.public_key.clone(),
            config.timeout,
        )
    }

    fn post(&self, table: &str, operation: &str, body: &Value) -> Result<Value, RemoteError> {
        let url = format!("{}/tables/{table}/{operation}", self.base_url);
        debug!(%url, "record service request");

        let response = self
            .http
            .post(&url)
            .header(PROJECT_HEADER, &self.project_id)
            .header(KEY_HEADER, &self.public_key)
            .json(body)
            .send()
            .map_err(|e| RemoteError::ConnectionFailed {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(json!({"success": false, "code": 404, "message": "record not found"}));
        }
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            warn!(table, operation, status = status.as_u16(), "record service error");
            return Err(RemoteError::ServerError {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .map_err(|e| RemoteError::DeserializationFailed {
                message: e.to_string(),
            })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, RemoteError> {
    serde_json::to_value(value).map_err(|e| RemoteError::SerializationFailed {
        message: e.to_string(),
    })
}

impl RecordClient for HttpRecordClient {
    fn fetch_records(&self, table: &str, query: &FetchQuery) -> Result<Vec<RemoteRecord>, RemoteError> {
        let body = self.post(table, "fetch", &to_body(query)?)?;
        decode_fetch(table, &body)
    }

    fn get_record(
        &self,
        table: &str,
        id: u64,
        fields: &[&str],
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        let body = self.post(table, "get", &json!({"id": id, "fields": fields}))?;
        decode_get(table, &body)
    }

    fn create_record(&self, table: &str, record: RemoteRecord) -> Result<RemoteRecord, RemoteError> {
        let body = self.post(table, "create", &json!({"records": [record]}))?;
        decode_write(table, "create", &body)?.ok_or_else(|| RemoteError::Rejected {
            table: table.to_string(),
            operation: "create".to_string(),
            message: "service reported a missing record".to_string(),
        })
    }

    fn update_record(
        &self,
        table: &str,
        id: u64,
        mut record: RemoteRecord,
    ) -> Result<Option<RemoteRecord>, RemoteError> {
        record.insert(ID.to_string(), id.into());
        let body = self.post(table, "update", &json!({"records": [record]}))?;
        decode_write(table, "update", &body)
    }

    fn delete_record(&self, table: &str, id: u64) -> Result<bool, RemoteError> {
        let body = self.post(table, "delete", &json!({"RecordIds": [id]}))?;
        decode_delete(table, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client =
            HttpRecordClient::new("https://records.example.com/", "p1", "k1", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url, "https://records.example.com");
    }

    #[test]
    fn test_unreachable_service_is_connection_failure() {
        let client =
            HttpRecordClient::new("http://127.0.0.1:9", "p1", "k1", Duration::from_millis(200)).unwrap();
        let err = client.delete_record("deal", 1).unwrap_err();
        assert!(matches!(err, RemoteError::ConnectionFailed { .. }));
    }
}
