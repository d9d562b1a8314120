use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{GcpEndpoint, RestClient};
use crate::{RowError, StoreError, Warehouse, WarehouseRow};

pub const DEFAULT_BIGQUERY_URL: &str = "https://bigquery.googleapis.com";

/// Bound on how long `jobs.query` waits for the MERGE before answering.
const QUERY_TIMEOUT_MS: u64 = 30_000;

/// Fully-qualified table coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BigQueryTable {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl BigQueryTable {
    fn path(&self) -> String {
        format!(
            "`{}.{}.{}`",
            self.project_id, self.dataset_id, self.table_id
        )
    }
}

/// Upserts rows with a keyed `MERGE` run through `jobs.query`.
///
/// The statement matches on `(bucket, filename, generation)` when the row
/// carries a generation and on `(bucket, filename, upload_date)` otherwise,
/// so applying it again for the same key updates the existing row in place.
/// The table needs a nullable STRING `generation` column next to the result
/// columns.
#[derive(Debug, Clone)]
pub struct BigQueryWarehouse {
    rest: RestClient,
    table: BigQueryTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    #[serde(default)]
    num_dml_affected_rows: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

impl BigQueryWarehouse {
    pub fn new(endpoint: &GcpEndpoint, table: BigQueryTable) -> Result<Self, StoreError> {
        Ok(Self {
            rest: RestClient::new(endpoint)?,
            table,
        })
    }

    fn merge_request(&self, row: &WarehouseRow) -> Value {
        json!({
            "kind": "bigquery#queryRequest",
            "query": merge_statement(&self.table),
            "useLegacySql": false,
            "parameterMode": "NAMED",
            "timeoutMs": QUERY_TIMEOUT_MS,
            "queryParameters": [
                param("bucket", "STRING", Some(row.bucket.clone())),
                param("filename", "STRING", Some(row.filename.clone())),
                param("size_bytes", "INT64", Some(row.size_bytes.to_string())),
                param(
                    "upload_date",
                    "TIMESTAMP",
                    Some(row.upload_date.to_rfc3339_opts(SecondsFormat::Micros, true)),
                ),
                param("total_words", "INT64", Some(row.total_words.to_string())),
                param("top_10_words", "STRING", Some(row.top_10_words.clone())),
                param("generation", "STRING", row.generation.clone()),
            ],
        })
    }
}

fn merge_statement(table: &BigQueryTable) -> String {
    format!(
        "MERGE {table} T \
         USING (SELECT @bucket AS bucket, @filename AS filename, \
         @size_bytes AS size_bytes, @upload_date AS upload_date, \
         @total_words AS total_words, PARSE_JSON(@top_10_words) AS top_10_words, \
         @generation AS generation) S \
         ON T.bucket = S.bucket AND T.filename = S.filename \
         AND IF(S.generation IS NULL, T.upload_date = S.upload_date, T.generation = S.generation) \
         WHEN MATCHED THEN UPDATE SET size_bytes = S.size_bytes, upload_date = S.upload_date, \
         total_words = S.total_words, top_10_words = S.top_10_words \
         WHEN NOT MATCHED THEN INSERT \
         (bucket, filename, size_bytes, upload_date, total_words, top_10_words, generation) \
         VALUES (S.bucket, S.filename, S.size_bytes, S.upload_date, S.total_words, \
         S.top_10_words, S.generation)",
        table = table.path()
    )
}

/// A named scalar parameter; `None` leaves the value unset, which binds NULL.
fn param(name: &str, kind: &str, value: Option<String>) -> Value {
    let value = match value {
        Some(value) => json!({ "value": value }),
        None => json!({}),
    };
    json!({
        "name": name,
        "parameterType": { "type": kind },
        "parameterValue": value,
    })
}

fn row_errors(errors: Vec<ErrorProto>) -> Vec<RowError> {
    errors
        .into_iter()
        .map(|e| RowError {
            index: 0,
            reason: e.reason,
            message: e.message,
        })
        .collect()
}

/// Splits a failed query into a row rejection or a transport failure.
///
/// A 400 whose reasons are all `invalid`/`invalidQuery` means the statement
/// ran against the table and refused this row's values. Concurrent-update
/// conflicts, quota errors and every other status are transport failures,
/// which the workflow engine may retry.
fn classify_failure(status: StatusCode, body: &str) -> Result<Vec<RowError>, StoreError> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
    let rejected = status == StatusCode::BAD_REQUEST
        && !envelope.error.errors.is_empty()
        && envelope.error.errors.iter().all(|e| {
            matches!(e.reason.as_str(), "invalid" | "invalidQuery")
                && !e.message.contains("concurrent update")
        });

    if rejected {
        return Ok(row_errors(envelope.error.errors));
    }
    let message = if envelope.error.message.is_empty() {
        body.trim().to_string()
    } else {
        envelope.error.message
    };
    Err(StoreError::Transport(format!(
        "status {}: {}",
        status.as_u16(),
        message
    )))
}

/// Reads a 2xx `jobs.query` answer.
fn classify_success(response: QueryResponse) -> Result<Vec<RowError>, StoreError> {
    if !response.errors.is_empty() {
        return Ok(row_errors(response.errors));
    }
    if !response.job_complete {
        return Err(StoreError::Transport(format!(
            "merge did not complete within {QUERY_TIMEOUT_MS}ms"
        )));
    }
    Ok(Vec::new())
}

#[async_trait]
impl Warehouse for BigQueryWarehouse {
    async fn upsert(&self, row: &WarehouseRow) -> Result<Vec<RowError>, StoreError> {
        let url = self.rest.url(&[
            "bigquery",
            "v2",
            "projects",
            &self.table.project_id,
            "queries",
        ])?;
        let key = row.key().to_string();
        debug!(row_key = %key, table = %self.table.table_id, "bigquery_merge");

        let resp = self
            .rest
            .post(url)
            .json(&self.merge_request(row))
            .send()
            .await?;
        let status = resp.status();
        let errors = if status.is_success() {
            let response = resp.json::<QueryResponse>().await?;
            debug!(
                row_key = %key,
                affected = response.num_dml_affected_rows.as_deref().unwrap_or("0"),
                "bigquery_merge_done"
            );
            classify_success(response)?
        } else {
            let body = resp.text().await.unwrap_or_default();
            classify_failure(status, &body)?
        };

        if !errors.is_empty() {
            warn!(row_key = %key, rejected = errors.len(), "bigquery_row_rejected");
        }
        Ok(errors)
    }
}
