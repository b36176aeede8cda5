//! Query execution against the pooled database connection.
//!
//! A connection is checked out per call and returns to the pool on every
//! exit path, so nothing is held across the oracle round trips.

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column, Row, TypeInfo};

use crate::error::{ChatError, Result};

/// One result row: column name -> scalar value, in projection order.
pub type Record = serde_json::Map<String, Value>;

/// Seam for the database so the pipeline can run against a scripted stub
/// in tests.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>>;
}

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &PgRow) -> Record {
        let mut record = Record::new();

        for column in row.columns() {
            let name = column.name();
            let type_name = column.type_info().name();

            let value: Option<Value> = match type_name {
                "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                    .try_get::<Option<String>, _>(name)
                    .ok()
                    .flatten()
                    .map(|s| json!(s)),
                "INT2" => row
                    .try_get::<Option<i16>, _>(name)
                    .ok()
                    .flatten()
                    .map(|i| json!(i)),
                "INT4" => row
                    .try_get::<Option<i32>, _>(name)
                    .ok()
                    .flatten()
                    .map(|i| json!(i)),
                "INT8" => row
                    .try_get::<Option<i64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|i| json!(i)),
                "FLOAT4" => row
                    .try_get::<Option<f32>, _>(name)
                    .ok()
                    .flatten()
                    .map(|f| json!(f)),
                "FLOAT8" => row
                    .try_get::<Option<f64>, _>(name)
                    .ok()
                    .flatten()
                    .map(|f| json!(f)),
                "NUMERIC" => row
                    .try_get::<Option<rust_decimal::Decimal>, _>(name)
                    .ok()
                    .flatten()
                    .map(|d| json!(d.to_string())),
                "BOOL" => row
                    .try_get::<Option<bool>, _>(name)
                    .ok()
                    .flatten()
                    .map(|b| json!(b)),
                "DATE" => row
                    .try_get::<Option<chrono::NaiveDate>, _>(name)
                    .ok()
                    .flatten()
                    .map(|d| json!(d.to_string())),
                "TIMESTAMP" => row
                    .try_get::<Option<chrono::NaiveDateTime>, _>(name)
                    .ok()
                    .flatten()
                    .map(|t| json!(t.to_string())),
                "TIMESTAMPTZ" => row
                    .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)
                    .ok()
                    .flatten()
                    .map(|t| json!(t.to_rfc3339())),
                "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(name).ok().flatten(),
                _ => None,
            };

            record.insert(name.to_string(), value.unwrap_or(Value::Null));
        }

        record
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ChatError::Database(format!("Failed to acquire connection: {}", e)))?;

        // The driver message is preserved verbatim; the repair prompt
        // forwards it to the model.
        let rows = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ChatError::Execution(e.to_string()))?;

        Ok(rows.iter().map(Self::row_to_record).collect())
    }
}
