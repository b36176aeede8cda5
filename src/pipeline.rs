//! Correction orchestrator
//!
//! generate -> sanitize -> validate -> execute, with exactly one repair
//! cycle when the first execution fails.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{ChatError, Result};
use crate::executor::{Record, SqlExecutor};
use crate::llm::CompletionOracle;
use crate::prompt::PromptBuilder;
use crate::sanitize::SqlSanitizer;
use crate::validate::is_safe;

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub sql: String,
    pub result: Vec<Record>,
    pub row_count: usize,
    pub corrected: bool,
}

pub struct ChatPipeline {
    prompts: PromptBuilder,
    sanitizer: SqlSanitizer,
    oracle: Arc<dyn CompletionOracle>,
    executor: Arc<dyn SqlExecutor>,
}

impl ChatPipeline {
    pub fn new(
        table_name: &str,
        default_limit: u32,
        oracle: Arc<dyn CompletionOracle>,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        Self {
            prompts: PromptBuilder::new(table_name, default_limit),
            sanitizer: SqlSanitizer::new(table_name, default_limit),
            oracle,
            executor,
        }
    }

    /// Answer a natural-language question with the rows of one validated
    /// SELECT statement.
    pub async fn ask(&self, question: &str) -> Result<ChatResponse> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let raw = self
            .oracle
            .complete(&self.prompts.generation_prompt(question))
            .await
            .map_err(|e| ChatError::Generation(e.to_string()))?;

        let sql = self
            .sanitizer
            .sanitize(&raw)
            .ok_or_else(|| ChatError::Generation("no SELECT statement in model output".to_string()))?;

        // Safety rejections are terminal: a query that fails the gate is not
        // a broken-but-well-intentioned query and is never sent for repair.
        if !is_safe(&sql) {
            warn!(%sql, "unsafe query blocked");
            return Err(ChatError::UnsafeQuery);
        }

        info!(%sql, "executing generated query");
        match self.executor.execute(&sql).await {
            Ok(result) => Ok(ChatResponse {
                row_count: result.len(),
                sql,
                result,
                corrected: false,
            }),
            Err(ChatError::Execution(db_error)) => self.repair(&sql, &db_error).await,
            Err(e) => Err(e),
        }
    }

    /// One bounded repair cycle: feed the failing query and the database
    /// error back to the oracle, then re-sanitize, re-validate, re-execute.
    async fn repair(&self, failed_sql: &str, db_error: &str) -> Result<ChatResponse> {
        warn!(sql = %failed_sql, error = %db_error, "query failed, attempting repair");

        let repair_failed = |message: String| ChatError::RepairFailed {
            message,
            original_sql: failed_sql.to_string(),
        };

        let raw = self
            .oracle
            .complete(&self.prompts.repair_prompt(failed_sql, db_error))
            .await
            .map_err(|e| repair_failed(e.to_string()))?;

        let fixed_sql = match self.sanitizer.sanitize(&raw) {
            Some(sql) if is_safe(&sql) => sql,
            _ => return Err(repair_failed("could not fix query".to_string())),
        };

        info!(%fixed_sql, "executing repaired query");
        match self.executor.execute(&fixed_sql).await {
            Ok(result) => Ok(ChatResponse {
                row_count: result.len(),
                sql: fixed_sql,
                result,
                corrected: true,
            }),
            Err(e) => Err(repair_failed(e.to_string())),
        }
    }
}
