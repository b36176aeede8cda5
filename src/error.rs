use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No question provided")]
    EmptyQuestion,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Failed to generate SQL: {0}")]
    Generation(String),

    #[error("Unsafe query blocked")]
    UnsafeQuery,

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Query repair failed: {message}")]
    RepairFailed {
        message: String,
        original_sql: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
