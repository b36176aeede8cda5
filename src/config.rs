//! Runtime configuration resolved from the environment.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{ChatError, Result};

/// All knobs the pipeline and server need, resolved once at startup and
/// passed into constructors.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub table_name: String,
    pub default_limit: u32,
    pub ollama_url: String,
    pub model_name: String,
    pub llm_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ChatError::Config("DATABASE_URL is not set".to_string()))?;

        Ok(Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 30)?,
            table_name: std::env::var("TABLE_NAME").unwrap_or_else(|_| "students".to_string()),
            default_limit: env_or("DEFAULT_LIMIT", 50)?,
            ollama_url: std::env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434/api/generate".to_string()),
            model_name: std::env::var("MODEL_NAME").unwrap_or_else(|_| "mistral".to_string()),
            llm_timeout_secs: env_or("LLM_TIMEOUT_SECS", 60)?,
        })
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| ChatError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_uses_default_when_unset() {
        let value: u32 = env_or("DBCHAT_TEST_UNSET_VAR", 50).unwrap();
        assert_eq!(value, 50);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        std::env::set_var("DBCHAT_TEST_GARBAGE_VAR", "not-a-number");
        let result: Result<u32> = env_or("DBCHAT_TEST_GARBAGE_VAR", 10);
        assert!(result.is_err());
        std::env::remove_var("DBCHAT_TEST_GARBAGE_VAR");
    }
}
