pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod sanitize;
pub mod validate;

pub use config::AppConfig;
pub use error::{ChatError, Result};
pub use pipeline::{ChatPipeline, ChatResponse};
