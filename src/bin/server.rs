//! HTTP server for the chat-to-SQL pipeline
//! Simple HTTP server using tokio and basic HTTP handling

use clap::Parser;
use dbchat::db::init_pool;
use dbchat::executor::PgExecutor;
use dbchat::llm::OllamaClient;
use dbchat::pipeline::ChatPipeline;
use dbchat::{AppConfig, ChatError};
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "dbchat-server")]
#[command(about = "Natural-language chat over the student database")]
#[command(version)]
struct Args {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Bind port
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env()?;

    let pool = init_pool(&config).await?;
    info!("database pool ready (max {} connections)", config.db_max_connections);

    let oracle = Arc::new(OllamaClient::new(
        &config.ollama_url,
        &config.model_name,
        config.llm_timeout_secs,
    )?);
    let executor = Arc::new(PgExecutor::new(pool));
    let pipeline = Arc::new(ChatPipeline::new(
        &config.table_name,
        config.default_limit,
        oracle,
        executor,
    ));

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    info!("server listening on {}:{}", args.host, args.port);

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("new connection from {}", addr);
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(handle_connection(stream, pipeline));
    }
}

async fn handle_connection(mut stream: TcpStream, pipeline: Arc<ChatPipeline>) {
    use tokio::time::{timeout, Duration};

    // Read request with timeout to prevent hanging
    let mut buffer = Vec::new();
    let mut temp_buf = [0; 8192];

    let read_result = timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut temp_buf).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    buffer.extend_from_slice(&temp_buf[..n]);
                    if let Ok(s) = std::str::from_utf8(&buffer) {
                        if s.contains("\r\n\r\n") {
                            // We have headers, check if we have the full body
                            if let Some(content_length) = extract_content_length(s) {
                                let headers_end = s.find("\r\n\r\n").unwrap() + 4;
                                if buffer.len() >= headers_end + content_length {
                                    break;
                                }
                            } else if n < temp_buf.len() {
                                break;
                            }
                        }
                    }
                    if buffer.len() > 1_000_000 {
                        break;
                    }
                }
                Err(e) => {
                    error!("failed to read from stream: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(())
    })
    .await;

    if read_result.is_err() {
        warn!("request read timeout");
        return;
    }

    if buffer.is_empty() {
        return;
    }

    match String::from_utf8(buffer) {
        Ok(request) => {
            let response = handle_request(&request, &pipeline).await;
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                error!("failed to write response: {}", e);
            }
        }
        Err(e) => {
            error!("failed to parse request as UTF-8: {}", e);
        }
    }
}

fn extract_content_length(request: &str) -> Option<usize> {
    for line in request.lines() {
        if line.to_lowercase().starts_with("content-length:") {
            if let Some(value) = line.split(':').nth(1) {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

async fn handle_request(request: &str, pipeline: &ChatPipeline) -> String {
    let lines: Vec<&str> = request.lines().collect();
    if lines.is_empty() {
        return create_response(400, "Bad Request", "{}");
    }

    let request_line = lines[0];
    let parts: Vec<&str> = request_line.split_whitespace().collect();

    if parts.len() < 2 {
        return create_response(400, "Bad Request", "{}");
    }

    let method = parts[0];
    let path = parts[1].trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    match (method, path) {
        // CORS preflight
        ("OPTIONS", _) => create_response(200, "OK", "{}"),
        ("GET", "/api/health") => {
            create_response(200, "OK", r#"{"status":"ok","service":"dbchat"}"#)
        }
        ("POST", "/chat") => {
            let body_start = request.find("\r\n\r\n").map(|i| i + 4).unwrap_or(request.len());
            let body = request[body_start..].trim();

            let json_str = if body.starts_with('{') {
                body
            } else if let Some(json_start) = body.find('{') {
                &body[json_start..]
            } else {
                ""
            };

            if json_str.is_empty() {
                return create_response(400, "Bad Request", r#"{"error":"JSON body required"}"#);
            }

            let question = match serde_json::from_str::<ChatRequest>(json_str) {
                Ok(req) => req.message.unwrap_or_default(),
                Err(_) => {
                    return create_response(400, "Bad Request", r#"{"error":"Invalid JSON body"}"#)
                }
            };

            handle_chat(&question, pipeline).await
        }
        _ => create_response(404, "Not Found", r#"{"error":"Not found"}"#),
    }
}

async fn handle_chat(question: &str, pipeline: &ChatPipeline) -> String {
    match pipeline.ask(question).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(body) => create_response(200, "OK", &body),
            Err(e) => {
                error!("failed to serialize response: {}", e);
                create_response(
                    500,
                    "Internal Server Error",
                    r#"{"error":"Failed to serialize response"}"#,
                )
            }
        },
        Err(e) => {
            let (status, status_text) = match &e {
                ChatError::EmptyQuestion | ChatError::UnsafeQuery => (400, "Bad Request"),
                _ => (500, "Internal Server Error"),
            };

            let body = match &e {
                ChatError::RepairFailed {
                    message,
                    original_sql,
                } => serde_json::json!({
                    "error": message,
                    "original_sql": original_sql,
                }),
                other => serde_json::json!({ "error": other.to_string() }),
            };

            create_response(
                status,
                status_text,
                &serde_json::to_string(&body).unwrap_or_else(|_| r#"{"error":"unknown"}"#.to_string()),
            )
        }
    }
}

fn create_response(status: u16, status_text: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {} {}\r\n\
         Content-Type: application/json\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Access-Control-Allow-Methods: GET, POST, OPTIONS\r\n\
         Access-Control-Allow-Headers: Content-Type\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        status_text,
        body.len(),
        body
    )
}
