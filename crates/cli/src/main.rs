//! GradePilot CLI — the main entry point.
//!
//! Commands:
//! - `run`   — Execute one grading-loop invocation (blocking or streaming)
//! - `tools` — List the declared tool catalog

use anyhow::Context;
use base64::Engine;
use clap::{Parser, Subcommand};
use gradepilot_agent::{into_stream, GradingLoop};
use gradepilot_backend::AnthropicBackend;
use gradepilot_core::task::{ImageAttachment, LoopRequest, SessionContext, TaskType};
use gradepilot_tools::{default_registry, ToolDeps};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod stubs;

use config::AppConfig;

#[derive(Parser)]
#[command(
    name = "gradepilot",
    about = "GradePilot — grading agent for teachers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one grading-loop invocation
    Run {
        /// Task type (generate_feedback, surface_highlights, post_grades,
        /// analyze_trends, generate_all_feedback, custom)
        #[arg(short, long, default_value = "custom")]
        task: String,

        /// The message for the agent
        #[arg(short, long)]
        message: String,

        /// Stream events instead of waiting for the final result
        #[arg(short, long)]
        stream: bool,

        /// Image files to attach (png, jpeg, gif, webp)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Override the iteration bound
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Selected course id
        #[arg(long)]
        course_id: Option<String>,

        /// Selected assignment id
        #[arg(long)]
        assignment_id: Option<String>,

        /// Selected student id
        #[arg(long)]
        student_id: Option<String>,
    },

    /// List the declared tool catalog
    Tools,
}

/// Parse a task name through its wire format; unknown names become `custom`.
fn parse_task(name: &str) -> TaskType {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .unwrap_or(TaskType::Custom)
}

fn media_type_for(path: &PathBuf) -> anyhow::Result<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok("image/png"),
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("gif") => Ok("image/gif"),
        Some("webp") => Ok("image/webp"),
        other => anyhow::bail!("Unsupported attachment type: {other:?}"),
    }
}

fn load_attachment(path: &PathBuf) -> anyhow::Result<ImageAttachment> {
    let media_type = media_type_for(path)?;
    let bytes =
        std::fs::read(path).with_context(|| format!("reading attachment {}", path.display()))?;
    Ok(ImageAttachment {
        media_type: media_type.into(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Tools => {
            for decl in gradepilot_tools::catalog() {
                println!("{:<24} {}", decl.name, decl.description);
            }
            Ok(())
        }
        Commands::Run {
            task,
            message,
            stream,
            attach,
            max_iterations,
            course_id,
            assignment_id,
            student_id,
        } => {
            let config = AppConfig::load(&AppConfig::default_path())?;
            let api_key = config
                .api_key
                .clone()
                .context("No API key: set GRADEPILOT_API_KEY or add api_key to config.toml")?;

            let backend = Arc::new(AnthropicBackend::new(api_key)?);
            let registry = Arc::new(default_registry(ToolDeps {
                lms: Arc::new(stubs::OfflineLms),
                extractor: Arc::new(stubs::OfflineExtractor),
                drafter: backend.clone(),
                history: Arc::new(stubs::InMemoryHistoryStore::default()),
            }));
            registry
                .validate_catalog()
                .map_err(|e| anyhow::anyhow!("{e}"))?;

            let agent = GradingLoop::new(backend, config.model.clone(), registry)
                .with_max_iterations(config.max_iterations)
                .with_max_tokens(config.max_tokens);

            let request = LoopRequest {
                task: parse_task(&task),
                user_message: message,
                session: SessionContext {
                    course_id,
                    assignment_id,
                    student_id,
                    ..Default::default()
                },
                max_iterations,
                image_attachments: attach
                    .iter()
                    .map(load_attachment)
                    .collect::<anyhow::Result<Vec<_>>>()?,
            };

            if stream {
                use tokio_stream::StreamExt;
                let mut events = into_stream(agent.run_stream(request));
                while let Some(event) = events.next().await {
                    println!("{}", serde_json::to_string(&event)?);
                }
            } else {
                let result = agent.run(request).await;
                println!("{}", serde_json::to_string_pretty(&result)?);
                if !result.success {
                    std::process::exit(1);
                }
            }
            Ok(())
        }
    }
}
