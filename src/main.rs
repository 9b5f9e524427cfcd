//! Mechanical Turk Requester CLI — Entry Point
//!
//! Wiring sequence:
//! 1. Load `.env` (if present) and parse CLI arguments
//! 2. Load config.toml + validate (stock values if the file is absent)
//! 3. Init tracing (JSON structured logging on stderr)
//! 4. Load credentials from env vars (MTURK_ACCESS_KEY, MTURK_SECRET_KEY)
//! 5. Create HttpTransport (Transport port) and TaskClient
//! 6. Run one operation, print its result on stdout

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};

use mturk_client::adapters::api::auth::Credentials;
use mturk_client::adapters::api::client::HttpTransport;
use mturk_client::adapters::api::parser::{self, Parsed, Shape};
use mturk_client::adapters::api::request::percent_encode;
use mturk_client::adapters::metrics::ClientMetrics;
use mturk_client::config::{self, AppConfig};
use mturk_client::domain::TaskOverrides;
use mturk_client::usecases::{Endpoint, TaskClient, DEFAULT_PAGE_SIZE};

#[derive(Debug, Parser)]
#[command(name = "mturk", version, about = "Mechanical Turk requester client")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "MTURK_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Talk to the sandbox instead of the configured endpoint.
    #[arg(long)]
    sandbox: bool,

    /// Print Prometheus metrics after the command.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the available balance.
    Balance {
        /// Print the raw amount instead of the formatted price.
        #[arg(long)]
        raw: bool,
    },
    /// List tasks with work awaiting review.
    Reviewable {
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Print the raw submissions for a task.
    Results {
        task_id: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Show a task's details.
    Details {
        task_id: String,
        /// Print the raw response instead of the decoded record.
        #[arg(long)]
        raw: bool,
    },
    /// Show the assignment accepted against a task.
    Assignment { task_id: String },
    /// Approve the work submitted against a task.
    Approve {
        task_id: String,
        /// Note sent to the worker.
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Remove a reviewed task.
    Dispose { task_id: String },
    /// Publish a new task from a QuestionForm file.
    Create {
        /// File holding the question XML (sent URL-encoded).
        #[arg(long)]
        question_file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated keywords.
        #[arg(long, value_delimiter = ',')]
        keywords: Option<Vec<String>>,
        #[arg(long)]
        reward: Option<Decimal>,
        #[arg(long)]
        lifetime_seconds: Option<u64>,
        #[arg(long)]
        max_assignments: Option<u32>,
        #[arg(long)]
        annotation: Option<String>,
        /// Print the raw response instead of the new task id.
        #[arg(long)]
        raw: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. .env + arguments ─────────────────────────────────
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── 2. Load configuration ───────────────────────────────
    let config_found = cli.config.exists();
    let config = if config_found {
        load_config(&cli.config)?
    } else {
        config::loader::parse_config("")?
    };

    // ── 3. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.client.log_level)),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    if !config_found {
        warn!(path = %cli.config.display(), "Config file not found, using stock values");
    }
    if let Ok(path) = &dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    info!(
        name = %config.client.name,
        version = env!("CARGO_PKG_VERSION"),
        sandbox = cli.sandbox,
        "Starting requester client"
    );

    // ── 4. Credentials from env vars ────────────────────────
    let credentials = Credentials::from_env().context("Failed to load requester credentials")?;

    // ── 5. Transport + client ───────────────────────────────
    let transport = Arc::new(
        HttpTransport::new(&config.transport()).context("Failed to create HTTP transport")?,
    );
    let endpoint = if cli.sandbox {
        Endpoint::sandbox()
    } else {
        config.endpoint()
    };
    let metrics = Arc::new(ClientMetrics::new().context("Failed to register metrics")?);
    let client = TaskClient::new(credentials, config.defaults.clone(), endpoint, transport)
        .context("Failed to create client")?
        .with_metrics(Arc::clone(&metrics));

    // ── 6. Run the command ──────────────────────────────────
    run(&client, cli.command).await?;

    if cli.metrics {
        print!("{}", metrics.encode()?);
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let path = path.to_str().context("Config path is not valid UTF-8")?;
    config::loader::load_config(path).context("Failed to load configuration")
}

async fn run(client: &TaskClient<HttpTransport>, command: Command) -> Result<()> {
    match command {
        Command::Balance { raw } => {
            let balance = client.balance(!raw).await?;
            println!("{balance}");
        }
        Command::Reviewable { page_size } => {
            let tasks = client.reviewable_tasks(page_size).await?;
            for task in tasks {
                println!("{}", task.task_id);
            }
        }
        Command::Results { task_id, page_size } => {
            let body = client.task_results(&task_id, page_size).await?;
            println!("{}", String::from_utf8_lossy(&body));
        }
        Command::Details { task_id, raw } => {
            let body = client.task_details(&task_id).await?;
            print_body(&body, raw, Shape::TaskDetails)?;
        }
        Command::Assignment { task_id } => {
            let assignment = client.assignment_for_task(&task_id).await?;
            println!("{}", serde_json::to_string_pretty(&assignment)?);
        }
        Command::Approve { task_id, feedback } => {
            client
                .approve_assignment_with_feedback(&task_id, feedback.as_deref())
                .await?;
            println!("approved {task_id}");
        }
        Command::Dispose { task_id } => {
            client.dispose_task(&task_id).await?;
            println!("disposed {task_id}");
        }
        Command::Create {
            question_file,
            title,
            description,
            keywords,
            reward,
            lifetime_seconds,
            max_assignments,
            annotation,
            raw,
        } => {
            let question = std::fs::read_to_string(&question_file).with_context(|| {
                format!("Failed to read question file: {}", question_file.display())
            })?;
            let overrides = TaskOverrides {
                title,
                description,
                keywords,
                reward,
                lifetime_seconds,
                max_assignments,
                requester_annotation: annotation,
                ..TaskOverrides::default()
            };
            let body = client
                .create_task(&percent_encode(question.trim()), &overrides)
                .await?;
            print_body(&body, raw, Shape::CreatedTask)?;
        }
    }
    Ok(())
}

fn print_body(body: &[u8], raw: bool, shape: Shape) -> Result<()> {
    if raw {
        println!("{}", String::from_utf8_lossy(body));
        return Ok(());
    }
    if let Parsed::Task(task) = parser::parse(body, shape)? {
        println!("{}", serde_json::to_string_pretty(&task)?);
    }
    Ok(())
}
