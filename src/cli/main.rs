/**
 * Offline Queue CLI Entry Point
 *
 * Operator tool for the persisted request queue: enqueue, inspect, clear,
 * and replay buffered requests against the configured API.
 */
use clap::{Parser, Subcommand};
use offline_queue::offline::OfflineQueue;
use offline_queue::shared::{HttpMethod, NewRequest, Priority, QueueConfig};
use offline_queue::sync::{NetworkMonitor, SyncWorker};

#[derive(Debug, Parser)]
#[command(name = "offline-queue", version, about = "Buffer and replay HTTP requests")]
struct Cli {
    /// Storage directory (overrides OFFLINE_QUEUE_DIR)
    #[arg(long, global = true)]
    dir: Option<std::path::PathBuf>,

    /// API base URL for relative request URLs (overrides OFFLINE_QUEUE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Queue a request without sending it
    Add {
        /// Target URL, absolute or relative to the API base URL
        url: String,
        #[arg(short = 'X', long, default_value = "POST")]
        method: HttpMethod,
        /// JSON body
        #[arg(short, long)]
        body: Option<String>,
        /// Extra header as `Name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Print queued requests, head first
    List,
    /// Remove one request by id
    Remove { id: String },
    /// Remove every queued request
    Clear,
    /// Replay the queue once and exit
    Sync,
    /// Keep syncing on the configured interval until Ctrl-C
    Run,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header '{}' is not in 'Name: value' form", raw))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn remove(queue: &OfflineQueue, id: &str) -> Result<(), String> {
    if queue.remove_request(id) {
        Ok(())
    } else {
        Err(format!("no queued request with id {}", id))
    }
}

fn load_config(cli: &Cli) -> Result<QueueConfig, Box<dyn std::error::Error>> {
    let mut config = QueueConfig::from_env()?;
    if let Some(dir) = &cli.dir {
        config.storage_dir = dir.clone();
    }
    if let Some(url) = &cli.api_url {
        config.api_base_url = Some(url.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Only sync/run talk to the network; everything else edits the slot
    let monitor = NetworkMonitor::offline();
    let queue = OfflineQueue::from_config(config, monitor.clone())?;

    match cli.command {
        Command::Add {
            url,
            method,
            body,
            headers,
            priority,
            max_retries,
        } => {
            let mut request = NewRequest::new(method, url).priority(priority);
            if let Some(body) = body {
                request = request.body(serde_json::from_str(&body)?);
            }
            for raw in &headers {
                let (name, value) = parse_header(raw)?;
                request = request.header(name, value);
            }
            if let Some(max_retries) = max_retries {
                request = request.max_retries(max_retries);
            }

            let id = queue.add_request(request);
            println!("{}", id);
        }
        Command::List => {
            println!("slot: {}", queue.config().storage_path().display());
            let state = queue.state();
            for request in &state.queue {
                println!(
                    "{}  {:<6} {:<6} retries {}/{}  {}",
                    request.id,
                    request.priority,
                    request.method,
                    request.retry_count,
                    request.max_retries,
                    request.url
                );
            }
            let stats = queue.stats();
            println!(
                "{} queued (high {}, medium {}, low {}), {} retrying",
                stats.total, stats.high, stats.medium, stats.low, stats.retrying
            );
        }
        Command::Remove { id } => {
            remove(&queue, &id)?;
            println!("removed {}", id);
        }
        Command::Clear => {
            queue.clear_queue();
            println!("queue cleared");
        }
        Command::Sync => {
            monitor.set_online(true);
            queue.drain().await;

            let metrics = queue.metrics();
            println!(
                "delivered {}, rejected {}, dropped {}, retried {} ({:.0}% delivered); {} left",
                metrics.delivered,
                metrics.rejected,
                metrics.dropped,
                metrics.retried,
                metrics.success_rate() * 100.0,
                queue.len()
            );
        }
        Command::Run => {
            monitor.set_online(true);
            let _subscription = queue.subscribe(|state| {
                tracing::debug!(
                    "{} pending, processing: {}",
                    state.pending(),
                    state.is_processing
                );
            });

            let mut worker = SyncWorker::new(queue.clone());
            worker.start()?;
            queue.force_sync();

            tokio::signal::ctrl_c().await?;
            tracing::info!("Shutting down");
            worker.stop().await;
        }
    }

    Ok(())
}
