use anyhow::Result;
use clap::{Parser, Subcommand};
use spam_watch::config::Config;
use spam_watch::query::commands::{RangeQuery, cmd_pending, cmd_range};
use spam_watch::query::formatters::OutputFormat;
use spam_watch::rpc::RpcClient;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inspect")]
#[command(about = "Inspect blocks and the pending pool for spam patterns", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan an inclusive block range once
    Range {
        from: u64,
        to: u64,

        /// Overrides SPAM_THRESHOLD
        #[arg(long)]
        threshold: Option<usize>,

        /// Minimum sends for an address to be listed; overrides SENDER_THRESHOLD
        #[arg(long)]
        min_sends: Option<usize>,

        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Show pending pool size and the busiest senders
    Pending {
        /// Overrides POOL_SENDER_THRESHOLD
        #[arg(long)]
        min_pending: Option<usize>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    let client = RpcClient::new(&config.json_rpc_urls)?;

    match cli.command {
        Commands::Range {
            from,
            to,
            threshold,
            min_sends,
            top,
        } => {
            let query = RangeQuery {
                from,
                to,
                spam_threshold: threshold.unwrap_or(config.spam_threshold),
                dust_threshold: config.dust_threshold,
                min_sends: min_sends.unwrap_or(config.sender_threshold),
                top,
            };
            cmd_range(&client, query, &format).await?;
        }
        Commands::Pending { min_pending } => {
            cmd_pending(
                &client,
                min_pending.unwrap_or(config.pool_sender_threshold),
                &format,
            )
            .await?;
        }
    }

    Ok(())
}
