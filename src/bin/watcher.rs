use anyhow::{Context, Result};
use spam_watch::alert::AlertComposer;
use spam_watch::config::Config;
use spam_watch::notifier::TelegramNotifier;
use spam_watch::pending::PendingMonitor;
use spam_watch::rpc::RpcClient;
use spam_watch::scanner::WindowScanner;
use spam_watch::scheduler::Scheduler;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting spam watcher");

    let config = Config::from_env().context("Failed to load configuration")?;
    let telegram = config
        .require_telegram()
        .context("A notification channel is required")?;
    info!("Configuration loaded");
    info!(
        "RPC URLs: {} endpoint(s) configured",
        config.json_rpc_urls.len()
    );
    info!(
        "Spam threshold {} txs/block, history depth {} blocks, poll every {} ms",
        config.spam_threshold,
        config.history_depth,
        config.poll_interval.as_millis()
    );

    let client = Arc::new(RpcClient::new(&config.json_rpc_urls)?);
    let notifier = Arc::new(TelegramNotifier::new(
        &telegram.api_url,
        &telegram.bot_token,
        &telegram.chat_id,
    )?);

    let composer = AlertComposer::new(
        &config.explorer_url,
        config.sender_threshold,
        config.top_sender_limit,
    );
    let scanner = WindowScanner::new(
        client.clone(),
        config.spam_threshold,
        config.history_depth,
        config.dust_threshold,
    );
    let pending = PendingMonitor::new(
        client,
        composer.clone(),
        config.pending_threshold,
        config.pool_sender_threshold,
    );

    let scheduler = Scheduler::new(scanner, pending, composer, notifier, config.poll_interval);

    scheduler
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Spam watcher stopped");
    Ok(())
}
