use crate::chain::ChainSource;
use crate::error::{MonitorError, Result};
use crate::models::{BlockRecord, PoolContent, PoolStatus, PoolTransactions, Transaction};
use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::network::TransactionResponse;
use alloy::providers::ext::TxPoolApi;
use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Transaction as RpcTransaction};
use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

type AlloyFullProvider = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider,
>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RpcClient {
    providers: Vec<AlloyFullProvider>,
    urls: Vec<String>,
    current_provider: Arc<AtomicUsize>,
    max_retries: usize,
}

impl RpcClient {
    pub fn new(rpc_urls: &[String]) -> Result<Self> {
        if rpc_urls.is_empty() {
            return Err(MonitorError::ConfigurationMissing("JSON_RPC_URL"));
        }

        let mut providers = Vec::new();
        for url in rpc_urls {
            let parsed_url = url
                .parse()
                .map_err(|_| MonitorError::InvalidConfiguration {
                    key: "JSON_RPC_URL",
                    reason: format!("invalid RPC URL: {url}"),
                })?;
            let provider: AlloyFullProvider = ProviderBuilder::new().connect_http(parsed_url);
            providers.push(provider);
        }

        Ok(RpcClient {
            providers,
            urls: rpc_urls.to_vec(),
            current_provider: Arc::new(AtomicUsize::new(0)),
            max_retries: 3,
        })
    }

    fn get_provider(&self) -> &AlloyFullProvider {
        let index = self.current_provider.load(Ordering::Relaxed) % self.providers.len();
        &self.providers[index]
    }

    pub fn get_current_url(&self) -> &str {
        let index = self.current_provider.load(Ordering::Relaxed) % self.urls.len();
        &self.urls[index]
    }

    pub fn rotate_provider(&self) {
        let current = self.current_provider.load(Ordering::Relaxed);
        let next = (current + 1) % self.providers.len();
        self.current_provider.store(next, Ordering::Relaxed);

        if self.providers.len() > 1 {
            debug!("Rotating to RPC provider #{}", next);
        }
    }

    fn get_retry_strategy(&self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(100)
            .factor(2)
            .max_delay(Duration::from_secs(5))
            .map(jitter)
            .take(self.max_retries)
    }

    fn handle_error(&self, what: &str, error_str: &str) -> MonitorError {
        let current_url = self.get_current_url();
        warn!(
            "RPC error on {} while fetching {}: {}, rotating provider",
            current_url, what, error_str
        );
        self.rotate_provider();
        MonitorError::FetchUnavailable(format!("{what}: {error_str}"))
    }

    fn handle_timeout(&self, what: &str) -> MonitorError {
        let current_url = self.get_current_url();
        warn!(
            "Request for {} timed out after {} seconds on {}, rotating provider",
            what,
            REQUEST_TIMEOUT.as_secs(),
            current_url
        );
        self.rotate_provider();
        MonitorError::FetchUnavailable(format!(
            "{what}: timeout after {} seconds",
            REQUEST_TIMEOUT.as_secs()
        ))
    }

    pub async fn get_latest_block(&self) -> Result<u64> {
        let client = self.clone();
        Retry::start(self.get_retry_strategy(), move || {
            let client = client.clone();
            async move {
                let provider = client.get_provider();
                match timeout(REQUEST_TIMEOUT, provider.get_block_number()).await {
                    Ok(Ok(block_number)) => Ok(block_number),
                    Ok(Err(e)) => Err(client.handle_error("head", &e.to_string())),
                    Err(_) => Err(client.handle_timeout("head")),
                }
            }
        })
        .await
    }

    /// Single attempt; a failed block is skipped by the caller, not retried.
    pub async fn get_block(&self, number: u64) -> Result<Option<BlockRecord>> {
        let what = format!("block {number}");
        let provider = self.get_provider();
        let future = provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full();

        let block = match timeout(REQUEST_TIMEOUT, future).await {
            Ok(Ok(block)) => block,
            Ok(Err(e)) => return Err(self.handle_error(&what, &e.to_string())),
            Err(_) => return Err(self.handle_timeout(&what)),
        };

        Ok(block.and_then(|block| {
            block
                .transactions
                .as_transactions()
                .map(|txs| BlockRecord {
                    number,
                    transactions: txs.iter().map(convert_transaction).collect(),
                })
        }))
    }

    pub async fn get_txpool_status(&self) -> Result<PoolStatus> {
        let provider = self.get_provider();
        match timeout(REQUEST_TIMEOUT, provider.txpool_status()).await {
            Ok(Ok(status)) => Ok(PoolStatus {
                pending: status.pending,
                queued: status.queued,
            }),
            Ok(Err(e)) => Err(MonitorError::FetchUnavailable(format!("txpool_status: {e}"))),
            Err(_) => Err(self.handle_timeout("txpool_status")),
        }
    }

    pub async fn get_txpool_content(&self) -> Result<PoolContent> {
        let provider = self.get_provider();
        match timeout(REQUEST_TIMEOUT, provider.txpool_content()).await {
            Ok(Ok(content)) => Ok(PoolContent {
                pending: convert_pool(&content.pending),
                queued: convert_pool(&content.queued),
            }),
            Ok(Err(e)) => Err(MonitorError::FetchUnavailable(format!("txpool_content: {e}"))),
            Err(_) => Err(self.handle_timeout("txpool_content")),
        }
    }
}

#[async_trait]
impl ChainSource for RpcClient {
    async fn latest_block_number(&self) -> Result<u64> {
        self.get_latest_block().await
    }

    async fn block_with_transactions(&self, number: u64) -> Option<BlockRecord> {
        match self.get_block(number).await {
            Ok(Some(block)) => Some(block),
            Ok(None) => {
                debug!("Node returned no transaction list for block {}", number);
                None
            }
            Err(_) => None,
        }
    }

    async fn pending_pool_status(&self) -> Option<PoolStatus> {
        self.get_txpool_status()
            .await
            .inspect_err(|e| debug!("Pending pool status unavailable: {}", e))
            .ok()
    }

    async fn pending_pool_content(&self) -> Option<PoolContent> {
        self.get_txpool_content()
            .await
            .inspect_err(|e| warn!("Pending pool content unavailable: {}", e))
            .ok()
    }
}

fn convert_transaction(tx: &RpcTransaction) -> Transaction {
    Transaction {
        hash: format!("{:#x}", TransactionResponse::tx_hash(tx)),
        from: Some(format!("{:#x}", TransactionResponse::from(tx))),
        to: ConsensusTransaction::to(tx).map(|to| format!("{to:#x}")),
        value: ConsensusTransaction::value(tx),
        gas_price: ConsensusTransaction::gas_price(tx),
        block_number: TransactionResponse::block_number(tx),
    }
}

fn convert_pool(pool: &BTreeMap<Address, BTreeMap<String, RpcTransaction>>) -> PoolTransactions {
    pool.iter()
        .map(|(sender, by_nonce)| {
            let txs = by_nonce
                .iter()
                .map(|(nonce, tx)| (nonce.clone(), convert_transaction(tx)))
                .collect();
            (format!("{sender:#x}"), txs)
        })
        .collect()
}
