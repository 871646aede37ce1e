#![allow(dead_code)]

use alloy_primitives::U256;
use async_trait::async_trait;
use spam_watch::chain::ChainSource;
use spam_watch::error::{MonitorError, Result};
use spam_watch::models::{BlockRecord, PoolContent, PoolStatus, Transaction};
use spam_watch::notifier::Notifier;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Notify;

pub const DUST: u64 = 1_000_000_000_000_000;

pub fn tx(from: &str, to: &str, value: u64) -> Transaction {
    Transaction {
        hash: format!("0x{from}{to}{value}"),
        from: Some(from.to_string()),
        to: Some(to.to_string()),
        value: U256::from(value),
        gas_price: Some(1_000_000_000),
        block_number: None,
    }
}

/// `count` transactions from `from`, each to a distinct recipient.
pub fn burst(from: &str, count: usize, value: u64) -> Vec<Transaction> {
    (0..count)
        .map(|i| tx(from, &format!("0xr{i:04}"), value))
        .collect()
}

/// In-memory node. Blocks absent from `blocks` are served empty unless they
/// are listed in `failing`.
#[derive(Default)]
pub struct FakeChain {
    head: AtomicU64,
    head_unavailable: Mutex<bool>,
    blocks: Mutex<BTreeMap<u64, Vec<Transaction>>>,
    failing: Mutex<HashSet<u64>>,
    fetched: Mutex<Vec<u64>>,
    pool_status: Mutex<Option<PoolStatus>>,
    pool_content: Mutex<Option<PoolContent>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl FakeChain {
    pub fn with_head(head: u64) -> Self {
        let chain = FakeChain::default();
        chain.set_head(head);
        chain
    }

    pub fn set_head(&self, head: u64) {
        self.head.store(head, Ordering::SeqCst);
    }

    pub fn set_head_unavailable(&self, unavailable: bool) {
        *self.head_unavailable.lock().unwrap() = unavailable;
    }

    pub fn put_block(&self, number: u64, transactions: Vec<Transaction>) {
        self.blocks.lock().unwrap().insert(number, transactions);
    }

    pub fn fail_block(&self, number: u64) {
        self.failing.lock().unwrap().insert(number);
    }

    pub fn set_pool(&self, status: Option<PoolStatus>, content: Option<PoolContent>) {
        *self.pool_status.lock().unwrap() = status;
        *self.pool_content.lock().unwrap() = content;
    }

    /// Makes the next head queries wait until the returned handle is notified.
    pub fn hold_head(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn fetched(&self) -> Vec<u64> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn clear_fetched(&self) {
        self.fetched.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChainSource for FakeChain {
    async fn latest_block_number(&self) -> Result<u64> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.head_unavailable.lock().unwrap() {
            return Err(MonitorError::FetchUnavailable("head: connection refused".to_string()));
        }
        Ok(self.head.load(Ordering::SeqCst))
    }

    async fn block_with_transactions(&self, number: u64) -> Option<BlockRecord> {
        self.fetched.lock().unwrap().push(number);
        if self.failing.lock().unwrap().contains(&number) {
            return None;
        }
        let transactions = self
            .blocks
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default();
        Some(BlockRecord {
            number,
            transactions,
        })
    }

    async fn pending_pool_status(&self) -> Option<PoolStatus> {
        *self.pool_status.lock().unwrap()
    }

    async fn pending_pool_content(&self) -> Option<PoolContent> {
        self.pool_content.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        RecordingNotifier {
            sent: Mutex::default(),
            failing: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.failing {
            return Err(MonitorError::NotificationFailed("channel down".to_string()));
        }
        Ok(())
    }
}
