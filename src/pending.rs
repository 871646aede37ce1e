use crate::alert::{AlertComposer, SpamAlert};
use crate::chain::ChainSource;
use crate::classifier::rank_senders;
use crate::models::{AddressKey, PoolStatus, PoolTransactions};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_PENDING_THRESHOLD: u64 = 50;
pub const DEFAULT_POOL_SENDER_THRESHOLD: usize = 10;

#[derive(Debug, Clone)]
pub struct PendingResult {
    pub status: PoolStatus,
    /// Ranked senders at or above the per-sender threshold. `None` when the
    /// pool was congested but its content could not be fetched, or when the
    /// pool was below the alert threshold and content was never requested.
    pub spam_senders: Option<Vec<(AddressKey, usize)>>,
    pub alert: Option<SpamAlert>,
}

pub struct PendingMonitor<C: ?Sized> {
    source: Arc<C>,
    composer: AlertComposer,
    pending_threshold: u64,
    sender_threshold: usize,
}

impl<C> PendingMonitor<C>
where
    C: ChainSource + ?Sized,
{
    pub fn new(
        source: Arc<C>,
        composer: AlertComposer,
        pending_threshold: u64,
        sender_threshold: usize,
    ) -> Self {
        PendingMonitor {
            source,
            composer,
            pending_threshold,
            sender_threshold,
        }
    }

    /// Checks the node's pending pool. Returns `None` when the node does not
    /// expose pool status; that is not treated as a failure.
    pub async fn check_pending(&self) -> Option<PendingResult> {
        let Some(status) = self.source.pending_pool_status().await else {
            debug!("Pending pool status not available from node");
            return None;
        };

        if status.pending <= self.pending_threshold {
            debug!(
                "Pending pool at {} (threshold {}), nothing to report",
                status.pending, self.pending_threshold
            );
            return Some(PendingResult {
                status,
                spam_senders: None,
                alert: None,
            });
        }

        info!(
            "Pending pool congested: {} pending, {} queued",
            status.pending, status.queued
        );

        let spam_senders = match self.source.pending_pool_content().await {
            Some(content) => Some(rank_senders(
                &sender_counts(&content.pending),
                self.sender_threshold,
            )),
            None => {
                warn!("Pending pool content unavailable, alerting without sender breakdown");
                None
            }
        };

        let alert = self.composer.compose_pending(status, spam_senders.as_deref());

        Some(PendingResult {
            status,
            spam_senders,
            alert: Some(alert),
        })
    }
}

/// Number of pool transactions per normalized sender.
pub fn sender_counts(pool: &PoolTransactions) -> HashMap<AddressKey, usize> {
    let mut counts = HashMap::new();
    for (sender, by_nonce) in pool {
        *counts.entry(AddressKey::new(Some(sender.as_str()))).or_insert(0) += by_nonce.len();
    }
    counts
}
