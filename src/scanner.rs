use crate::analyzer::{AddressStats, analyze};
use crate::chain::ChainSource;
use crate::error::Result;
use crate::models::HighVolumeBlock;
use alloy_primitives::U256;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const DEFAULT_SPAM_THRESHOLD: usize = 20;
pub const DEFAULT_HISTORY_DEPTH: u64 = 100;

/// Last block number fully accounted for. Only moves forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockCursor {
    last_processed_block: u64,
    initialized: bool,
}

impl BlockCursor {
    pub fn last_processed_block(&self) -> Option<u64> {
        self.initialized.then_some(self.last_processed_block)
    }

    fn advance(&mut self, to: u64) {
        if !self.initialized || to > self.last_processed_block {
            self.last_processed_block = to;
        }
        self.initialized = true;
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub range: Option<RangeInclusive<u64>>,
    /// Blocks fetched with a transaction list.
    pub checked: usize,
    /// Blocks that could not be fetched, in range order.
    pub skipped: Vec<u64>,
    pub high_volume: Vec<HighVolumeBlock>,
    /// Aggregated over the transactions of `high_volume` only.
    pub stats: AddressStats,
    /// Transaction count of every checked block, in range order.
    pub block_tx_counts: Vec<(u64, usize)>,
}

impl ScanResult {
    pub fn has_findings(&self) -> bool {
        !self.high_volume.is_empty()
    }
}

/// Scans `range` block by block, in increasing order.
///
/// A block that cannot be fetched is recorded in `skipped` and the loop moves
/// on. Fetch failures are never retried here.
pub async fn scan_range<C>(
    source: &C,
    range: RangeInclusive<u64>,
    spam_threshold: usize,
    dust_threshold: U256,
) -> ScanResult
where
    C: ChainSource + ?Sized,
{
    let mut result = ScanResult {
        range: Some(range.clone()),
        ..Default::default()
    };

    for number in range.clone() {
        let Some(block) = source.block_with_transactions(number).await else {
            warn!("Block {} unavailable, skipping", number);
            result.skipped.push(number);
            continue;
        };

        result.checked += 1;
        let tx_count = block.transactions.len();
        result.block_tx_counts.push((number, tx_count));

        if tx_count >= spam_threshold {
            debug!("Block {} is high-volume with {} txs", number, tx_count);
            result.high_volume.push(block.into());
        }
    }

    result.stats = analyze(
        result.high_volume.iter().flat_map(|b| b.transactions.iter()),
        dust_threshold,
    );

    info!(
        "Scanned blocks {}..={}: {} checked, {} skipped, {} high-volume",
        range.start(),
        range.end(),
        result.checked,
        result.skipped.len(),
        result.high_volume.len()
    );

    result
}

/// Incremental scanner over newly produced blocks.
pub struct WindowScanner<C: ?Sized> {
    source: Arc<C>,
    cursor: BlockCursor,
    spam_threshold: usize,
    history_depth: u64,
    dust_threshold: U256,
}

impl<C> WindowScanner<C>
where
    C: ChainSource + ?Sized,
{
    pub fn new(
        source: Arc<C>,
        spam_threshold: usize,
        history_depth: u64,
        dust_threshold: U256,
    ) -> Self {
        WindowScanner {
            source,
            cursor: BlockCursor::default(),
            spam_threshold,
            history_depth,
            dust_threshold,
        }
    }

    pub fn cursor(&self) -> BlockCursor {
        self.cursor
    }

    /// Runs one scan tick.
    ///
    /// The first call anchors the cursor at the current head and optionally
    /// reports on the last `history_depth` blocks. Later calls cover
    /// `(cursor, head]` and then move the cursor to `head`, whether or not
    /// every block in between could be fetched. Only a failed head query
    /// returns an error, and it leaves the cursor untouched.
    pub async fn scan(&mut self) -> Result<ScanResult> {
        let latest = self.source.latest_block_number().await?;

        let Some(last) = self.cursor.last_processed_block() else {
            self.cursor.advance(latest);
            info!("Cursor initialized at block {}", latest);

            if self.history_depth == 0 {
                return Ok(ScanResult::default());
            }
            let from = latest.saturating_sub(self.history_depth).max(1);
            if from > latest {
                return Ok(ScanResult::default());
            }
            info!("Catching up on blocks {} to {}", from, latest);
            return Ok(self.scan_blocks(from..=latest).await);
        };

        if latest <= last {
            debug!("No new blocks (head {}, cursor {})", latest, last);
            return Ok(ScanResult::default());
        }

        let result = self.scan_blocks(last + 1..=latest).await;
        self.cursor.advance(latest);
        debug!("Cursor advanced to block {}", latest);

        Ok(result)
    }

    async fn scan_blocks(&self, range: RangeInclusive<u64>) -> ScanResult {
        scan_range(
            self.source.as_ref(),
            range,
            self.spam_threshold,
            self.dust_threshold,
        )
        .await
    }
}
