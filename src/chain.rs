use crate::error::Result;
use crate::models::{BlockRecord, PoolContent, PoolStatus};
use async_trait::async_trait;

/// Read access to a node, as seen by the scanner and the pool monitor.
///
/// Implementations translate transport errors themselves: only the head query
/// reports an error, everything else degrades to `None`.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn latest_block_number(&self) -> Result<u64>;

    /// Block `number` with full transaction bodies, or `None` when the block
    /// could not be fetched or came back without a transaction list.
    async fn block_with_transactions(&self, number: u64) -> Option<BlockRecord>;

    /// `None` when the node does not expose the txpool namespace.
    async fn pending_pool_status(&self) -> Option<PoolStatus>;

    async fn pending_pool_content(&self) -> Option<PoolContent>;
}
