use alloy_primitives::U256;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Sentinel bucket for transactions whose sender could not be determined.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Case-normalized address used as the key of every aggregation map.
///
/// Hex addresses come back from nodes and explorers in mixed case (EIP-55
/// checksums), so keys are always stored lowercase. Missing or blank input
/// maps to [`UNKNOWN_ADDRESS`] instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AddressKey(String);

impl AddressKey {
    pub fn new(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if !s.is_empty() => AddressKey(s.to_lowercase()),
            _ => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        AddressKey(UNKNOWN_ADDRESS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AddressKey {
    fn from(raw: &str) -> Self {
        AddressKey::new(Some(raw))
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub hash: String,
    pub from: Option<String>,
    /// `None` for contract creation.
    pub to: Option<String>,
    /// Native amount in wei.
    pub value: U256,
    pub gas_price: Option<u128>,
    /// `None` while the transaction is still in the pending pool.
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub number: u64,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighVolumeBlock {
    pub number: u64,
    pub tx_count: usize,
    pub transactions: Vec<Transaction>,
}

impl From<BlockRecord> for HighVolumeBlock {
    fn from(block: BlockRecord) -> Self {
        HighVolumeBlock {
            number: block.number,
            tx_count: block.transactions.len(),
            transactions: block.transactions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub pending: u64,
    pub queued: u64,
}

/// Pool transactions keyed by sender, then by nonce.
pub type PoolTransactions = BTreeMap<String, BTreeMap<String, Transaction>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolContent {
    pub pending: PoolTransactions,
    pub queued: PoolTransactions,
}
