use crate::models::{AddressKey, Transaction};
use alloy_primitives::U256;
use alloy_primitives::utils::{ParseUnits, parse_units};
use std::collections::{HashMap, HashSet};

/// Native token decimals (wei per ether).
pub const NATIVE_DECIMALS: u8 = 18;
pub const DEFAULT_DUST_THRESHOLD: &str = "0.001";

/// Per-address activity for one scan window. Rebuilt from scratch for every
/// window; nothing carries over between windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressStats {
    pub send_count: HashMap<AddressKey, usize>,
    pub recipients: HashMap<AddressKey, HashSet<AddressKey>>,
    pub receive_count: HashMap<AddressKey, usize>,
    pub low_value_send_count: HashMap<AddressKey, usize>,
}

impl AddressStats {
    pub fn sends(&self, address: &AddressKey) -> usize {
        self.send_count.get(address).copied().unwrap_or(0)
    }

    pub fn distinct_recipients(&self, address: &AddressKey) -> usize {
        self.recipients.get(address).map_or(0, HashSet::len)
    }

    pub fn dust_sends(&self, address: &AddressKey) -> usize {
        self.low_value_send_count.get(address).copied().unwrap_or(0)
    }

    pub fn received(&self, address: &AddressKey) -> usize {
        self.receive_count.get(address).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.send_count.is_empty()
    }
}

/// Builds [`AddressStats`] for a set of transactions.
///
/// Sends below `dust_threshold` (wei) count as low-value sends. Contract
/// creations have no recipient and only contribute to the sender's counts.
pub fn analyze<'a, I>(transactions: I, dust_threshold: U256) -> AddressStats
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut stats = AddressStats::default();

    for tx in transactions {
        let from = AddressKey::new(tx.from.as_deref());

        *stats.send_count.entry(from.clone()).or_insert(0) += 1;

        if tx.value < dust_threshold {
            *stats.low_value_send_count.entry(from.clone()).or_insert(0) += 1;
        }

        let recipients = stats.recipients.entry(from).or_default();
        if let Some(to) = tx.to.as_deref() {
            let to = AddressKey::new(Some(to));
            recipients.insert(to.clone());
            *stats.receive_count.entry(to).or_insert(0) += 1;
        }
    }

    stats
}

/// Parses a decimal native-unit amount such as `"0.001"` into wei.
pub fn parse_native_amount(amount: &str) -> Result<U256, String> {
    let parsed = parse_units(amount.trim(), NATIVE_DECIMALS).map_err(|e| e.to_string())?;
    match parsed {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => Err(format!("negative amount: {amount}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dust() -> U256 {
        parse_native_amount(DEFAULT_DUST_THRESHOLD).unwrap()
    }

    fn tx(from: Option<&str>, to: Option<&str>, value: U256) -> Transaction {
        Transaction {
            hash: "0x01".to_string(),
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            value,
            gas_price: None,
            block_number: Some(1),
        }
    }

    #[test]
    fn dust_threshold_parses_to_wei() {
        assert_eq!(dust(), U256::from(1_000_000_000_000_000u64));
        assert!(parse_native_amount("not-a-number").is_err());
    }

    #[test]
    fn mixed_case_senders_share_a_bucket() {
        let one_eth = U256::from(10u64).pow(U256::from(18));
        let txs = vec![
            tx(Some("0xABCDEF0000000000000000000000000000000001"), Some("0x02"), one_eth),
            tx(Some("0xabcdef0000000000000000000000000000000001"), Some("0x03"), one_eth),
        ];

        let stats = analyze(&txs, dust());
        let key = AddressKey::from("0xabcdef0000000000000000000000000000000001");

        assert_eq!(stats.send_count.len(), 1);
        assert_eq!(stats.sends(&key), 2);
        assert_eq!(stats.distinct_recipients(&key), 2);
        assert_eq!(stats.dust_sends(&key), 0);
    }

    #[test]
    fn counts_dust_recipients_and_contract_creation() {
        let txs = vec![
            tx(Some("0xaa"), Some("0xbb"), U256::from(1u64)),
            tx(Some("0xaa"), Some("0xBB"), U256::from(1u64)),
            tx(Some("0xaa"), None, U256::ZERO),
            tx(Some("0xaa"), Some("0xcc"), dust()),
        ];

        let stats = analyze(&txs, dust());
        let sender = AddressKey::from("0xaa");

        assert_eq!(stats.sends(&sender), 4);
        // exactly-at-threshold is not dust
        assert_eq!(stats.dust_sends(&sender), 3);
        assert_eq!(stats.distinct_recipients(&sender), 2);
        assert_eq!(stats.received(&AddressKey::from("0xbb")), 2);
        assert_eq!(stats.received(&AddressKey::from("0xcc")), 1);
        assert_eq!(stats.receive_count.len(), 2);
    }

    #[test]
    fn missing_sender_goes_to_unknown_bucket() {
        let txs = vec![tx(None, Some("0xbb"), dust()), tx(Some("  "), None, dust())];

        let stats = analyze(&txs, dust());

        assert_eq!(stats.sends(&AddressKey::unknown()), 2);
    }

    #[test]
    fn analyze_is_idempotent_and_leaves_input_untouched() {
        let txs = vec![
            tx(Some("0xAA"), Some("0xbb"), U256::from(5u64)),
            tx(Some("0xcc"), Some("0xaa"), dust()),
        ];
        let snapshot = txs.clone();

        let first = analyze(&txs, dust());
        let second = analyze(&txs, dust());

        assert_eq!(first, second);
        assert_eq!(txs, snapshot);
    }

    #[test]
    fn empty_input_yields_empty_stats() {
        let stats = analyze(std::iter::empty(), dust());
        assert!(stats.is_empty());
    }
}
