use crate::models::AddressKey;
use std::collections::HashMap;

pub const DEFAULT_TOP_SENDER_LIMIT: usize = 5;

/// Addresses whose count reaches `threshold`, highest count first. Equal
/// counts are ordered by address so the output is stable across runs.
pub fn rank_senders(
    counts: &HashMap<AddressKey, usize>,
    threshold: usize,
) -> Vec<(AddressKey, usize)> {
    let mut ranked: Vec<(AddressKey, usize)> = counts
        .iter()
        .filter(|(_, count)| **count >= threshold)
        .map(|(address, count)| (address.clone(), *count))
        .collect();

    ranked.sort_by(|(a_addr, a_count), (b_addr, b_count)| {
        b_count.cmp(a_count).then_with(|| a_addr.cmp(b_addr))
    });
    ranked
}

/// A ranked list cut down to a display limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncated<'a, T> {
    pub shown: &'a [T],
    pub remaining: usize,
}

pub fn truncate<T>(items: &[T], limit: usize) -> Truncated<'_, T> {
    let shown = &items[..items.len().min(limit)];
    Truncated {
        shown,
        remaining: items.len() - shown.len(),
    }
}

impl<T> Truncated<'_, T> {
    pub fn note(&self) -> Option<String> {
        match self.remaining {
            0 => None,
            1 => Some("...and 1 additional address".to_string()),
            n => Some(format!("...and {n} additional addresses")),
        }
    }
}
