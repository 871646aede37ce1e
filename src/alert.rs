use crate::analyzer::AddressStats;
use crate::classifier::{rank_senders, truncate};
use crate::models::{AddressKey, HighVolumeBlock, PoolStatus};
use std::fmt;

pub const DEFAULT_EXPLORER_URL: &str = "https://etherscan.io";
pub const DEFAULT_SENDER_THRESHOLD: usize = 10;

const CONTENT_UNAVAILABLE_NOTE: &str = "Detailed pool content unavailable";

/// A composed alert, ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamAlert {
    pub summary_line: String,
    pub per_block_lines: Vec<String>,
    pub top_sender_lines: Vec<String>,
    pub truncation_note: Option<String>,
    pub detail_note: Option<String>,
    pub investigation_link: String,
}

impl fmt::Display for SpamAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary_line)?;

        if !self.per_block_lines.is_empty() {
            writeln!(f)?;
            for line in &self.per_block_lines {
                writeln!(f, "{line}")?;
            }
        }

        if !self.top_sender_lines.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top senders:")?;
            for line in &self.top_sender_lines {
                writeln!(f, "{line}")?;
            }
            if let Some(note) = &self.truncation_note {
                writeln!(f, "{note}")?;
            }
        }

        if let Some(note) = &self.detail_note {
            writeln!(f)?;
            writeln!(f, "{note}")?;
        }

        writeln!(f)?;
        write!(f, "Investigate: {}", self.investigation_link)
    }
}

#[derive(Debug, Clone)]
pub struct AlertComposer {
    explorer_url: String,
    sender_threshold: usize,
    display_limit: usize,
}

impl AlertComposer {
    pub fn new(explorer_url: &str, sender_threshold: usize, display_limit: usize) -> Self {
        AlertComposer {
            explorer_url: explorer_url.trim_end_matches('/').to_string(),
            sender_threshold,
            display_limit,
        }
    }

    /// Alert for the high-volume blocks of one scan window. Callers skip this
    /// when there is nothing to report; empty input still yields a message.
    pub fn compose(&self, blocks: &[HighVolumeBlock], stats: &AddressStats) -> SpamAlert {
        let mut ordered: Vec<&HighVolumeBlock> = blocks.iter().collect();
        ordered.sort_by_key(|b| b.number);

        let total_txs: usize = ordered.iter().map(|b| b.tx_count).sum();
        let summary_line = format!(
            "🚨 Spam activity: {} high-volume block{} with {} transactions",
            ordered.len(),
            if ordered.len() == 1 { "" } else { "s" },
            total_txs
        );

        let per_block_lines = ordered
            .iter()
            .map(|b| format!("Block {}: {} txs", b.number, b.tx_count))
            .collect();

        let ranked = rank_senders(&stats.send_count, self.sender_threshold);
        let cut = truncate(&ranked, self.display_limit);
        let top_sender_lines = cut
            .shown
            .iter()
            .map(|(address, sends)| self.sender_line(address, *sends, stats))
            .collect();

        let last_block = ordered.last().map_or(0, |b| b.number);

        SpamAlert {
            summary_line,
            per_block_lines,
            top_sender_lines,
            truncation_note: cut.note(),
            detail_note: None,
            investigation_link: format!("{}/block/{}", self.explorer_url, last_block),
        }
    }

    /// Alert for a congested pending pool. `spam_senders` is `None` when the
    /// detailed pool content could not be fetched.
    pub fn compose_pending(
        &self,
        status: PoolStatus,
        spam_senders: Option<&[(AddressKey, usize)]>,
    ) -> SpamAlert {
        let summary_line = format!(
            "⏳ Pending pool congestion: {} pending, {} queued",
            status.pending, status.queued
        );

        let (top_sender_lines, truncation_note, detail_note) = match spam_senders {
            Some(senders) => {
                let cut = truncate(senders, self.display_limit);
                let lines = cut
                    .shown
                    .iter()
                    .map(|(address, count)| format!("{address}: {count} pending txs"))
                    .collect();
                (lines, cut.note(), None)
            }
            None => (Vec::new(), None, Some(CONTENT_UNAVAILABLE_NOTE.to_string())),
        };

        SpamAlert {
            summary_line,
            per_block_lines: Vec::new(),
            top_sender_lines,
            truncation_note,
            detail_note,
            investigation_link: format!("{}/txsPending", self.explorer_url),
        }
    }

    fn sender_line(&self, address: &AddressKey, sends: usize, stats: &AddressStats) -> String {
        format!(
            "{address}: {sends} txs to {} recipients ({} dust)",
            stats.distinct_recipients(address),
            stats.dust_sends(address)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn composer() -> AlertComposer {
        AlertComposer::new("https://etherscan.io/", 10, 5)
    }

    fn block(number: u64, tx_count: usize) -> HighVolumeBlock {
        HighVolumeBlock {
            number,
            tx_count,
            transactions: Vec::new(),
        }
    }

    fn stats_with(entries: &[(&str, usize)]) -> AddressStats {
        let send_count: HashMap<AddressKey, usize> = entries
            .iter()
            .map(|(a, c)| (AddressKey::from(*a), *c))
            .collect();
        AddressStats {
            send_count,
            ..Default::default()
        }
    }

    #[test]
    fn lists_blocks_in_ascending_order_and_links_the_highest() {
        let alert = composer().compose(&[block(12, 30), block(10, 25)], &AddressStats::default());

        assert_eq!(
            alert.summary_line,
            "🚨 Spam activity: 2 high-volume blocks with 55 transactions"
        );
        assert_eq!(alert.per_block_lines, vec!["Block 10: 25 txs", "Block 12: 30 txs"]);
        assert_eq!(alert.investigation_link, "https://etherscan.io/block/12");
        assert!(alert.top_sender_lines.is_empty());
        assert!(!alert.to_string().contains("Top senders"));
    }

    #[test]
    fn truncates_top_senders_to_display_limit() {
        let stats = stats_with(&[
            ("0x01", 70),
            ("0x02", 60),
            ("0x03", 50),
            ("0x04", 40),
            ("0x05", 30),
            ("0x06", 20),
            ("0x07", 10),
        ]);

        let alert = composer().compose(&[block(1, 280)], &stats);
        let text = alert.to_string();

        assert_eq!(alert.top_sender_lines.len(), 5);
        assert!(alert.top_sender_lines[0].starts_with("0x01: 70 txs"));
        assert!(text.contains("and 2 additional addresses"));
        assert!(!text.contains("0x06"));
    }

    #[test]
    fn sender_section_requires_threshold() {
        let stats = stats_with(&[("0x01", 9)]);

        let alert = composer().compose(&[block(1, 20)], &stats);

        assert!(alert.top_sender_lines.is_empty());
        assert!(alert.truncation_note.is_none());
    }

    #[test]
    fn pending_alert_with_senders() {
        let senders = vec![(AddressKey::from("0xaa"), 25), (AddressKey::from("0xbb"), 12)];

        let alert = composer().compose_pending(
            PoolStatus {
                pending: 120,
                queued: 4,
            },
            Some(&senders),
        );

        assert_eq!(
            alert.summary_line,
            "⏳ Pending pool congestion: 120 pending, 4 queued"
        );
        assert_eq!(
            alert.top_sender_lines,
            vec!["0xaa: 25 pending txs", "0xbb: 12 pending txs"]
        );
        assert!(alert.detail_note.is_none());
        assert_eq!(alert.investigation_link, "https://etherscan.io/txsPending");
    }

    #[test]
    fn pending_alert_notes_missing_content() {
        let alert = composer().compose_pending(
            PoolStatus {
                pending: 80,
                queued: 0,
            },
            None,
        );

        assert!(alert.to_string().contains(CONTENT_UNAVAILABLE_NOTE));
    }

    #[test]
    fn empty_input_does_not_panic() {
        let alert = composer().compose(&[], &AddressStats::default());
        assert!(alert.per_block_lines.is_empty());
        assert_eq!(alert.investigation_link, "https://etherscan.io/block/0");
    }
}
