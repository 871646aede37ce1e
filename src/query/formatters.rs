use crate::analyzer::AddressStats;
use crate::models::{AddressKey, PoolStatus};
use crate::scanner::ScanResult;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

/// One row of the sender ranking, with the side statistics alerts show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderRow {
    pub address: AddressKey,
    pub sent: usize,
    pub recipients: usize,
    pub dust: usize,
    pub received: usize,
}

impl SenderRow {
    pub fn from_stats(address: &AddressKey, stats: &AddressStats) -> Self {
        SenderRow {
            address: address.clone(),
            sent: stats.sends(address),
            recipients: stats.distinct_recipients(address),
            dust: stats.dust_sends(address),
            received: stats.received(address),
        }
    }
}

pub fn format_scan_report(
    result: &ScanResult,
    spam_threshold: usize,
    senders: &[SenderRow],
    format: &OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => format_scan_table(result, spam_threshold, senders),
        OutputFormat::Json => format_scan_json(result, spam_threshold, senders),
        OutputFormat::Csv => format_scan_csv(result, spam_threshold, senders),
    }
}

fn format_scan_table(result: &ScanResult, spam_threshold: usize, senders: &[SenderRow]) -> String {
    if result.block_tx_counts.is_empty() && result.skipped.is_empty() {
        return "No blocks scanned.".to_string();
    }

    let mut blocks = Table::new();
    blocks
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Block", "Txs", "High volume"]);

    for (number, tx_count) in &result.block_tx_counts {
        blocks.add_row(vec![
            Cell::new(number),
            Cell::new(tx_count),
            Cell::new(if *tx_count >= spam_threshold { "yes" } else { "" }),
        ]);
    }
    for number in &result.skipped {
        blocks.add_row(vec![Cell::new(number), Cell::new("unavailable"), Cell::new("")]);
    }

    let mut output = blocks.to_string();
    output.push_str(&format!(
        "\n{} checked, {} skipped, {} high-volume (threshold {})\n",
        result.checked,
        result.skipped.len(),
        result.high_volume.len(),
        spam_threshold
    ));

    if senders.is_empty() {
        output.push_str("No senders above threshold.");
        return output;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Rank", "Address", "Sent", "Recipients", "Dust", "Received"]);

    for (i, row) in senders.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&row.address),
            Cell::new(row.sent),
            Cell::new(row.recipients),
            Cell::new(row.dust),
            Cell::new(row.received),
        ]);
    }

    output.push_str(&table.to_string());
    output
}

fn format_scan_json(result: &ScanResult, spam_threshold: usize, senders: &[SenderRow]) -> String {
    let blocks: Vec<_> = result
        .block_tx_counts
        .iter()
        .map(|(number, tx_count)| {
            json!({
                "number": number,
                "tx_count": tx_count,
                "high_volume": *tx_count >= spam_threshold,
            })
        })
        .collect();

    let senders: Vec<_> = senders
        .iter()
        .enumerate()
        .map(|(i, row)| {
            json!({
                "rank": i + 1,
                "address": row.address,
                "sent": row.sent,
                "recipients": row.recipients,
                "dust": row.dust,
                "received": row.received,
            })
        })
        .collect();

    serde_json::to_string_pretty(&json!({
        "range": result.range.as_ref().map(|r| json!({"from": r.start(), "to": r.end()})),
        "spam_threshold": spam_threshold,
        "checked": result.checked,
        "skipped": result.skipped,
        "blocks": blocks,
        "top_senders": senders,
    }))
    .unwrap_or_else(|_| "{}".to_string())
}

fn format_scan_csv(result: &ScanResult, spam_threshold: usize, senders: &[SenderRow]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record(["block_number", "tx_count", "high_volume"]);
    for (number, tx_count) in &result.block_tx_counts {
        let _ = wtr.write_record([
            &number.to_string(),
            &tx_count.to_string(),
            &(*tx_count >= spam_threshold).to_string(),
        ]);
    }
    for number in &result.skipped {
        let _ = wtr.write_record([number.to_string().as_str(), "unavailable", ""]);
    }
    let mut output = String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default();

    if !senders.is_empty() {
        output.push('\n');
        output.push_str(&format_senders_csv(senders));
    }
    output
}

fn format_senders_csv(senders: &[SenderRow]) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    let _ = wtr.write_record(["rank", "address", "sent", "recipients", "dust", "received"]);
    for (i, row) in senders.iter().enumerate() {
        let _ = wtr.write_record([
            (i + 1).to_string().as_str(),
            row.address.as_str(),
            &row.sent.to_string(),
            &row.recipients.to_string(),
            &row.dust.to_string(),
            &row.received.to_string(),
        ]);
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

pub fn format_pending_report(
    status: Option<PoolStatus>,
    senders: Option<&[(AddressKey, usize)]>,
    format: &OutputFormat,
) -> String {
    let Some(status) = status else {
        return match format {
            OutputFormat::Json => json!({ "available": false }).to_string(),
            _ => "Pending pool status not available from this node.".to_string(),
        };
    };

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec!["Metric", "Value"]);
            table.add_row(vec![Cell::new("Pending"), Cell::new(status.pending)]);
            table.add_row(vec![Cell::new("Queued"), Cell::new(status.queued)]);

            let mut output = table.to_string();
            match senders {
                Some([]) => output.push_str("\nNo senders above threshold."),
                Some(senders) => {
                    let mut ranking = Table::new();
                    ranking
                        .load_preset(UTF8_FULL)
                        .apply_modifier(UTF8_ROUND_CORNERS)
                        .set_header(vec!["Rank", "Sender", "Pending txs"]);
                    for (i, (address, count)) in senders.iter().enumerate() {
                        ranking.add_row(vec![Cell::new(i + 1), Cell::new(address), Cell::new(count)]);
                    }
                    output.push('\n');
                    output.push_str(&ranking.to_string());
                }
                None => output.push_str("\nDetailed pool content unavailable."),
            }
            output
        }
        OutputFormat::Json => {
            let senders_json: Option<Vec<_>> = senders.map(|senders| {
                senders
                    .iter()
                    .map(|(address, count)| json!({ "address": address, "pending": count }))
                    .collect()
            });
            serde_json::to_string_pretty(&json!({
                "available": true,
                "pending": status.pending,
                "queued": status.queued,
                "senders": senders_json,
            }))
            .unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["sender", "pending"]);
            let _ = wtr.write_record(["*total*", &status.pending.to_string()]);
            for (address, count) in senders.unwrap_or_default() {
                let _ = wtr.write_record([address.as_str(), &count.to_string()]);
            }
            String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
        }
    }
}
