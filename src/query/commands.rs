use crate::chain::ChainSource;
use crate::classifier::{rank_senders, truncate};
use crate::pending::sender_counts;
use crate::query::formatters::{
    OutputFormat, SenderRow, format_pending_report, format_scan_report,
};
use crate::scanner::scan_range;
use alloy_primitives::U256;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct RangeQuery {
    pub from: u64,
    pub to: u64,
    pub spam_threshold: usize,
    pub dust_threshold: U256,
    pub min_sends: usize,
    pub top: usize,
}

pub async fn cmd_range<C>(source: &C, query: RangeQuery, format: &OutputFormat) -> Result<()>
where
    C: ChainSource + ?Sized,
{
    println!("{}", render_range(source, query, format).await?);
    Ok(())
}

pub async fn render_range<C>(source: &C, query: RangeQuery, format: &OutputFormat) -> Result<String>
where
    C: ChainSource + ?Sized,
{
    if query.from > query.to {
        return Err(anyhow::anyhow!(
            "Invalid range: {} is after {}",
            query.from,
            query.to
        ));
    }

    let result = scan_range(
        source,
        query.from..=query.to,
        query.spam_threshold,
        query.dust_threshold,
    )
    .await;

    let ranked = rank_senders(&result.stats.send_count, query.min_sends);
    let senders: Vec<SenderRow> = truncate(&ranked, query.top)
        .shown
        .iter()
        .map(|(address, _)| SenderRow::from_stats(address, &result.stats))
        .collect();

    Ok(format_scan_report(
        &result,
        query.spam_threshold,
        &senders,
        format,
    ))
}

pub async fn cmd_pending<C>(source: &C, sender_threshold: usize, format: &OutputFormat) -> Result<()>
where
    C: ChainSource + ?Sized,
{
    let status = source.pending_pool_status().await;
    let senders = match status {
        Some(_) => source
            .pending_pool_content()
            .await
            .map(|content| rank_senders(&sender_counts(&content.pending), sender_threshold)),
        None => None,
    };

    println!(
        "{}",
        format_pending_report(status, senders.as_deref(), format)
    );
    Ok(())
}
