//! Stage aggregation over a deal snapshot.

use serde::{Deserialize, Serialize};

use crate::analytics::{percent, to_f64};
use crate::deal::{Deal, DealStage};

/// Per-stage totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: DealStage,
    pub count: usize,
    pub value: f64,
    /// Share of all deals, in percent.
    pub percentage: f64,
    /// Share of the total pipeline value, in percent.
    pub percentage_of_value: f64,
}

impl StageSummary {
    /// Returns true if no deal sits in this stage.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Snapshot ratio between a stage and the one after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConversion {
    pub from: DealStage,
    pub to: DealStage,
    /// Deals currently in `from`.
    pub deals: usize,
    /// `100 * count(to) / count(from)`, or 0 when `from` is empty.
    pub rate: f64,
}

/// Whole-pipeline totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineTotals {
    pub deal_count: usize,
    pub total_value: f64,
    /// Sum of probability-weighted values.
    pub weighted_value: f64,
    /// Deals not yet won or lost.
    pub open_deals: usize,
}

/// Closed-won revenue figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub won_deals: usize,
    /// Sum of closed-won values.
    pub total_revenue: f64,
    pub average_deal_size: f64,
    /// Won deals as a percentage of all deals.
    pub win_rate: f64,
}

/// One summary per stage, in pipeline order. Empty stages are kept.
#[must_use]
pub fn stage_breakdown(deals: &[Deal]) -> Vec<StageSummary> {
    let mut counts = [0usize; DealStage::ALL.len()];
    let mut values = [0.0f64; DealStage::ALL.len()];
    for deal in deals {
        let slot = deal.stage.position();
        counts[slot] += 1;
        values[slot] += deal.value;
    }

    let total_count = to_f64(deals.len());
    let total_value: f64 = values.iter().sum();

    DealStage::ALL
        .into_iter()
        .map(|stage| {
            let slot = stage.position();
            StageSummary {
                stage,
                count: counts[slot],
                value: values[slot],
                percentage: percent(to_f64(counts[slot]), total_count),
                percentage_of_value: percent(values[slot], total_value),
            }
        })
        .collect()
}

/// Conversion between each open stage and its successor:
/// discovery→qualified through negotiation→closed won.
#[must_use]
pub fn conversion_rates(deals: &[Deal]) -> Vec<StageConversion> {
    let summaries = stage_breakdown(deals);
    // Closed-lost never counts as a successor.
    let open = &summaries[..summaries.len() - 1];
    open.windows(2)
        .map(|pair| StageConversion {
            from: pair[0].stage,
            to: pair[1].stage,
            deals: pair[0].count,
            rate: percent(to_f64(pair[1].count), to_f64(pair[0].count)),
        })
        .collect()
}

/// Count and value across the whole snapshot.
#[must_use]
pub fn pipeline_totals(deals: &[Deal]) -> PipelineTotals {
    deals.iter().fold(PipelineTotals::default(), |mut acc, deal| {
        acc.deal_count += 1;
        acc.total_value += deal.value;
        acc.weighted_value += deal.weighted_value();
        if !deal.stage.is_closed() {
            acc.open_deals += 1;
        }
        acc
    })
}

/// Revenue, average won deal and win rate.
#[must_use]
pub fn sales_metrics(deals: &[Deal]) -> SalesMetrics {
    let (won_deals, total_revenue) = deals
        .iter()
        .filter(|deal| deal.stage == DealStage::ClosedWon)
        .fold((0usize, 0.0f64), |(n, sum), deal| (n + 1, sum + deal.value));

    SalesMetrics {
        won_deals,
        total_revenue,
        average_deal_size: if won_deals == 0 {
            0.0
        } else {
            total_revenue / to_f64(won_deals)
        },
        win_rate: percent(to_f64(won_deals), to_f64(deals.len())),
    }
}
