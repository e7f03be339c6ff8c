//! 80/20 breakdown of channel value.

use serde::{Deserialize, Serialize};

use crate::types::Channel;

use super::aggregate::ChannelMetrics;

/// Cumulative share of value a channel set must stay within
const PARETO_CUTOFF: f64 = 0.8;

/// Which per-channel value a Pareto breakdown ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParetoValue {
    CreditedRevenue,
    Cost,
    Conversions,
}

impl ParetoValue {
    fn of(&self, row: &ChannelMetrics) -> f64 {
        match self {
            Self::CreditedRevenue => row.credited_revenue,
            Self::Cost => row.cost,
            Self::Conversions => row.conversions,
        }
    }
}

/// Channels producing the bulk of a value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParetoSummary {
    pub value: ParetoValue,
    /// Top channels, highest value first
    pub top_channels: Vec<Channel>,
    pub total_channels: usize,
    /// Fraction of channels in the top set
    pub channel_share: f64,
    /// Fraction of the total value the top set produces
    pub value_share: f64,
    /// Every channel with its cumulative share, highest value first
    pub cumulative: Vec<(Channel, f64)>,
}

/// Rank channels by `value` and find those within the first 80% of it.
///
/// The top set always holds at least the highest-value channel. Returns
/// `None` when there are no channels or the total value is zero.
pub fn pareto(rows: &[ChannelMetrics], value: ParetoValue) -> Option<ParetoSummary> {
    let mut ranked: Vec<(&Channel, f64)> = rows.iter().map(|r| (&r.channel, value.of(r))).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total: f64 = ranked.iter().map(|(_, v)| v).sum();
    if ranked.is_empty() || total <= 0.0 {
        return None;
    }

    let mut running = 0.0;
    let cumulative: Vec<(Channel, f64)> = ranked
        .iter()
        .map(|(channel, v)| {
            running += v;
            ((*channel).clone(), running / total)
        })
        .collect();

    let top_count = cumulative
        .iter()
        .take_while(|(_, share)| *share <= PARETO_CUTOFF + 1e-12)
        .count()
        .max(1);

    Some(ParetoSummary {
        value,
        top_channels: cumulative[..top_count].iter().map(|(c, _)| c.clone()).collect(),
        total_channels: cumulative.len(),
        channel_share: top_count as f64 / cumulative.len() as f64,
        value_share: cumulative[top_count - 1].1,
        cumulative,
    })
}
