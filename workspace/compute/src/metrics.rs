//! Blended marketing metrics.
//!
//! Ad-platform numbers come from the daily `campaign_metrics` rows, offline
//! revenue comes from manually logged deals. Every ratio in this module is
//! guarded against a zero denominator and returns zero instead.

use rust_decimal::Decimal;
use tracing::{debug, instrument, trace};

use common::{BlendedMetrics, CampaignTotals, ClientTotals, DateWindow, TargetStatus};
use model::entities::{campaign, campaign_metric, deal};

/// Divides two decimals, returning zero when the denominator is not positive.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Cost per lead.
pub fn cost_per_lead(spend: Decimal, leads: i64) -> Decimal {
    ratio(spend, Decimal::from(leads))
}

#[derive(Debug, Default, Clone, Copy)]
struct Sums {
    spend: Decimal,
    revenue: Decimal,
    leads: i64,
    purchases: i64,
    impressions: i64,
    clicks: i64,
}

impl Sums {
    fn add(&mut self, row: &campaign_metric::Model) {
        self.spend += row.spend;
        self.revenue += row.revenue;
        self.leads += row.leads;
        self.purchases += row.purchases;
        self.impressions += row.impressions;
        self.clicks += row.clicks;
    }

    fn collect<'a>(
        rows: impl Iterator<Item = &'a campaign_metric::Model>,
        window: &DateWindow,
    ) -> Self {
        let mut sums = Sums::default();
        for row in rows.filter(|row| window.contains(row.date)) {
            sums.add(row);
        }
        sums
    }
}

/// Sums every daily row inside the window into client-level totals.
///
/// The caller passes the metrics of all the client's campaigns; rows outside
/// the window are ignored.
#[instrument(skip(metrics))]
pub fn client_totals(metrics: &[campaign_metric::Model], window: &DateWindow) -> ClientTotals {
    let sums = Sums::collect(metrics.iter(), window);
    trace!(?sums, "Summed client metrics");

    ClientTotals {
        spend: sums.spend,
        revenue: sums.revenue,
        leads: sums.leads,
        purchases: sums.purchases,
        impressions: sums.impressions,
        clicks: sums.clicks,
        roas: ratio(sums.revenue, sums.spend),
        cpl: cost_per_lead(sums.spend, sums.leads),
    }
}

/// Totals of a single campaign inside the window. Rows belonging to other
/// campaigns are skipped, so the full client metric set may be passed.
pub fn campaign_totals(
    campaign: &campaign::Model,
    metrics: &[campaign_metric::Model],
    window: &DateWindow,
) -> CampaignTotals {
    let sums = Sums::collect(
        metrics.iter().filter(|row| row.campaign_id == campaign.id),
        window,
    );

    CampaignTotals {
        campaign_id: campaign.id,
        name: campaign.name.clone(),
        platform: campaign.platform.clone(),
        spend: sums.spend,
        revenue: sums.revenue,
        leads: sums.leads,
        purchases: sums.purchases,
        impressions: sums.impressions,
        clicks: sums.clicks,
        roas: ratio(sums.revenue, sums.spend),
        cpl: cost_per_lead(sums.spend, sums.leads),
    }
}

/// Combines ad-platform totals with offline deal revenue.
///
/// Deals count towards `offline_revenue` only when their date lies inside the
/// window, both ends included.
#[instrument(skip(campaigns, deals))]
pub fn blended_metrics(
    campaigns: &[CampaignTotals],
    deals: &[deal::Model],
    window: &DateWindow,
) -> BlendedMetrics {
    let ad_spend: Decimal = campaigns.iter().map(|c| c.spend).sum();
    let ad_revenue: Decimal = campaigns.iter().map(|c| c.revenue).sum();
    let ad_leads: i64 = campaigns.iter().map(|c| c.leads).sum();

    let offline_revenue: Decimal = deals
        .iter()
        .filter(|d| window.contains(d.date))
        .map(|d| d.total_value)
        .sum();

    let total_revenue = ad_revenue + offline_revenue;
    let roas = ratio(total_revenue, ad_spend);
    let roi = ratio(total_revenue - ad_spend, ad_spend);

    debug!(
        %ad_spend, %ad_revenue, %offline_revenue, %roas, %roi,
        "Computed blended metrics"
    );

    BlendedMetrics {
        ad_spend,
        ad_revenue,
        offline_revenue,
        total_revenue,
        ad_leads,
        roas,
        roi,
    }
}

/// Dashboard badge comparing the achieved ROAS with the client's target.
pub fn target_status(roas: Decimal, target_roas: Option<Decimal>) -> TargetStatus {
    match target_roas {
        Some(target) if target > Decimal::ZERO => {
            if roas >= target {
                TargetStatus::Above
            } else {
                TargetStatus::Below
            }
        }
        _ => TargetStatus::NoTarget,
    }
}
