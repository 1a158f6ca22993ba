//! Chart series and funnels.
//!
//! Daily series are built as polars DataFrames with the columns
//! `date`, `spend`, `ad_revenue`, `offline_revenue` and `blended_revenue`.
//! Dates are stored as `YYYY-MM-DD` strings in the frame and parsed back when
//! the frame is converted into the transport type.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, instrument, trace};

use common::{ClientTotals, CommercialTotals, DateWindow, FinanceSeries, Funnel, FunnelStage, SeriesPoint};
use model::entities::{campaign_metric, deal};

use crate::error::{ComputeError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone, Copy)]
struct DayTotals {
    spend: Decimal,
    ad_revenue: Decimal,
    offline_revenue: Decimal,
}

fn to_f64(value: Decimal) -> Result<f64> {
    value
        .to_f64()
        .ok_or_else(|| ComputeError::Decimal(format!("{} does not fit into f64", value)))
}

fn build_frame(days: BTreeMap<NaiveDate, DayTotals>) -> Result<DataFrame> {
    let mut dates = Vec::with_capacity(days.len());
    let mut spend = Vec::with_capacity(days.len());
    let mut ad_revenue = Vec::with_capacity(days.len());
    let mut offline_revenue = Vec::with_capacity(days.len());
    let mut blended_revenue = Vec::with_capacity(days.len());

    for (date, totals) in days {
        dates.push(date.format(DATE_FORMAT).to_string());
        spend.push(to_f64(totals.spend)?);
        ad_revenue.push(to_f64(totals.ad_revenue)?);
        offline_revenue.push(to_f64(totals.offline_revenue)?);
        blended_revenue.push(to_f64(totals.ad_revenue + totals.offline_revenue)?);
    }

    let df = DataFrame::new(vec![
        Series::new("date".into(), dates).into(),
        Series::new("spend".into(), spend).into(),
        Series::new("ad_revenue".into(), ad_revenue).into(),
        Series::new("offline_revenue".into(), offline_revenue).into(),
        Series::new("blended_revenue".into(), blended_revenue).into(),
    ])?;

    trace!(rows = df.height(), "Built finance frame");
    Ok(df)
}

fn metric_days(
    metrics: &[campaign_metric::Model],
    window: &DateWindow,
) -> BTreeMap<NaiveDate, DayTotals> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    for row in metrics.iter().filter(|m| window.contains(m.date)) {
        let day = days.entry(row.date).or_default();
        day.spend += row.spend;
        day.ad_revenue += row.revenue;
    }
    days
}

/// Daily finance series for the dashboard charts.
///
/// Only dates that have at least one metric row in the window appear. Deal
/// revenue is added to those dates; a deal on a date without metrics does not
/// create a point.
#[instrument(skip(metrics, deals))]
pub fn finance_series(
    metrics: &[campaign_metric::Model],
    deals: &[deal::Model],
    window: &DateWindow,
) -> Result<DataFrame> {
    let mut days = metric_days(metrics, window);

    for deal in deals.iter().filter(|d| window.contains(d.date)) {
        if let Some(day) = days.get_mut(&deal.date) {
            day.offline_revenue += deal.total_value;
        }
    }

    debug!(points = days.len(), "Computed finance series");
    build_frame(days)
}

/// Daily series for the reports view: every day of the window is present,
/// zero when nothing happened, and deal-only days carry their revenue.
#[instrument(skip(metrics, deals))]
pub fn evolution_series(
    metrics: &[campaign_metric::Model],
    deals: &[deal::Model],
    window: &DateWindow,
) -> Result<DataFrame> {
    let mut days = metric_days(metrics, window);
    for date in window.days() {
        days.entry(date).or_default();
    }

    for deal in deals.iter().filter(|d| window.contains(d.date)) {
        days.entry(deal.date).or_default().offline_revenue += deal.total_value;
    }

    debug!(points = days.len(), "Computed evolution series");
    build_frame(days)
}

/// Converts a finance frame into its transport representation.
pub fn frame_to_series(df: &DataFrame, zero_filled: bool) -> Result<FinanceSeries> {
    let dates = df.column("date")?.str()?;
    let spend = df.column("spend")?.f64()?;
    let ad_revenue = df.column("ad_revenue")?.f64()?;
    let offline_revenue = df.column("offline_revenue")?.f64()?;
    let blended_revenue = df.column("blended_revenue")?.f64()?;

    let mut points = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let raw_date = dates
            .get(i)
            .ok_or_else(|| ComputeError::Date(format!("Missing date at row {}", i)))?;
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| ComputeError::Date(format!("Invalid date {}: {}", raw_date, e)))?;

        points.push(SeriesPoint {
            date,
            spend: spend.get(i).unwrap_or(0.0),
            ad_revenue: ad_revenue.get(i).unwrap_or(0.0),
            offline_revenue: offline_revenue.get(i).unwrap_or(0.0),
            blended_revenue: blended_revenue.get(i).unwrap_or(0.0),
        });
    }

    Ok(FinanceSeries {
        points,
        zero_filled,
    })
}

/// Conversion rate between two funnel stages in percent; zero when the
/// previous stage is empty.
pub fn stage_rate(previous: i64, next: i64) -> f64 {
    if previous <= 0 {
        return 0.0;
    }
    next as f64 / previous as f64 * 100.0
}

fn funnel(stages: &[(&str, &str, i64)], cohort_linked: bool) -> Funnel {
    let mut built: Vec<FunnelStage> = Vec::with_capacity(stages.len());
    for (key, label, value) in stages {
        let rate_from_previous = built.last().map(|prev| stage_rate(prev.value, *value));
        built.push(FunnelStage {
            key: key.to_string(),
            label: label.to_string(),
            value: *value,
            render_value: (*value).max(1),
            rate_from_previous,
        });
    }
    Funnel {
        stages: built,
        cohort_linked,
    }
}

/// Impressions, clicks, leads and purchases of the ad platforms.
pub fn marketing_funnel(totals: &ClientTotals) -> Funnel {
    funnel(
        &[
            ("impressions", "Impressions", totals.impressions),
            ("clicks", "Clicks", totals.clicks),
            ("leads", "Leads", totals.leads),
            ("purchases", "Purchases", totals.purchases),
        ],
        true,
    )
}

/// Ad leads followed by CRM meetings, proposals and closed deals.
///
/// The four counts come from unrelated sources and do not describe one
/// cohort, so the funnel is marked as not cohort linked.
pub fn commercial_funnel(ad_leads: i64, commercial: &CommercialTotals) -> Funnel {
    funnel(
        &[
            ("leads", "Leads", ad_leads),
            ("meetings", "Meetings", commercial.meetings),
            ("proposals", "Proposals", commercial.proposals),
            ("closed_deals", "Closed deals", commercial.closed_deals),
        ],
        false,
    )
}
