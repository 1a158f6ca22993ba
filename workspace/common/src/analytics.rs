//! Aggregated KPI and chart payloads served by the analytics endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::window::DateWindow;

/// Ad-platform totals for one campaign inside a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CampaignTotals {
    pub campaign_id: i32,
    pub name: String,
    pub platform: String,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub leads: i64,
    pub purchases: i64,
    pub impressions: i64,
    pub clicks: i64,
    /// revenue / spend, zero when nothing was spent
    pub roas: Decimal,
    /// spend / leads, zero when there were no leads
    pub cpl: Decimal,
}

/// Ad-platform totals for a whole client inside a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientTotals {
    pub spend: Decimal,
    pub revenue: Decimal,
    pub leads: i64,
    pub purchases: i64,
    pub impressions: i64,
    pub clicks: i64,
    pub roas: Decimal,
    pub cpl: Decimal,
}

/// Ads plus offline revenue reconciled into one KPI set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BlendedMetrics {
    pub ad_spend: Decimal,
    pub ad_revenue: Decimal,
    pub offline_revenue: Decimal,
    pub total_revenue: Decimal,
    pub ad_leads: i64,
    pub roas: Decimal,
    /// (total_revenue - ad_spend) / ad_spend, as a ratio (4.0 means 400%)
    pub roi: Decimal,
}

/// CRM-lite totals for a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CommercialTotals {
    /// Sum of meeting quantities
    pub meetings: i64,
    /// Sum of proposal quantities
    pub proposals: i64,
    /// Number of deal rows
    pub closed_deals: i64,
    pub deal_revenue: Decimal,
}

/// How the blended ROAS compares with the client's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    Above,
    Below,
    NoTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FunnelStage {
    pub key: String,
    pub label: String,
    /// The real count shown on the label
    pub value: i64,
    /// Value used to size the rendered area; never below 1
    pub render_value: i64,
    /// This stage over the previous one; `None` on the first stage and zero
    /// when the previous stage is empty
    pub rate_from_previous: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Funnel {
    pub stages: Vec<FunnelStage>,
    /// False when the stages are independently sourced counts rather than one
    /// tracked cohort moving through them.
    pub cohort_linked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub spend: f64,
    pub ad_revenue: f64,
    pub offline_revenue: f64,
    pub blended_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinanceSeries {
    pub points: Vec<SeriesPoint>,
    /// True when every day of the window has a point
    pub zero_filled: bool,
}

/// Everything the per-client analytics view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ClientAnalytics {
    pub client_id: i32,
    pub window: DateWindow,
    pub totals: ClientTotals,
    pub blended: BlendedMetrics,
    pub target_roas: Option<Decimal>,
    pub target_status: TargetStatus,
    pub campaigns: Vec<CampaignTotals>,
    pub commercial: CommercialTotals,
    pub finance_series: FinanceSeries,
    pub marketing_funnel: Funnel,
    pub commercial_funnel: Funnel,
}

/// One row of the cross-tenant organization report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminOrganizationReport {
    pub organization_id: i32,
    pub name: String,
    pub client_count: i64,
    pub active_client_count: i64,
    pub total_spend: Decimal,
    pub total_revenue: Decimal,
}

/// Platform-wide totals across every tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformSummary {
    pub organizations: i64,
    pub clients: i64,
    pub active_clients: i64,
    pub campaigns: i64,
    pub open_tasks: i64,
    pub total_spend: Decimal,
    pub total_revenue: Decimal,
}
