use chrono::NaiveDate;
use common::{ClientAnalytics, FinanceSeries};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

pub use common::{ApiResponse, ErrorResponse};

use crate::ai::AiClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for analytics payloads
    pub cache: Cache<String, CachedData>,
    /// AI provider, absent when no key is configured
    pub ai: Option<AiClient>,
    /// Token required by the admin routes
    pub admin_token: Option<String>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("db", &self.db)
            .field("ai", &self.ai)
            .field("admin_enabled", &self.admin_token.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Drop every cached analytics payload. Called after each write.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Analytics(Box<ClientAnalytics>),
    Evolution(FinanceSeries),
}

/// Date window query. Either both dates or neither; without dates the window
/// ends today and spans `days` days (30 by default).
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct WindowQuery {
    /// First day of the window (YYYY-MM-DD), inclusive
    pub start_date: Option<NaiveDate>,
    /// Last day of the window (YYYY-MM-DD), inclusive
    pub end_date: Option<NaiveDate>,
    /// Length of the trailing window when no dates are given
    #[validate(range(min = 1, max = 366))]
    pub days: Option<u32>,
}

/// Explicit confirmation for destructive actions
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::organizations::create_organization,
        crate::handlers::organizations::get_organization,
        crate::handlers::clients::get_clients,
        crate::handlers::clients::create_client,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::clients::pause_client,
        crate::handlers::clients::reactivate_client,
        crate::handlers::campaigns::get_client_campaigns,
        crate::handlers::campaigns::create_campaign,
        crate::handlers::campaigns::update_campaign,
        crate::handlers::campaigns::delete_campaign,
        crate::handlers::metrics::upsert_metrics,
        crate::handlers::metrics::get_campaign_metrics,
        crate::handlers::deals::get_client_deals,
        crate::handlers::deals::create_deal,
        crate::handlers::deals::delete_deal,
        crate::handlers::activities::get_client_activities,
        crate::handlers::activities::create_activity,
        crate::handlers::activities::delete_activity,
        crate::handlers::tasks::get_tasks,
        crate::handlers::tasks::create_task,
        crate::handlers::tasks::update_task,
        crate::handlers::tasks::move_task,
        crate::handlers::tasks::set_task_completion,
        crate::handlers::tasks::delete_task,
        crate::handlers::tasks::get_board,
        crate::handlers::projects::get_projects,
        crate::handlers::projects::create_project,
        crate::handlers::projects::update_project,
        crate::handlers::projects::delete_project,
        crate::handlers::goals::get_goals,
        crate::handlers::goals::create_goal,
        crate::handlers::goals::update_goal,
        crate::handlers::goals::delete_goal,
        crate::handlers::notes::get_client_notes,
        crate::handlers::notes::create_note,
        crate::handlers::notes::delete_note,
        crate::handlers::contracts::get_client_contracts,
        crate::handlers::contracts::create_contract,
        crate::handlers::contracts::update_contract,
        crate::handlers::contracts::delete_contract,
        crate::handlers::insights::get_client_insights,
        crate::handlers::insights::generate_client_insights,
        crate::handlers::insights::delete_insight,
        crate::handlers::analytics::get_client_analytics,
        crate::handlers::analytics::get_evolution,
        crate::handlers::admin::get_organization_reports,
        crate::handlers::admin::get_platform_summary,
        crate::handlers::public_report::get_report_form,
        crate::handlers::public_report::submit_report,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            WindowQuery,
            ConfirmQuery,
            common::ClientAnalytics,
            common::ClientTotals,
            common::CampaignTotals,
            common::BlendedMetrics,
            common::CommercialTotals,
            common::TargetStatus,
            common::Funnel,
            common::FunnelStage,
            common::FinanceSeries,
            common::SeriesPoint,
            common::DateWindow,
            common::AdminOrganizationReport,
            common::PlatformSummary,
            common::BoardSnapshot,
            common::TaskDto,
            common::ProjectDto,
            common::GoalDto,
            common::ClientDto,
            common::ClientStatus,
            common::TaskCategory,
            common::MoveTaskRequest,
            common::ToggleTaskRequest,
            crate::ai::InsightKind,
            crate::handlers::organizations::CreateOrganizationRequest,
            crate::handlers::organizations::OrganizationResponse,
            crate::handlers::clients::CreateClientRequest,
            crate::handlers::clients::UpdateClientRequest,
            crate::handlers::campaigns::CreateCampaignRequest,
            crate::handlers::campaigns::UpdateCampaignRequest,
            crate::handlers::campaigns::CampaignStatusDto,
            crate::handlers::campaigns::CampaignResponse,
            crate::handlers::metrics::MetricInput,
            crate::handlers::metrics::UpsertMetricsRequest,
            crate::handlers::metrics::MetricResponse,
            crate::handlers::deals::CreateDealRequest,
            crate::handlers::deals::DealResponse,
            crate::handlers::activities::ActivityKind,
            crate::handlers::activities::CreateActivityRequest,
            crate::handlers::activities::ActivityResponse,
            crate::handlers::tasks::CreateTaskRequest,
            crate::handlers::tasks::UpdateTaskRequest,
            crate::handlers::projects::CreateProjectRequest,
            crate::handlers::projects::UpdateProjectRequest,
            crate::handlers::goals::CreateGoalRequest,
            crate::handlers::goals::UpdateGoalRequest,
            crate::handlers::notes::CreateNoteRequest,
            crate::handlers::notes::NoteResponse,
            crate::handlers::contracts::ContractStatusDto,
            crate::handlers::contracts::CreateContractRequest,
            crate::handlers::contracts::UpdateContractRequest,
            crate::handlers::contracts::ContractResponse,
            crate::handlers::insights::InsightResponse,
            crate::handlers::public_report::ReportFormResponse,
            crate::handlers::public_report::ReportSubmission,
            crate::handlers::public_report::SaleReport,
            crate::handlers::public_report::ProspectReport,
            crate::handlers::public_report::WeeklySummaryReport,
            crate::handlers::public_report::SubmissionReceipt,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "organizations", description = "Tenant management"),
        (name = "clients", description = "Agency clients"),
        (name = "campaigns", description = "Ad campaigns and their daily metrics"),
        (name = "crm", description = "Deals and commercial activities"),
        (name = "tasks", description = "Kanban board, projects and goals"),
        (name = "notes", description = "Client notes and contracts"),
        (name = "insights", description = "AI generated insights"),
        (name = "analytics", description = "Dashboard and report aggregates"),
        (name = "admin", description = "Platform-wide reports"),
        (name = "public", description = "Unauthenticated client report form"),
    ),
    info(
        title = "AgencyOps API",
        description = "Marketing agency operations dashboard - client ROI tracking, CRM-lite funnel, task board and AI insights",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
