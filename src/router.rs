use crate::handlers::{
    activities::{create_activity, delete_activity, get_client_activities},
    admin::{get_organization_reports, get_platform_summary},
    analytics::{get_client_analytics, get_evolution},
    campaigns::{create_campaign, delete_campaign, get_client_campaigns, update_campaign},
    clients::{
        create_client, delete_client, get_client, get_clients, pause_client, reactivate_client,
        update_client,
    },
    contracts::{create_contract, delete_contract, get_client_contracts, update_contract},
    deals::{create_deal, delete_deal, get_client_deals},
    goals::{create_goal, delete_goal, get_goals, update_goal},
    health::health_check,
    insights::{delete_insight, generate_client_insights, get_client_insights},
    metrics::{get_campaign_metrics, upsert_metrics},
    notes::{create_note, delete_note, get_client_notes},
    organizations::{create_organization, get_organization},
    projects::{create_project, delete_project, get_projects, update_project},
    public_report::{get_report_form, submit_report},
    tasks::{
        create_task, delete_task, get_board, get_tasks, move_task, set_task_completion,
        update_task,
    },
};
use crate::schemas::{ApiDoc, AppState};
#[cfg(not(test))]
use axum_prometheus::PrometheusMetricLayer;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Requests still running after this are answered with 408.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Tenants
        .route("/api/v1/organizations", post(create_organization))
        .route("/api/v1/organizations/:organization_id", get(get_organization))
        // Clients
        .route("/api/v1/clients", get(get_clients).post(create_client))
        .route(
            "/api/v1/clients/:client_id",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/v1/clients/:client_id/pause", post(pause_client))
        .route("/api/v1/clients/:client_id/reactivate", post(reactivate_client))
        // Campaigns and daily metrics
        .route(
            "/api/v1/clients/:client_id/campaigns",
            get(get_client_campaigns).post(create_campaign),
        )
        .route(
            "/api/v1/campaigns/:campaign_id",
            put(update_campaign).delete(delete_campaign),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/metrics",
            get(get_campaign_metrics).post(upsert_metrics),
        )
        // CRM
        .route(
            "/api/v1/clients/:client_id/deals",
            get(get_client_deals).post(create_deal),
        )
        .route("/api/v1/deals/:deal_id", delete(delete_deal))
        .route(
            "/api/v1/clients/:client_id/activities",
            get(get_client_activities).post(create_activity),
        )
        .route("/api/v1/activities/:activity_id", delete(delete_activity))
        // Task board, projects and goals
        .route("/api/v1/tasks", get(get_tasks).post(create_task))
        .route("/api/v1/tasks/:task_id", put(update_task).delete(delete_task))
        .route("/api/v1/tasks/:task_id/category", patch(move_task))
        .route("/api/v1/tasks/:task_id/completion", patch(set_task_completion))
        .route("/api/v1/board", get(get_board))
        .route("/api/v1/projects", get(get_projects).post(create_project))
        .route(
            "/api/v1/projects/:project_id",
            put(update_project).delete(delete_project),
        )
        .route("/api/v1/goals", get(get_goals).post(create_goal))
        .route("/api/v1/goals/:goal_id", put(update_goal).delete(delete_goal))
        // Notes and contracts
        .route(
            "/api/v1/clients/:client_id/notes",
            get(get_client_notes).post(create_note),
        )
        .route("/api/v1/notes/:note_id", delete(delete_note))
        .route(
            "/api/v1/clients/:client_id/contracts",
            get(get_client_contracts).post(create_contract),
        )
        .route(
            "/api/v1/contracts/:contract_id",
            put(update_contract).delete(delete_contract),
        )
        // Insights
        .route("/api/v1/clients/:client_id/insights", get(get_client_insights))
        .route(
            "/api/v1/clients/:client_id/insights/generate",
            post(generate_client_insights),
        )
        .route("/api/v1/insights/:insight_id", delete(delete_insight))
        // Analytics
        .route("/api/v1/clients/:client_id/analytics", get(get_client_analytics))
        .route("/api/v1/reports/evolution", get(get_evolution))
        // Admin
        .route("/api/v1/admin/organizations", get(get_organization_reports))
        .route("/api/v1/admin/summary", get(get_platform_summary))
        // Public report form
        .route("/api/v1/report/:client_id", get(get_report_form).post(submit_report))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // The prometheus recorder is process-global, so tests run without it
    #[cfg(not(test))]
    let router = {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer)
    };

    router
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
