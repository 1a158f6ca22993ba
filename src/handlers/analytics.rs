use crate::error::ApiError;
use crate::helpers::scope::find_client;
use crate::helpers::window::{cache_key, resolve_window};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use common::{ClientAnalytics, FinanceSeries};
use compute::analytics::{client_analytics, evolution};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Query of the evolution chart: a date window and an optional client
#[derive(Debug, Default, Clone, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct EvolutionQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, max = 366))]
    pub days: Option<u32>,
    /// Restrict the series to one client; all clients when omitted
    pub client_id: Option<i32>,
}

impl EvolutionQuery {
    fn window_query(&self) -> WindowQuery {
        WindowQuery {
            start_date: self.start_date,
            end_date: self.end_date,
            days: self.days,
        }
    }
}

/// Dashboard payload of a client: blended KPIs, campaign totals, finance
/// series and both funnels
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/analytics",
    tag = "analytics",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Client analytics retrieved successfully", body = ApiResponse<ClientAnalytics>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid window", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_analytics(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<ClientAnalytics>>, ApiError> {
    trace!("Entering get_client_analytics function for client_id: {}", client_id);
    let window = resolve_window(&query)?;
    let key = cache_key("analytics", tenant.organization_id, Some(client_id), &window);

    if let Some(CachedData::Analytics(analytics)) = state.cache.get(&key).await {
        debug!("Serving analytics of client {} from cache", client_id);
        return Ok(Json(ApiResponse::ok(
            *analytics,
            "Client analytics retrieved from cache",
        )));
    }

    let client = find_client(&state.db, &tenant, client_id).await?;
    let analytics = client_analytics(&state.db, &client, window).await?;

    state
        .cache
        .insert(key, CachedData::Analytics(Box::new(analytics.clone())))
        .await;

    info!(
        "Computed analytics of client {} over {} days",
        client_id,
        window.len_days()
    );
    Ok(Json(ApiResponse::ok(analytics, "Client analytics retrieved successfully")))
}

/// Zero-filled daily spend and revenue over every client of the organization,
/// or one of them
#[utoipa::path(
    get,
    path = "/api/v1/reports/evolution",
    tag = "analytics",
    params(EvolutionQuery),
    responses(
        (status = 200, description = "Evolution series retrieved successfully", body = ApiResponse<FinanceSeries>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid window", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_evolution(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<EvolutionQuery>>,
) -> Result<Json<ApiResponse<FinanceSeries>>, ApiError> {
    trace!("Entering get_evolution function");
    let window = resolve_window(&query.window_query())?;
    let key = cache_key("evolution", tenant.organization_id, query.client_id, &window);

    if let Some(CachedData::Evolution(series)) = state.cache.get(&key).await {
        debug!("Serving evolution series from cache");
        return Ok(Json(ApiResponse::ok(series, "Evolution series retrieved from cache")));
    }

    let series = evolution(&state.db, tenant.organization_id, query.client_id, window).await?;
    state.cache.insert(key, CachedData::Evolution(series.clone())).await;

    info!("Computed evolution series with {} points", series.points.len());
    Ok(Json(ApiResponse::ok(series, "Evolution series retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_campaign, create_test_client, create_test_organization, org_header, org_value,
        setup_test_server,
    };
    use axum::http::StatusCode;
    use common::{ClientAnalytics, FinanceSeries, TargetStatus};
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_analytics_blend_deals_and_refresh_after_write() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "analytics").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;

        server
            .post(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [
                { "date": "2024-06-03", "spend": "1000", "revenue": "2000", "leads": 20 }
            ]}))
            .await
            .assert_status(StatusCode::OK);

        let url = format!(
            "/api/v1/clients/{}/analytics?start_date=2024-06-01&end_date=2024-06-30",
            client_id
        );
        let response = server.get(&url).add_header(org_header(), org_value(org)).await;
        response.assert_status(StatusCode::OK);
        let first: ApiResponse<ClientAnalytics> = response.json();
        assert_eq!(first.data.blended.roas, Decimal::new(2, 0));
        assert_eq!(first.data.target_status, TargetStatus::Below);

        // A deal inside the window must show up despite the cached payload
        server
            .post(&format!("/api/v1/clients/{}/deals", client_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "date": "2024-06-30", "total_value": "3000" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server.get(&url).add_header(org_header(), org_value(org)).await;
        let second: ApiResponse<ClientAnalytics> = response.json();
        assert_eq!(second.data.blended.offline_revenue, Decimal::new(3000, 0));
        assert_eq!(second.data.blended.total_revenue, Decimal::new(5000, 0));
        assert_eq!(second.data.blended.roas, Decimal::new(5, 0));
        assert_eq!(second.data.target_status, TargetStatus::Above);
        assert_eq!(second.data.commercial.closed_deals, 1);
    }

    #[tokio::test]
    async fn test_evolution_is_zero_filled() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "evolution").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;

        server
            .post(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [{ "date": "2024-01-02", "spend": "10", "revenue": "30" }] }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/reports/evolution?start_date=2024-01-01&end_date=2024-01-07")
            .add_header(org_header(), org_value(org))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<FinanceSeries> = response.json();
        assert!(body.data.zero_filled);
        assert_eq!(body.data.points.len(), 7);
        assert_eq!(body.data.points[0].spend, 0.0);
        assert_eq!(body.data.points[1].spend, 10.0);
    }

    #[tokio::test]
    async fn test_evolution_for_foreign_client_is_not_found() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "mine").await;
        let other = create_test_organization(&server, "theirs").await;
        let foreign = create_test_client(&server, other, "Other").await;

        server
            .get(&format!("/api/v1/reports/evolution?client_id={}", foreign))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_half_open_window_is_rejected() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "window").await;
        let client_id = create_test_client(&server, org, "Acme").await;

        server
            .get(&format!("/api/v1/clients/{}/analytics?start_date=2024-01-01", client_id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
