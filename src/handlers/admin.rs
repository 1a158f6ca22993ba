use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::AdminAccess;
use axum::{extract::State, response::Json};
use common::{AdminOrganizationReport, PlatformSummary};
use compute::reports::{organization_reports, platform_summary};
use tracing::{info, instrument};

/// Per-organization client counts and all-time spend and revenue
#[utoipa::path(
    get,
    path = "/api/v1/admin/organizations",
    tag = "admin",
    params(
        ("x-admin-token" = String, Header, description = "Configured admin token"),
    ),
    responses(
        (status = 200, description = "Organization reports retrieved", body = ApiResponse<Vec<AdminOrganizationReport>>),
        (status = 403, description = "Missing or wrong admin token", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_organization_reports(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AdminOrganizationReport>>>, ApiError> {
    let reports = organization_reports(&state.db).await?;
    info!("Built reports for {} organizations", reports.len());
    Ok(Json(ApiResponse::ok(reports, "Organization reports retrieved successfully")))
}

/// Platform-wide totals
#[utoipa::path(
    get,
    path = "/api/v1/admin/summary",
    tag = "admin",
    params(
        ("x-admin-token" = String, Header, description = "Configured admin token"),
    ),
    responses(
        (status = 200, description = "Platform summary retrieved", body = ApiResponse<PlatformSummary>),
        (status = 403, description = "Missing or wrong admin token", body = ErrorResponse)
    )
)]
#[instrument(skip(state, _admin))]
pub async fn get_platform_summary(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PlatformSummary>>, ApiError> {
    let summary = platform_summary(&state.db).await?;
    info!(
        organizations = summary.organizations,
        clients = summary.clients,
        "Built platform summary"
    );
    Ok(Json(ApiResponse::ok(summary, "Platform summary retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        admin_header, create_test_campaign, create_test_client, create_test_organization,
        org_header, org_value, setup_test_server, TEST_ADMIN_TOKEN,
    };
    use axum::http::{HeaderValue, StatusCode};
    use common::{AdminOrganizationReport, PlatformSummary};
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let server = setup_test_server().await;

        server
            .get("/api/v1/admin/summary")
            .await
            .assert_status(StatusCode::FORBIDDEN);
        server
            .get("/api/v1/admin/organizations")
            .add_header(admin_header(), HeaderValue::from_static("wrong"))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reports_aggregate_across_tenants() {
        let server = setup_test_server().await;
        let first = create_test_organization(&server, "alpha").await;
        let second = create_test_organization(&server, "beta").await;
        let client_id = create_test_client(&server, first, "Acme").await;
        create_test_client(&server, second, "Globex").await;
        let campaign_id = create_test_campaign(&server, first, client_id).await;

        server
            .post(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(first))
            .json(&json!({ "rows": [{ "date": "2023-11-11", "spend": "120", "revenue": "480" }] }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/admin/organizations")
            .add_header(admin_header(), HeaderValue::from_static(TEST_ADMIN_TOKEN))
            .await;
        response.assert_status(StatusCode::OK);
        let reports: ApiResponse<Vec<AdminOrganizationReport>> = response.json();
        assert_eq!(reports.data.len(), 2);
        let alpha = reports.data.iter().find(|r| r.organization_id == first).unwrap();
        assert_eq!(alpha.client_count, 1);
        assert_eq!(alpha.total_spend, Decimal::new(120, 0));
        assert_eq!(alpha.total_revenue, Decimal::new(480, 0));

        let response = server
            .get("/api/v1/admin/summary")
            .add_header(admin_header(), HeaderValue::from_static(TEST_ADMIN_TOKEN))
            .await;
        let summary: ApiResponse<PlatformSummary> = response.json();
        assert_eq!(summary.data.organizations, 2);
        assert_eq!(summary.data.clients, 2);
        assert_eq!(summary.data.campaigns, 1);
    }
}
