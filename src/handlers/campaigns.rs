use crate::error::ApiError;
use crate::helpers::scope::{find_campaign, find_client};
use crate::helpers::window::resolve_window;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::Utc;
use common::CampaignTotals;
use compute::analytics::client_campaign_totals;
use model::entities::campaign::{self, CampaignStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Lifecycle of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatusDto {
    Active,
    Paused,
    Ended,
}

impl From<CampaignStatus> for CampaignStatusDto {
    fn from(status: CampaignStatus) -> Self {
        match status {
            CampaignStatus::Active => CampaignStatusDto::Active,
            CampaignStatus::Paused => CampaignStatusDto::Paused,
            CampaignStatus::Ended => CampaignStatusDto::Ended,
        }
    }
}

impl From<CampaignStatusDto> for CampaignStatus {
    fn from(status: CampaignStatusDto) -> Self {
        match status {
            CampaignStatusDto::Active => CampaignStatus::Active,
            CampaignStatusDto::Paused => CampaignStatus::Paused,
            CampaignStatusDto::Ended => CampaignStatus::Ended,
        }
    }
}

/// Request body for creating a new campaign
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Ad platform, e.g. "meta" or "google"
    #[validate(length(min = 1, max = 50))]
    pub platform: String,
    /// Initial status (default: active)
    pub status: Option<CampaignStatusDto>,
}

/// Request body for updating a campaign
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCampaignRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub platform: Option<String>,
    pub status: Option<CampaignStatusDto>,
}

/// Campaign response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CampaignResponse {
    pub id: i32,
    pub client_id: i32,
    pub name: String,
    pub platform: String,
    pub status: CampaignStatusDto,
    /// Sums over the campaign's daily metrics inside the requested window
    pub totals: Option<CampaignTotals>,
}

impl CampaignResponse {
    fn from_model(model: campaign::Model, totals: Option<CampaignTotals>) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            name: model.name,
            platform: model.platform,
            status: model.status.into(),
            totals,
        }
    }
}

/// List the campaigns of a client with their totals for the window
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/campaigns",
    tag = "campaigns",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Campaigns retrieved successfully", body = ApiResponse<Vec<CampaignResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_campaigns(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<CampaignResponse>>>, ApiError> {
    trace!("Entering get_client_campaigns function for client_id: {}", client_id);
    let window = resolve_window(&query)?;
    find_client(&state.db, &tenant, client_id).await?;

    let campaigns = campaign::Entity::find()
        .filter(campaign::Column::ClientId.eq(client_id))
        .order_by_asc(campaign::Column::Id)
        .all(&state.db)
        .await?;
    let mut totals: HashMap<i32, CampaignTotals> = client_campaign_totals(&state.db, client_id, window)
        .await?
        .into_iter()
        .map(|t| (t.campaign_id, t))
        .collect();

    let data: Vec<CampaignResponse> = campaigns
        .into_iter()
        .map(|c| {
            let campaign_totals = totals.remove(&c.id);
            CampaignResponse::from_model(c, campaign_totals)
        })
        .collect();

    info!("Retrieved {} campaigns for client {}", data.len(), client_id);
    Ok(Json(ApiResponse::ok(data, "Campaigns retrieved successfully")))
}

/// Create a campaign for a client
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/campaigns",
    tag = "campaigns",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created successfully", body = ApiResponse<CampaignResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_campaign(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateCampaignRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CampaignResponse>>), ApiError> {
    trace!("Entering create_campaign function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let model = campaign::ActiveModel {
        organization_id: Set(tenant.organization_id),
        client_id: Set(client_id),
        name: Set(request.name),
        platform: Set(request.platform),
        status: Set(request.status.unwrap_or(CampaignStatusDto::Active).into()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Campaign created successfully with ID: {}, platform: {}", model.id, model.platform);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CampaignResponse::from_model(model, None),
            "Campaign created successfully",
        )),
    ))
}

/// Update a campaign
#[utoipa::path(
    put,
    path = "/api/v1/campaigns/{campaign_id}",
    tag = "campaigns",
    params(
        ("campaign_id" = i32, Path, description = "Campaign ID"),
    ),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated successfully", body = ApiResponse<CampaignResponse>),
        (status = 404, description = "Campaign not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_campaign(
    tenant: TenantContext,
    Path(campaign_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateCampaignRequest>>,
) -> Result<Json<ApiResponse<CampaignResponse>>, ApiError> {
    trace!("Entering update_campaign function for campaign_id: {}", campaign_id);
    let existing = find_campaign(&state.db, &tenant, campaign_id).await?;

    let mut active: campaign::ActiveModel = existing.into();
    if let Some(name) = request.name {
        debug!("Updating campaign name to: {}", name);
        active.name = Set(name);
    }
    if let Some(platform) = request.platform {
        active.platform = Set(platform);
    }
    if let Some(status) = request.status {
        debug!("Updating campaign status to: {:?}", status);
        active.status = Set(status.into());
    }

    let updated = active.update(&state.db).await?;
    state.invalidate_cache();
    info!("Campaign with ID {} updated successfully", campaign_id);
    Ok(Json(ApiResponse::ok(
        CampaignResponse::from_model(updated, None),
        "Campaign updated successfully",
    )))
}

/// Delete a campaign together with its daily metrics
#[utoipa::path(
    delete,
    path = "/api/v1/campaigns/{campaign_id}",
    tag = "campaigns",
    params(
        ("campaign_id" = i32, Path, description = "Campaign ID"),
    ),
    responses(
        (status = 200, description = "Campaign deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Campaign not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_campaign(
    tenant: TenantContext,
    Path(campaign_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_campaign function for campaign_id: {}", campaign_id);
    find_campaign(&state.db, &tenant, campaign_id).await?;

    campaign::Entity::delete_by_id(campaign_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Campaign with ID {} deleted successfully", campaign_id);
    Ok(Json(ApiResponse::ok(
        format!("Campaign {} deleted", campaign_id),
        "Campaign deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::{CampaignResponse, CampaignStatusDto};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_campaign, create_test_client, create_test_organization, org_header, org_value,
        setup_test_server,
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_campaign_totals_follow_window() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "campaigns").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;

        server
            .post(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [
                { "date": "2024-03-01", "spend": "50", "revenue": "200", "leads": 5, "clicks": 40 },
                { "date": "2024-03-02", "spend": "50", "revenue": "100", "leads": 0, "clicks": 10 },
                { "date": "2024-04-01", "spend": "500", "revenue": "0", "leads": 0 }
            ]}))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get(&format!(
                "/api/v1/clients/{}/campaigns?start_date=2024-03-01&end_date=2024-03-31",
                client_id
            ))
            .add_header(org_header(), org_value(org))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<CampaignResponse>> = response.json();
        assert_eq!(body.data.len(), 1);
        let totals = body.data[0].totals.clone().unwrap();
        assert_eq!(totals.spend, Decimal::new(100, 0));
        assert_eq!(totals.revenue, Decimal::new(300, 0));
        assert_eq!(totals.clicks, 50);
        assert_eq!(totals.roas, Decimal::new(3, 0));
        assert_eq!(totals.cpl, Decimal::new(20, 0));
    }

    #[tokio::test]
    async fn test_update_and_delete_campaign() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "campaign-edit").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;

        let response = server
            .put(&format!("/api/v1/campaigns/{}", campaign_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "status": "paused" }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<CampaignResponse> = response.json();
        assert_eq!(body.data.status, CampaignStatusDto::Paused);

        server
            .delete(&format!("/api/v1/campaigns/{}", campaign_id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::OK);

        server
            .get(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_campaign_of_other_tenant_is_hidden() {
        let server = setup_test_server().await;
        let owner = create_test_organization(&server, "owner").await;
        let other = create_test_organization(&server, "other").await;
        let client_id = create_test_client(&server, owner, "Acme").await;
        let campaign_id = create_test_campaign(&server, owner, client_id).await;

        server
            .delete(&format!("/api/v1/campaigns/{}", campaign_id))
            .add_header(org_header(), org_value(other))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .post(&format!("/api/v1/clients/{}/campaigns", client_id))
            .add_header(org_header(), org_value(other))
            .json(&json!({ "name": "Intruder", "platform": "meta" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
