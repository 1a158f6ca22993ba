use crate::error::ApiError;
use crate::helpers::money::validate_amount;
use crate::helpers::scope::find_campaign;
use crate::helpers::window::resolve_window;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use model::entities::campaign_metric;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// One day of ad-platform results
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct MetricInput {
    pub date: NaiveDate,
    #[validate(custom(function = "validate_amount"))]
    pub spend: Decimal,
    #[validate(custom(function = "validate_amount"))]
    pub revenue: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub leads: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub purchases: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub impressions: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub clicks: i64,
}

/// Batch of daily rows. A row for a day that already exists replaces it.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpsertMetricsRequest {
    #[validate(length(min = 1, max = 1000), nested)]
    pub rows: Vec<MetricInput>,
}

/// Daily metric response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricResponse {
    pub id: i32,
    pub campaign_id: i32,
    pub date: NaiveDate,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub leads: i64,
    pub purchases: i64,
    pub impressions: i64,
    pub clicks: i64,
}

impl From<campaign_metric::Model> for MetricResponse {
    fn from(model: campaign_metric::Model) -> Self {
        Self {
            id: model.id,
            campaign_id: model.campaign_id,
            date: model.date,
            spend: model.spend,
            revenue: model.revenue,
            leads: model.leads,
            purchases: model.purchases,
            impressions: model.impressions,
            clicks: model.clicks,
        }
    }
}

/// Insert or replace daily metrics of a campaign
#[utoipa::path(
    post,
    path = "/api/v1/campaigns/{campaign_id}/metrics",
    tag = "campaigns",
    params(
        ("campaign_id" = i32, Path, description = "Campaign ID"),
    ),
    request_body = UpsertMetricsRequest,
    responses(
        (status = 200, description = "Metrics stored", body = ApiResponse<Vec<MetricResponse>>),
        (status = 404, description = "Campaign not found", body = ErrorResponse),
        (status = 422, description = "Invalid metrics", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn upsert_metrics(
    tenant: TenantContext,
    Path(campaign_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpsertMetricsRequest>>,
) -> Result<Json<ApiResponse<Vec<MetricResponse>>>, ApiError> {
    trace!("Entering upsert_metrics function for campaign_id: {}", campaign_id);
    find_campaign(&state.db, &tenant, campaign_id).await?;

    let txn = state.db.begin().await?;
    let mut stored = Vec::with_capacity(request.rows.len());
    let mut replaced = 0usize;

    for row in request.rows {
        let existing = campaign_metric::Entity::find()
            .filter(campaign_metric::Column::CampaignId.eq(campaign_id))
            .filter(campaign_metric::Column::Date.eq(row.date))
            .one(&txn)
            .await?;

        let is_new = existing.is_none();
        let mut active: campaign_metric::ActiveModel = match existing {
            Some(model) => {
                replaced += 1;
                model.into()
            }
            None => campaign_metric::ActiveModel {
                campaign_id: Set(campaign_id),
                date: Set(row.date),
                ..Default::default()
            },
        };
        active.spend = Set(row.spend);
        active.revenue = Set(row.revenue);
        active.leads = Set(row.leads);
        active.purchases = Set(row.purchases);
        active.impressions = Set(row.impressions);
        active.clicks = Set(row.clicks);

        let model = if is_new {
            active.insert(&txn).await?
        } else {
            active.update(&txn).await?
        };
        stored.push(MetricResponse::from(model));
    }

    txn.commit().await?;
    state.invalidate_cache();
    info!(
        "Stored {} metric rows for campaign {} ({} replaced)",
        stored.len(),
        campaign_id,
        replaced
    );
    Ok(Json(ApiResponse::ok(stored, "Metrics stored successfully")))
}

/// Daily metrics of a campaign inside the window
#[utoipa::path(
    get,
    path = "/api/v1/campaigns/{campaign_id}/metrics",
    tag = "campaigns",
    params(
        ("campaign_id" = i32, Path, description = "Campaign ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Metrics retrieved successfully", body = ApiResponse<Vec<MetricResponse>>),
        (status = 404, description = "Campaign not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_campaign_metrics(
    tenant: TenantContext,
    Path(campaign_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<MetricResponse>>>, ApiError> {
    trace!("Entering get_campaign_metrics function for campaign_id: {}", campaign_id);
    find_campaign(&state.db, &tenant, campaign_id).await?;
    let window = resolve_window(&query)?;

    let rows = campaign_metric::Entity::find()
        .filter(campaign_metric::Column::CampaignId.eq(campaign_id))
        .filter(campaign_metric::Column::Date.between(window.start, window.end))
        .order_by_asc(campaign_metric::Column::Date)
        .all(&state.db)
        .await?;

    debug!("Found {} metric rows", rows.len());
    let data: Vec<MetricResponse> = rows.into_iter().map(MetricResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Metrics retrieved successfully")))
}

#[cfg(test)]
mod tests {
    use super::MetricResponse;
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_campaign, create_test_client, create_test_organization, org_header, org_value,
        setup_test_server,
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn test_same_day_upsert_replaces_row() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "metrics").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;
        let url = format!("/api/v1/campaigns/{}/metrics", campaign_id);

        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [{ "date": "2024-05-10", "spend": "10", "revenue": "20", "leads": 1 }] }))
            .await
            .assert_status(StatusCode::OK);
        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [{ "date": "2024-05-10", "spend": "15", "revenue": "60", "leads": 3 }] }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get(&format!("{}?start_date=2024-05-01&end_date=2024-05-31", url))
            .add_header(org_header(), org_value(org))
            .await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<Vec<MetricResponse>> = response.json();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].spend, Decimal::new(15, 0));
        assert_eq!(body.data[0].leads, 3);
    }

    #[tokio::test]
    async fn test_negative_values_are_rejected() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "negative").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let campaign_id = create_test_campaign(&server, org, client_id).await;

        server
            .post(&format!("/api/v1/campaigns/{}/metrics", campaign_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "rows": [{ "date": "2024-05-10", "spend": "-1", "revenue": "0" }] }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
