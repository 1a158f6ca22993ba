use crate::ai::{generate_insights, InsightKind};
use crate::error::ApiError;
use crate::helpers::scope::{find_client, find_owned};
use crate::helpers::window::resolve_window;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use compute::analytics::client_analytics;
use model::entities::insight;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// Stored insight response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InsightResponse {
    pub id: i32,
    pub client_id: i32,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
}

impl From<insight::Model> for InsightResponse {
    fn from(model: insight::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            kind: model.insight_type.into(),
            title: model.title,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Stored insights of a client
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/insights",
    tag = "insights",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Insights retrieved successfully", body = ApiResponse<Vec<InsightResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_insights(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<InsightResponse>>>, ApiError> {
    trace!("Entering get_client_insights function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let insights = insight::Entity::find()
        .filter(insight::Column::ClientId.eq(client_id))
        .order_by_asc(insight::Column::Id)
        .all(&state.db)
        .await?;

    let data: Vec<InsightResponse> = insights.into_iter().map(InsightResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Insights retrieved successfully")))
}

/// Generate fresh insights for a client from its numbers in the window.
///
/// The new insights replace the stored ones. When the AI provider is not
/// configured or fails, a single informational insight is stored instead.
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/insights/generate",
    tag = "insights",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Insights generated", body = ApiResponse<Vec<InsightResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn generate_client_insights(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<InsightResponse>>>, ApiError> {
    trace!("Entering generate_client_insights function for client_id: {}", client_id);
    let client = find_client(&state.db, &tenant, client_id).await?;
    let window = resolve_window(&query)?;

    let analytics = client_analytics(&state.db, &client, window).await?;
    let generated = generate_insights(state.ai.as_ref(), &client.name, &analytics).await;
    debug!("Generated {} insights", generated.len());

    let txn = state.db.begin().await?;
    insight::Entity::delete_many()
        .filter(insight::Column::ClientId.eq(client_id))
        .exec(&txn)
        .await?;

    let now = Utc::now().naive_utc();
    let mut stored = Vec::with_capacity(generated.len());
    for item in generated {
        let model = insight::ActiveModel {
            organization_id: Set(tenant.organization_id),
            client_id: Set(client_id),
            insight_type: Set(item.kind.into()),
            title: Set(item.title),
            description: Set(item.description),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        stored.push(InsightResponse::from(model));
    }
    txn.commit().await?;

    info!("Stored {} insights for client {}", stored.len(), client_id);
    Ok(Json(ApiResponse::ok(stored, "Insights generated")))
}

/// Dismiss an insight
#[utoipa::path(
    delete,
    path = "/api/v1/insights/{insight_id}",
    tag = "insights",
    params(
        ("insight_id" = i32, Path, description = "Insight ID"),
    ),
    responses(
        (status = 200, description = "Insight dismissed", body = ApiResponse<String>),
        (status = 404, description = "Insight not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_insight(
    tenant: TenantContext,
    Path(insight_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_insight function for insight_id: {}", insight_id);
    find_owned::<insight::Entity, _>(&state.db, &tenant, insight::Column::OrganizationId, insight_id, "Insight")
        .await?;

    insight::Entity::delete_by_id(insight_id).exec(&state.db).await?;
    info!("Insight with ID {} dismissed", insight_id);
    Ok(Json(ApiResponse::ok(format!("Insight {} deleted", insight_id), "Insight dismissed")))
}
