use crate::error::ApiError;
use crate::helpers::converters::goal_to_dto;
use crate::helpers::money::validate_amount;
use crate::helpers::scope::{check_client_ref, find_owned};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use common::GoalDto;
use model::entities::goal;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new goal
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateGoalRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub client_id: Option<i32>,
    #[validate(custom(function = "validate_amount"))]
    pub target_value: Decimal,
    /// Progress so far (default: 0)
    #[validate(custom(function = "validate_amount"))]
    pub current_value: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
}

/// Request body for updating a goal
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateGoalRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    pub target_value: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub current_value: Option<Decimal>,
    pub deadline: Option<NaiveDate>,
}

async fn find_goal(state: &AppState, tenant: &TenantContext, goal_id: i32) -> Result<goal::Model, ApiError> {
    find_owned::<goal::Entity, _>(&state.db, tenant, goal::Column::OrganizationId, goal_id, "Goal").await
}

/// List the goals of the organization
#[utoipa::path(
    get,
    path = "/api/v1/goals",
    tag = "tasks",
    responses(
        (status = 200, description = "Goals retrieved successfully", body = ApiResponse<Vec<GoalDto>>)
    )
)]
#[instrument(skip(state))]
pub async fn get_goals(
    tenant: TenantContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GoalDto>>>, ApiError> {
    trace!("Entering get_goals function");
    let goals = goal::Entity::find()
        .filter(goal::Column::OrganizationId.eq(tenant.organization_id))
        .order_by_asc(goal::Column::Id)
        .all(&state.db)
        .await?;

    let data: Vec<GoalDto> = goals.into_iter().map(goal_to_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Goals retrieved successfully")))
}

/// Create a new goal
#[utoipa::path(
    post,
    path = "/api/v1/goals",
    tag = "tasks",
    request_body = CreateGoalRequest,
    responses(
        (status = 201, description = "Goal created successfully", body = ApiResponse<GoalDto>),
        (status = 404, description = "Referenced client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_goal(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateGoalRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<GoalDto>>), ApiError> {
    trace!("Entering create_goal function");
    check_client_ref(&state.db, &tenant, request.client_id).await?;

    let model = goal::ActiveModel {
        organization_id: Set(tenant.organization_id),
        client_id: Set(request.client_id),
        title: Set(request.title),
        target_value: Set(request.target_value),
        current_value: Set(request.current_value.unwrap_or(Decimal::ZERO)),
        deadline: Set(request.deadline),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Goal created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(goal_to_dto(model), "Goal created successfully")),
    ))
}

/// Update a goal
#[utoipa::path(
    put,
    path = "/api/v1/goals/{goal_id}",
    tag = "tasks",
    params(
        ("goal_id" = i32, Path, description = "Goal ID"),
    ),
    request_body = UpdateGoalRequest,
    responses(
        (status = 200, description = "Goal updated successfully", body = ApiResponse<GoalDto>),
        (status = 404, description = "Goal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_goal(
    tenant: TenantContext,
    Path(goal_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateGoalRequest>>,
) -> Result<Json<ApiResponse<GoalDto>>, ApiError> {
    trace!("Entering update_goal function for goal_id: {}", goal_id);
    let mut active: goal::ActiveModel = find_goal(&state, &tenant, goal_id).await?.into();

    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(target_value) = request.target_value {
        active.target_value = Set(target_value);
    }
    if let Some(current_value) = request.current_value {
        active.current_value = Set(current_value);
    }
    if let Some(deadline) = request.deadline {
        active.deadline = Set(Some(deadline));
    }

    let updated = active.update(&state.db).await?;
    state.invalidate_cache();
    info!("Goal with ID {} updated successfully", goal_id);
    Ok(Json(ApiResponse::ok(goal_to_dto(updated), "Goal updated successfully")))
}

/// Delete a goal
#[utoipa::path(
    delete,
    path = "/api/v1/goals/{goal_id}",
    tag = "tasks",
    params(
        ("goal_id" = i32, Path, description = "Goal ID"),
    ),
    responses(
        (status = 200, description = "Goal deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Goal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_goal(
    tenant: TenantContext,
    Path(goal_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_goal function for goal_id: {}", goal_id);
    find_goal(&state, &tenant, goal_id).await?;

    goal::Entity::delete_by_id(goal_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Goal with ID {} deleted successfully", goal_id);
    Ok(Json(ApiResponse::ok(format!("Goal {} deleted", goal_id), "Goal deleted successfully")))
}
