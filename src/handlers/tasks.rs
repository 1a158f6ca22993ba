use crate::error::ApiError;
use crate::helpers::converters::{client_to_dto, goal_to_dto, project_to_dto, task_to_dto};
use crate::helpers::scope::{check_client_ref, check_project_ref, find_owned};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use common::{BoardSnapshot, MoveTaskRequest, TaskCategory, TaskDto, ToggleTaskRequest};
use model::entities::{client, goal, project, task};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new task
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub description: Option<String>,
    /// Kanban column (default: do_now)
    pub category: Option<TaskCategory>,
    pub client_id: Option<i32>,
    pub project_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Request body for editing the details of a task
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub description: Option<String>,
    /// Omit to keep, `null` to detach the task from its client
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>, nullable)]
    pub client_id: Option<Option<i32>>,
    /// Omit to keep, `null` to detach the task from its project
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>, nullable)]
    pub project_id: Option<Option<i32>>,
    /// Omit to keep, `null` to clear
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = Date, nullable)]
    pub due_date: Option<Option<NaiveDate>>,
    /// When present, the update is rejected if the stored version differs
    pub expected_version: Option<i32>,
}

/// Tells a missing field (`None`) apart from an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

async fn find_task(state: &AppState, tenant: &TenantContext, task_id: i32) -> Result<task::Model, ApiError> {
    find_owned::<task::Entity, _>(&state.db, tenant, task::Column::OrganizationId, task_id, "Task").await
}

/// Write `changes` to the task and bump its version.
///
/// The row is only written while its version still equals the one read here,
/// so two concurrent writers cannot both succeed against the same version.
async fn apply_versioned(
    state: &AppState,
    tenant: &TenantContext,
    task_id: i32,
    expected_version: Option<i32>,
    mut changes: task::ActiveModel,
) -> Result<task::Model, ApiError> {
    let current = find_task(state, tenant, task_id).await?;

    if let Some(expected) = expected_version {
        if expected != current.version {
            warn!(
                task_id,
                expected,
                actual = current.version,
                "Rejecting task update with stale version"
            );
            return Err(ApiError::Conflict(format!(
                "Task {} is at version {}, not {}",
                task_id, current.version, expected
            )));
        }
    }

    changes.version = Set(current.version + 1);
    let result = task::Entity::update_many()
        .set(changes)
        .filter(task::Column::Id.eq(task_id))
        .filter(task::Column::Version.eq(current.version))
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        warn!(task_id, "Task changed while it was being updated");
        return Err(ApiError::Conflict(format!("Task {} was modified concurrently", task_id)));
    }

    let updated = find_task(state, tenant, task_id).await?;
    state.invalidate_cache();
    Ok(updated)
}

/// List all tasks of the organization
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = ApiResponse<Vec<TaskDto>>),
        (status = 401, description = "Unknown organization", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_tasks(
    tenant: TenantContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TaskDto>>>, ApiError> {
    trace!("Entering get_tasks function");
    let tasks = task::Entity::find()
        .filter(task::Column::OrganizationId.eq(tenant.organization_id))
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await?;

    info!("Successfully retrieved {} tasks", tasks.len());
    let data: Vec<TaskDto> = tasks.into_iter().map(task_to_dto).collect();
    Ok(Json(ApiResponse::ok(data, "Tasks retrieved successfully")))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = ApiResponse<TaskDto>),
        (status = 404, description = "Referenced client or project not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_task(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateTaskRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<TaskDto>>), ApiError> {
    trace!("Entering create_task function");
    check_client_ref(&state.db, &tenant, request.client_id).await?;
    check_project_ref(&state.db, &tenant, request.project_id).await?;

    let category = request.category.unwrap_or(TaskCategory::DoNow);
    debug!("Creating task {:?} in column {}", request.title, category.as_str());

    let model = task::ActiveModel {
        organization_id: Set(tenant.organization_id),
        title: Set(request.title),
        description: Set(request.description),
        category: Set(category.into()),
        completed: Set(false),
        client_id: Set(request.client_id),
        project_id: Set(request.project_id),
        due_date: Set(request.due_date),
        version: Set(1),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Task created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(task_to_dto(model), "Task created successfully")),
    ))
}

/// Edit the details of a task
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = i32, Path, description = "Task ID"),
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = ApiResponse<TaskDto>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task was modified since it was read", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_task(
    tenant: TenantContext,
    Path(task_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateTaskRequest>>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    trace!("Entering update_task function for task_id: {}", task_id);
    check_client_ref(&state.db, &tenant, request.client_id.flatten()).await?;
    check_project_ref(&state.db, &tenant, request.project_id.flatten()).await?;

    let mut changes = <task::ActiveModel as Default>::default();
    if let Some(title) = request.title {
        changes.title = Set(title);
    }
    if let Some(description) = request.description {
        changes.description = Set(Some(description));
    }
    if let Some(client_id) = request.client_id {
        changes.client_id = Set(client_id);
    }
    if let Some(project_id) = request.project_id {
        changes.project_id = Set(project_id);
    }
    if let Some(due_date) = request.due_date {
        changes.due_date = Set(due_date);
    }

    let updated = apply_versioned(&state, &tenant, task_id, request.expected_version, changes).await?;
    info!("Task with ID {} updated to version {}", task_id, updated.version);
    Ok(Json(ApiResponse::ok(task_to_dto(updated), "Task updated successfully")))
}

/// Move a task to another kanban column
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{task_id}/category",
    tag = "tasks",
    params(
        ("task_id" = i32, Path, description = "Task ID"),
    ),
    request_body = MoveTaskRequest,
    responses(
        (status = 200, description = "Task moved", body = ApiResponse<TaskDto>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task was modified since it was read", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn move_task(
    tenant: TenantContext,
    Path(task_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<MoveTaskRequest>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    trace!("Entering move_task function for task_id: {}", task_id);
    let changes = task::ActiveModel {
        category: Set(request.category.into()),
        ..Default::default()
    };

    let updated = apply_versioned(&state, &tenant, task_id, request.expected_version, changes).await?;
    info!("Task {} moved to {}", task_id, request.category.as_str());
    Ok(Json(ApiResponse::ok(task_to_dto(updated), "Task moved")))
}

/// Mark a task as completed or open
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{task_id}/completion",
    tag = "tasks",
    params(
        ("task_id" = i32, Path, description = "Task ID"),
    ),
    request_body = ToggleTaskRequest,
    responses(
        (status = 200, description = "Task completion updated", body = ApiResponse<TaskDto>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task was modified since it was read", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_task_completion(
    tenant: TenantContext,
    Path(task_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<ToggleTaskRequest>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    trace!("Entering set_task_completion function for task_id: {}", task_id);
    let changes = task::ActiveModel {
        completed: Set(request.completed),
        ..Default::default()
    };

    let updated = apply_versioned(&state, &tenant, task_id, request.expected_version, changes).await?;
    info!("Task {} completed = {}", task_id, updated.completed);
    Ok(Json(ApiResponse::ok(task_to_dto(updated), "Task completion updated")))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{task_id}",
    tag = "tasks",
    params(
        ("task_id" = i32, Path, description = "Task ID"),
    ),
    responses(
        (status = 200, description = "Task deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_task(
    tenant: TenantContext,
    Path(task_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_task function for task_id: {}", task_id);
    find_task(&state, &tenant, task_id).await?;

    task::Entity::delete_by_id(task_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Task with ID {} deleted successfully", task_id);
    Ok(Json(ApiResponse::ok(format!("Task {} deleted", task_id), "Task deleted successfully")))
}

/// Everything the kanban view shows: tasks, projects with resolved progress,
/// goals and clients
#[utoipa::path(
    get,
    path = "/api/v1/board",
    tag = "tasks",
    responses(
        (status = 200, description = "Board retrieved successfully", body = ApiResponse<BoardSnapshot>),
        (status = 401, description = "Unknown organization", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_board(
    tenant: TenantContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BoardSnapshot>>, ApiError> {
    trace!("Entering get_board function");
    let org = tenant.organization_id;

    let tasks = task::Entity::find()
        .filter(task::Column::OrganizationId.eq(org))
        .order_by_asc(task::Column::Id)
        .all(&state.db)
        .await?;
    let projects = project::Entity::find()
        .filter(project::Column::OrganizationId.eq(org))
        .order_by_asc(project::Column::Id)
        .all(&state.db)
        .await?;
    let goals = goal::Entity::find()
        .filter(goal::Column::OrganizationId.eq(org))
        .order_by_asc(goal::Column::Id)
        .all(&state.db)
        .await?;
    let clients = client::Entity::find()
        .filter(client::Column::OrganizationId.eq(org))
        .order_by_asc(client::Column::Name)
        .all(&state.db)
        .await?;

    debug!(
        tasks = tasks.len(),
        projects = projects.len(),
        goals = goals.len(),
        clients = clients.len(),
        "Loaded board"
    );

    let snapshot = BoardSnapshot {
        projects: projects.into_iter().map(|p| project_to_dto(p, &tasks)).collect(),
        tasks: tasks.into_iter().map(task_to_dto).collect(),
        goals: goals.into_iter().map(goal_to_dto).collect(),
        clients: clients.into_iter().map(|c| client_to_dto(c, None)).collect(),
    };
    Ok(Json(ApiResponse::ok(snapshot, "Board retrieved successfully")))
}
