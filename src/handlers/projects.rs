use crate::error::ApiError;
use crate::helpers::converters::project_to_dto;
use crate::helpers::scope::{check_client_ref, find_project};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use common::ProjectDto;
use model::entities::{project, task};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new project
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub client_id: Option<i32>,
    /// Manual progress percentage, used until the project owns tasks
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    pub deadline: Option<NaiveDate>,
}

/// Request body for updating a project
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub client_id: Option<i32>,
    #[validate(range(min = 0, max = 100))]
    pub progress: Option<i32>,
    pub deadline: Option<NaiveDate>,
}

async fn project_tasks(db: &DatabaseConnection, project_id: i32) -> Result<Vec<task::Model>, ApiError> {
    Ok(task::Entity::find()
        .filter(task::Column::ProjectId.eq(project_id))
        .all(db)
        .await?)
}

/// List the projects of the organization with resolved progress
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "tasks",
    responses(
        (status = 200, description = "Projects retrieved successfully", body = ApiResponse<Vec<ProjectDto>>),
        (status = 401, description = "Unknown organization", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_projects(
    tenant: TenantContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProjectDto>>>, ApiError> {
    trace!("Entering get_projects function");
    let projects = project::Entity::find()
        .filter(project::Column::OrganizationId.eq(tenant.organization_id))
        .order_by_asc(project::Column::Id)
        .all(&state.db)
        .await?;
    let tasks = task::Entity::find()
        .filter(task::Column::OrganizationId.eq(tenant.organization_id))
        .filter(task::Column::ProjectId.is_not_null())
        .all(&state.db)
        .await?;

    debug!("Resolving progress of {} projects over {} tasks", projects.len(), tasks.len());
    let data: Vec<ProjectDto> = projects.into_iter().map(|p| project_to_dto(p, &tasks)).collect();
    Ok(Json(ApiResponse::ok(data, "Projects retrieved successfully")))
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "tasks",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created successfully", body = ApiResponse<ProjectDto>),
        (status = 404, description = "Referenced client not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_project(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateProjectRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectDto>>), ApiError> {
    trace!("Entering create_project function");
    check_client_ref(&state.db, &tenant, request.client_id).await?;

    let model = project::ActiveModel {
        organization_id: Set(tenant.organization_id),
        client_id: Set(request.client_id),
        name: Set(request.name),
        description: Set(request.description),
        progress: Set(request.progress.unwrap_or(0)),
        deadline: Set(request.deadline),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Project created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(project_to_dto(model, &[]), "Project created successfully")),
    ))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/api/v1/projects/{project_id}",
    tag = "tasks",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ApiResponse<ProjectDto>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_project(
    tenant: TenantContext,
    Path(project_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateProjectRequest>>,
) -> Result<Json<ApiResponse<ProjectDto>>, ApiError> {
    trace!("Entering update_project function for project_id: {}", project_id);
    let existing = find_project(&state.db, &tenant, project_id).await?;
    check_client_ref(&state.db, &tenant, request.client_id).await?;

    let mut active: project::ActiveModel = existing.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(client_id) = request.client_id {
        active.client_id = Set(Some(client_id));
    }
    if let Some(progress) = request.progress {
        debug!("Updating manual progress to {}", progress);
        active.progress = Set(progress);
    }
    if let Some(deadline) = request.deadline {
        active.deadline = Set(Some(deadline));
    }

    let updated = active.update(&state.db).await?;
    let tasks = project_tasks(&state.db, project_id).await?;
    state.invalidate_cache();
    info!("Project with ID {} updated successfully", project_id);
    Ok(Json(ApiResponse::ok(project_to_dto(updated, &tasks), "Project updated successfully")))
}

/// Delete a project. Its tasks stay on the board without a project.
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "tasks",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
    ),
    responses(
        (status = 200, description = "Project deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Project not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_project(
    tenant: TenantContext,
    Path(project_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_project function for project_id: {}", project_id);
    find_project(&state.db, &tenant, project_id).await?;

    project::Entity::delete_by_id(project_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Project with ID {} deleted successfully", project_id);
    Ok(Json(ApiResponse::ok(
        format!("Project {} deleted", project_id),
        "Project deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_organization, org_header, org_value, setup_test_server,
    };
    use axum::http::StatusCode;
    use common::{ProjectDto, TaskDto};
    use serde_json::json;

    #[tokio::test]
    async fn test_manual_progress_until_tasks_exist() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "projects").await;

        let response = server
            .post("/api/v1/projects")
            .add_header(org_header(), org_value(org))
            .json(&json!({ "name": "Rebrand", "progress": 40 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<ProjectDto> = response.json();
        assert_eq!(created.data.progress, 40);
        assert_eq!(created.data.task_count, 0);

        let response = server
            .post("/api/v1/tasks")
            .add_header(org_header(), org_value(org))
            .json(&json!({ "title": "Logo", "project_id": created.data.id }))
            .await;
        let task: ApiResponse<TaskDto> = response.json();

        let response = server
            .get("/api/v1/projects")
            .add_header(org_header(), org_value(org))
            .await;
        let listed: ApiResponse<Vec<ProjectDto>> = response.json();
        assert_eq!(listed.data[0].progress, 0);
        assert_eq!(listed.data[0].manual_progress, 40);

        server
            .patch(&format!("/api/v1/tasks/{}/completion", task.data.id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "completed": true }))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/projects")
            .add_header(org_header(), org_value(org))
            .await;
        let listed: ApiResponse<Vec<ProjectDto>> = response.json();
        assert_eq!(listed.data[0].progress, 100);
    }

    #[tokio::test]
    async fn test_progress_out_of_range_is_rejected() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "range").await;

        server
            .post("/api/v1/projects")
            .add_header(org_header(), org_value(org))
            .json(&json!({ "name": "Overdone", "progress": 120 }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_deleting_project_keeps_tasks() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "detach").await;

        let response = server
            .post("/api/v1/projects")
            .add_header(org_header(), org_value(org))
            .json(&json!({ "name": "Temp" }))
            .await;
        let project: ApiResponse<ProjectDto> = response.json();
        server
            .post("/api/v1/tasks")
            .add_header(org_header(), org_value(org))
            .json(&json!({ "title": "Orphan", "project_id": project.data.id }))
            .await
            .assert_status(StatusCode::CREATED);

        server
            .delete(&format!("/api/v1/projects/{}", project.data.id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .get("/api/v1/tasks")
            .add_header(org_header(), org_value(org))
            .await;
        let tasks: ApiResponse<Vec<TaskDto>> = response.json();
        assert_eq!(tasks.data.len(), 1);
        assert_eq!(tasks.data[0].project_id, None);
    }
}
