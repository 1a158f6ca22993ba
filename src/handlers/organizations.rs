use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::Utc;
use model::entities::organization;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("slug"))
    }
}

/// Request body for creating a new organization
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateOrganizationRequest {
    /// Display name of the agency
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// URL-safe unique identifier (lowercase letters, digits and dashes)
    #[validate(length(min = 1, max = 64), custom(function = "validate_slug"))]
    pub slug: String,
}

/// Organization response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<organization::Model> for OrganizationResponse {
    fn from(model: organization::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Create a new organization (tenant)
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    tag = "organizations",
    request_body = CreateOrganizationRequest,
    responses(
        (status = 201, description = "Organization created successfully", body = ApiResponse<OrganizationResponse>),
        (status = 409, description = "Slug already taken", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_organization(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateOrganizationRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<OrganizationResponse>>), ApiError> {
    trace!("Entering create_organization function");
    debug!("Creating organization with slug: {}", request.slug);

    let taken = organization::Entity::find()
        .filter(organization::Column::Slug.eq(request.slug.clone()))
        .one(&state.db)
        .await?;
    if taken.is_some() {
        warn!("Organization slug {} already taken", request.slug);
        return Err(ApiError::Conflict(format!("Slug {} is already taken", request.slug)));
    }

    let model = organization::ActiveModel {
        name: Set(request.name),
        slug: Set(request.slug),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Organization created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            OrganizationResponse::from(model),
            "Organization created successfully",
        )),
    ))
}

/// Get a specific organization by ID
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{organization_id}",
    tag = "organizations",
    params(
        ("organization_id" = i32, Path, description = "Organization ID"),
    ),
    responses(
        (status = 200, description = "Organization retrieved successfully", body = ApiResponse<OrganizationResponse>),
        (status = 404, description = "Organization not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_organization(
    Path(organization_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrganizationResponse>>, ApiError> {
    trace!("Entering get_organization function for organization_id: {}", organization_id);

    match organization::Entity::find_by_id(organization_id).one(&state.db).await? {
        Some(model) => {
            debug!("Found organization: {}", model.name);
            Ok(Json(ApiResponse::ok(
                OrganizationResponse::from(model),
                "Organization retrieved successfully",
            )))
        }
        None => {
            warn!("Organization with ID {} not found", organization_id);
            Err(ApiError::NotFound(format!("Organization {}", organization_id)))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{create_test_organization, setup_test_server};
    use axum::http::StatusCode;
    use serde_json::json;

    use super::OrganizationResponse;

    #[tokio::test]
    async fn test_create_and_get_organization() {
        let server = setup_test_server().await;

        let org_id = create_test_organization(&server, "north-star").await;

        let response = server.get(&format!("/api/v1/organizations/{}", org_id)).await;
        response.assert_status(StatusCode::OK);
        let body: ApiResponse<OrganizationResponse> = response.json();
        assert_eq!(body.data.slug, "north-star");
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let server = setup_test_server().await;
        create_test_organization(&server, "dup").await;

        let response = server
            .post("/api/v1/organizations")
            .json(&json!({ "name": "Other", "slug": "dup" }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_invalid_slug_is_rejected() {
        let server = setup_test_server().await;

        let response = server
            .post("/api/v1/organizations")
            .json(&json!({ "name": "Bad", "slug": "Not A Slug" }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
