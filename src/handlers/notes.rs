use crate::error::ApiError;
use crate::helpers::scope::{find_client, find_owned};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::entities::note;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for pinning a note to a client
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateNoteRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
}

/// Note response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: i32,
    pub client_id: i32,
    pub content: String,
    pub created_at: NaiveDateTime,
}

impl From<note::Model> for NoteResponse {
    fn from(model: note::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            content: model.content,
            created_at: model.created_at,
        }
    }
}

/// Notes of a client, newest first
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/notes",
    tag = "notes",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Notes retrieved successfully", body = ApiResponse<Vec<NoteResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_notes(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<NoteResponse>>>, ApiError> {
    trace!("Entering get_client_notes function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let notes = note::Entity::find()
        .filter(note::Column::ClientId.eq(client_id))
        .order_by_desc(note::Column::CreatedAt)
        .order_by_desc(note::Column::Id)
        .all(&state.db)
        .await?;

    let data: Vec<NoteResponse> = notes.into_iter().map(NoteResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Notes retrieved successfully")))
}

/// Pin a note to a client
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/notes",
    tag = "notes",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = ApiResponse<NoteResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Empty note", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_note(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateNoteRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<NoteResponse>>), ApiError> {
    trace!("Entering create_note function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let model = note::ActiveModel {
        organization_id: Set(tenant.organization_id),
        client_id: Set(client_id),
        content: Set(request.content),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Note created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(NoteResponse::from(model), "Note created successfully")),
    ))
}

/// Delete a note
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}",
    tag = "notes",
    params(
        ("note_id" = i32, Path, description = "Note ID"),
    ),
    responses(
        (status = 200, description = "Note deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_note(
    tenant: TenantContext,
    Path(note_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_note function for note_id: {}", note_id);
    find_owned::<note::Entity, _>(&state.db, &tenant, note::Column::OrganizationId, note_id, "Note").await?;

    note::Entity::delete_by_id(note_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Note with ID {} deleted successfully", note_id);
    Ok(Json(ApiResponse::ok(format!("Note {} deleted", note_id), "Note deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::NoteResponse;
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_client, create_test_organization, org_header, org_value, setup_test_server,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_notes_are_pinned_to_client() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "notes").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let url = format!("/api/v1/clients/{}/notes", client_id);

        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "content": "Prefers calls on Fridays" }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "content": "" }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = server.get(&url).add_header(org_header(), org_value(org)).await;
        let notes: ApiResponse<Vec<NoteResponse>> = response.json();
        assert_eq!(notes.data.len(), 1);

        server
            .delete(&format!("/api/v1/notes/{}", notes.data[0].id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::OK);
    }
}
