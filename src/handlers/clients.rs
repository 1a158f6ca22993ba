use crate::error::ApiError;
use crate::helpers::converters::client_to_dto;
use crate::helpers::money::validate_amount;
use crate::helpers::scope::find_client;
use crate::helpers::window::resolve_window;
use crate::schemas::{ApiResponse, AppState, ConfirmQuery, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::Utc;
use common::{ClientDto, ClientStatus};
use compute::analytics::totals_by_client;
use model::entities::client;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a new client
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateClientRequest {
    /// Client name
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Industry or segment
    pub industry: Option<String>,
    /// Target return on ad spend
    #[validate(custom(function = "validate_amount"))]
    pub target_roas: Option<Decimal>,
    /// Whether CRM-lite tracking is enabled (default: false)
    pub crm_enabled: Option<bool>,
}

/// Request body for updating a client
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub industry: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    pub target_roas: Option<Decimal>,
    pub crm_enabled: Option<bool>,
}

/// List the clients of the organization with their totals for the window
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    tag = "clients",
    params(WindowQuery),
    responses(
        (status = 200, description = "Clients retrieved successfully", body = ApiResponse<Vec<ClientDto>>),
        (status = 401, description = "Unknown organization", body = ErrorResponse),
        (status = 422, description = "Invalid window", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_clients(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<ClientDto>>>, ApiError> {
    trace!("Entering get_clients function");
    let window = resolve_window(&query)?;
    debug!("Listing clients for window {} to {}", window.start, window.end);

    let clients = client::Entity::find()
        .filter(client::Column::OrganizationId.eq(tenant.organization_id))
        .order_by_asc(client::Column::Name)
        .all(&state.db)
        .await?;

    let mut totals = totals_by_client(&state.db, &clients, window).await?;
    let data: Vec<ClientDto> = clients
        .into_iter()
        .map(|c| {
            let client_totals = totals.remove(&c.id);
            client_to_dto(c, client_totals)
        })
        .collect();

    info!("Successfully retrieved {} clients", data.len());
    Ok(Json(ApiResponse::ok(data, "Clients retrieved successfully")))
}

/// Create a new client
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    tag = "clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created successfully", body = ApiResponse<ClientDto>),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_client(
    tenant: TenantContext,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateClientRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ClientDto>>), ApiError> {
    trace!("Entering create_client function");
    debug!("Creating client with name: {}", request.name);

    let model = client::ActiveModel {
        organization_id: Set(tenant.organization_id),
        name: Set(request.name),
        industry: Set(request.industry),
        status: Set(client::ClientStatus::Active),
        target_roas: Set(request.target_roas),
        crm_enabled: Set(request.crm_enabled.unwrap_or(false)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Client created successfully with ID: {}, name: {}", model.id, model.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(client_to_dto(model, None), "Client created successfully")),
    ))
}

/// Get a specific client by ID
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Client retrieved successfully", body = ApiResponse<ClientDto>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClientDto>>, ApiError> {
    trace!("Entering get_client function for client_id: {}", client_id);
    let model = find_client(&state.db, &tenant, client_id).await?;
    Ok(Json(ApiResponse::ok(client_to_dto(model, None), "Client retrieved successfully")))
}

/// Update a client
#[utoipa::path(
    put,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated successfully", body = ApiResponse<ClientDto>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_client(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateClientRequest>>,
) -> Result<Json<ApiResponse<ClientDto>>, ApiError> {
    trace!("Entering update_client function for client_id: {}", client_id);
    let existing = find_client(&state.db, &tenant, client_id).await?;

    let mut active: client::ActiveModel = existing.into();
    let mut updated_fields = Vec::new();

    if let Some(name) = request.name {
        debug!("Updating client name to: {}", name);
        active.name = Set(name);
        updated_fields.push("name");
    }
    if let Some(industry) = request.industry {
        active.industry = Set(Some(industry));
        updated_fields.push("industry");
    }
    if let Some(target_roas) = request.target_roas {
        debug!("Updating client target_roas to: {}", target_roas);
        active.target_roas = Set(Some(target_roas));
        updated_fields.push("target_roas");
    }
    if let Some(crm_enabled) = request.crm_enabled {
        active.crm_enabled = Set(crm_enabled);
        updated_fields.push("crm_enabled");
    }

    let updated = active.update(&state.db).await?;
    state.invalidate_cache();
    info!(
        "Client with ID {} updated successfully. Updated fields: {}",
        client_id,
        if updated_fields.is_empty() { "none".to_string() } else { updated_fields.join(", ") }
    );
    Ok(Json(ApiResponse::ok(client_to_dto(updated, None), "Client updated successfully")))
}

/// Delete a client with all of its campaigns, metrics, deals, activities,
/// notes, contracts and insights. Requires `confirm=true`.
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{client_id}",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        ConfirmQuery,
    ),
    responses(
        (status = 200, description = "Client deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 428, description = "Deletion was not confirmed", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_client(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    Query(confirm): Query<ConfirmQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_client function for client_id: {}", client_id);
    let existing = find_client(&state.db, &tenant, client_id).await?;

    if !confirm.confirm {
        warn!("Deletion of client {} requested without confirmation", client_id);
        return Err(ApiError::ConfirmationRequired(format!(
            "Deleting client {} requires confirm=true",
            existing.name
        )));
    }

    client::Entity::delete_by_id(client_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Client with ID {} deleted successfully", client_id);
    Ok(Json(ApiResponse::ok(
        format!("Client {} deleted", client_id),
        "Client deleted successfully",
    )))
}

async fn set_status(
    state: &AppState,
    tenant: &TenantContext,
    client_id: i32,
    confirm: bool,
    status: ClientStatus,
) -> Result<ClientDto, ApiError> {
    let existing = find_client(&state.db, tenant, client_id).await?;
    if !confirm {
        return Err(ApiError::ConfirmationRequired(format!(
            "Changing the status of client {} requires confirm=true",
            existing.name
        )));
    }

    let mut active: client::ActiveModel = existing.into();
    active.status = Set(status.into());
    let updated = active.update(&state.db).await?;
    state.invalidate_cache();
    info!("Client {} is now {:?}", client_id, status);
    Ok(client_to_dto(updated, None))
}

/// Pause a client. Requires `confirm=true`.
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/pause",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        ConfirmQuery,
    ),
    responses(
        (status = 200, description = "Client paused", body = ApiResponse<ClientDto>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 428, description = "Action was not confirmed", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn pause_client(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    Query(confirm): Query<ConfirmQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClientDto>>, ApiError> {
    let dto = set_status(&state, &tenant, client_id, confirm.confirm, ClientStatus::Paused).await?;
    Ok(Json(ApiResponse::ok(dto, "Client paused")))
}

/// Reactivate a paused client. Requires `confirm=true`.
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/reactivate",
    tag = "clients",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        ConfirmQuery,
    ),
    responses(
        (status = 200, description = "Client reactivated", body = ApiResponse<ClientDto>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 428, description = "Action was not confirmed", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn reactivate_client(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    Query(confirm): Query<ConfirmQuery>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ClientDto>>, ApiError> {
    let dto = set_status(&state, &tenant, client_id, confirm.confirm, ClientStatus::Active).await?;
    Ok(Json(ApiResponse::ok(dto, "Client reactivated")))
}
