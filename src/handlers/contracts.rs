use crate::error::ApiError;
use crate::helpers::money::validate_amount;
use crate::helpers::scope::{find_client, find_owned};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use model::entities::contract::{self, ContractStatus};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatusDto {
    Active,
    Ended,
}

impl From<ContractStatus> for ContractStatusDto {
    fn from(status: ContractStatus) -> Self {
        match status {
            ContractStatus::Active => ContractStatusDto::Active,
            ContractStatus::Ended => ContractStatusDto::Ended,
        }
    }
}

impl From<ContractStatusDto> for ContractStatus {
    fn from(status: ContractStatusDto) -> Self {
        match status {
            ContractStatusDto::Active => ContractStatus::Active,
            ContractStatusDto::Ended => ContractStatus::Ended,
        }
    }
}

/// Request body for a new service contract
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateContractRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(custom(function = "validate_amount"))]
    pub monthly_fee: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Request body for updating a contract
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateContractRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_amount"))]
    pub monthly_fee: Option<Decimal>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<ContractStatusDto>,
}

/// Contract response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContractResponse {
    pub id: i32,
    pub client_id: i32,
    pub title: String,
    pub monthly_fee: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ContractStatusDto,
}

impl From<contract::Model> for ContractResponse {
    fn from(model: contract::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            title: model.title,
            monthly_fee: model.monthly_fee,
            start_date: model.start_date,
            end_date: model.end_date,
            status: model.status.into(),
        }
    }
}

fn check_dates(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), ApiError> {
    match end {
        Some(end) if end < start => Err(ApiError::Validation(format!(
            "Contract ends ({}) before it starts ({})",
            end, start
        ))),
        _ => Ok(()),
    }
}

async fn find_contract(
    state: &AppState,
    tenant: &TenantContext,
    contract_id: i32,
) -> Result<contract::Model, ApiError> {
    find_owned::<contract::Entity, _>(&state.db, tenant, contract::Column::OrganizationId, contract_id, "Contract")
        .await
}

/// Contracts of a client
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/contracts",
    tag = "notes",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Contracts retrieved successfully", body = ApiResponse<Vec<ContractResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_contracts(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ContractResponse>>>, ApiError> {
    trace!("Entering get_client_contracts function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let contracts = contract::Entity::find()
        .filter(contract::Column::ClientId.eq(client_id))
        .order_by_desc(contract::Column::StartDate)
        .all(&state.db)
        .await?;

    let data: Vec<ContractResponse> = contracts.into_iter().map(ContractResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Contracts retrieved successfully")))
}

/// Create a contract for a client
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/contracts",
    tag = "notes",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = CreateContractRequest,
    responses(
        (status = 201, description = "Contract created successfully", body = ApiResponse<ContractResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_contract(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateContractRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ContractResponse>>), ApiError> {
    trace!("Entering create_contract function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;
    check_dates(request.start_date, request.end_date)?;

    let model = contract::ActiveModel {
        organization_id: Set(tenant.organization_id),
        client_id: Set(client_id),
        title: Set(request.title),
        monthly_fee: Set(request.monthly_fee),
        start_date: Set(request.start_date),
        end_date: Set(request.end_date),
        status: Set(ContractStatus::Active),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.invalidate_cache();
    info!("Contract created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ContractResponse::from(model), "Contract created successfully")),
    ))
}

/// Update a contract
#[utoipa::path(
    put,
    path = "/api/v1/contracts/{contract_id}",
    tag = "notes",
    params(
        ("contract_id" = i32, Path, description = "Contract ID"),
    ),
    request_body = UpdateContractRequest,
    responses(
        (status = 200, description = "Contract updated successfully", body = ApiResponse<ContractResponse>),
        (status = 404, description = "Contract not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_contract(
    tenant: TenantContext,
    Path(contract_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateContractRequest>>,
) -> Result<Json<ApiResponse<ContractResponse>>, ApiError> {
    trace!("Entering update_contract function for contract_id: {}", contract_id);
    let existing = find_contract(&state, &tenant, contract_id).await?;
    check_dates(existing.start_date, request.end_date.or(existing.end_date))?;

    let mut active: contract::ActiveModel = existing.into();
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(monthly_fee) = request.monthly_fee {
        debug!("Updating monthly fee to {}", monthly_fee);
        active.monthly_fee = Set(monthly_fee);
    }
    if let Some(end_date) = request.end_date {
        active.end_date = Set(Some(end_date));
    }
    if let Some(status) = request.status {
        active.status = Set(status.into());
    }

    let updated = active.update(&state.db).await?;
    state.invalidate_cache();
    info!("Contract with ID {} updated successfully", contract_id);
    Ok(Json(ApiResponse::ok(ContractResponse::from(updated), "Contract updated successfully")))
}

/// Delete a contract
#[utoipa::path(
    delete,
    path = "/api/v1/contracts/{contract_id}",
    tag = "notes",
    params(
        ("contract_id" = i32, Path, description = "Contract ID"),
    ),
    responses(
        (status = 200, description = "Contract deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Contract not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_contract(
    tenant: TenantContext,
    Path(contract_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_contract function for contract_id: {}", contract_id);
    find_contract(&state, &tenant, contract_id).await?;

    contract::Entity::delete_by_id(contract_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Contract with ID {} deleted successfully", contract_id);
    Ok(Json(ApiResponse::ok(
        format!("Contract {} deleted", contract_id),
        "Contract deleted successfully",
    )))
}
