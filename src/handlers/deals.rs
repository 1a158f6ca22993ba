use crate::error::ApiError;
use crate::helpers::money::{checked_total, validate_amount};
use crate::helpers::scope::{find_client, find_owned};
use crate::helpers::window::resolve_window;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, WindowQuery};
use crate::tenant::TenantContext;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use model::entities::deal;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Value of a deal: the supplied total, or `quantity * unit_value`.
pub fn deal_total(
    quantity: i32,
    unit_value: Option<Decimal>,
    total_value: Option<Decimal>,
) -> Result<Decimal, ApiError> {
    match (total_value, unit_value) {
        (Some(total), _) => Ok(total),
        (None, Some(unit)) => checked_total(unit, quantity),
        (None, None) => Err(ApiError::Validation(
            "Either total_value or unit_value is required".to_string(),
        )),
    }
}

/// Fields of a new deal, shared by the dashboard and the public report form.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub client_id: i32,
    pub date: NaiveDate,
    pub product: Option<String>,
    pub quantity: i32,
    pub unit_value: Option<Decimal>,
    pub total_value: Decimal,
    pub notes: Option<String>,
}

/// Insert a deal for a client of the organization.
pub async fn insert_deal<C: ConnectionTrait>(
    db: &C,
    organization_id: i32,
    deal: NewDeal,
) -> Result<deal::Model, ApiError> {
    let model = deal::ActiveModel {
        organization_id: Set(organization_id),
        client_id: Set(deal.client_id),
        date: Set(deal.date),
        product: Set(deal.product),
        quantity: Set(deal.quantity),
        unit_value: Set(deal.unit_value),
        total_value: Set(deal.total_value),
        notes: Set(deal.notes),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

/// Request body for logging a closed deal
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateDealRequest {
    pub date: NaiveDate,
    #[validate(length(max = 200))]
    pub product: Option<String>,
    /// Number of units sold (default: 1)
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    #[validate(custom(function = "validate_amount"))]
    pub unit_value: Option<Decimal>,
    /// Defaults to `quantity * unit_value` when omitted
    #[validate(custom(function = "validate_amount"))]
    pub total_value: Option<Decimal>,
    pub notes: Option<String>,
}

/// Deal response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DealResponse {
    pub id: i32,
    pub client_id: i32,
    pub date: NaiveDate,
    pub product: Option<String>,
    pub quantity: i32,
    pub unit_value: Option<Decimal>,
    pub total_value: Decimal,
    pub notes: Option<String>,
}

impl From<deal::Model> for DealResponse {
    fn from(model: deal::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            date: model.date,
            product: model.product,
            quantity: model.quantity,
            unit_value: model.unit_value,
            total_value: model.total_value,
            notes: model.notes,
        }
    }
}

/// Deals of a client inside the window
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/deals",
    tag = "crm",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Deals retrieved successfully", body = ApiResponse<Vec<DealResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_deals(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<DealResponse>>>, ApiError> {
    trace!("Entering get_client_deals function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;
    let window = resolve_window(&query)?;

    let deals = deal::Entity::find()
        .filter(deal::Column::ClientId.eq(client_id))
        .filter(deal::Column::Date.between(window.start, window.end))
        .order_by_desc(deal::Column::Date)
        .all(&state.db)
        .await?;

    debug!("Found {} deals", deals.len());
    let data: Vec<DealResponse> = deals.into_iter().map(DealResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Deals retrieved successfully")))
}

/// Log a closed deal for a client
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/deals",
    tag = "crm",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = CreateDealRequest,
    responses(
        (status = 201, description = "Deal created successfully", body = ApiResponse<DealResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Neither total_value nor unit_value given", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_deal(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateDealRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<DealResponse>>), ApiError> {
    trace!("Entering create_deal function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let quantity = request.quantity.unwrap_or(1);
    let total_value = deal_total(quantity, request.unit_value, request.total_value)?;

    let model = insert_deal(
        &state.db,
        tenant.organization_id,
        NewDeal {
            client_id,
            date: request.date,
            product: request.product,
            quantity,
            unit_value: request.unit_value,
            total_value,
            notes: request.notes,
        },
    )
    .await?;

    state.invalidate_cache();
    info!("Deal created successfully with ID: {}, total: {}", model.id, model.total_value);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(DealResponse::from(model), "Deal created successfully")),
    ))
}

/// Delete a deal
#[utoipa::path(
    delete,
    path = "/api/v1/deals/{deal_id}",
    tag = "crm",
    params(
        ("deal_id" = i32, Path, description = "Deal ID"),
    ),
    responses(
        (status = 200, description = "Deal deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Deal not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_deal(
    tenant: TenantContext,
    Path(deal_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_deal function for deal_id: {}", deal_id);
    find_owned::<deal::Entity, _>(&state.db, &tenant, deal::Column::OrganizationId, deal_id, "Deal").await?;

    deal::Entity::delete_by_id(deal_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Deal with ID {} deleted successfully", deal_id);
    Ok(Json(ApiResponse::ok(format!("Deal {} deleted", deal_id), "Deal deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::{deal_total, DealResponse};
    use crate::error::ApiError;
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_client, create_test_organization, org_header, org_value, setup_test_server,
    };
    use axum::http::StatusCode;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[test]
    fn test_deal_total_prefers_supplied_value() {
        let total = deal_total(3, Some(Decimal::new(10, 0)), Some(Decimal::new(25, 0))).unwrap();
        assert_eq!(total, Decimal::new(25, 0));

        let derived = deal_total(3, Some(Decimal::new(10, 0)), None).unwrap();
        assert_eq!(derived, Decimal::new(30, 0));

        assert!(matches!(deal_total(3, None, None), Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_list_and_delete_deal() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "deals").await;
        let client_id = create_test_client(&server, org, "Acme").await;

        let response = server
            .post(&format!("/api/v1/clients/{}/deals", client_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "date": "2024-02-10", "product": "Sofa", "quantity": 2, "unit_value": "750" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: ApiResponse<DealResponse> = response.json();
        assert_eq!(created.data.total_value, Decimal::new(1500, 0));

        let response = server
            .get(&format!(
                "/api/v1/clients/{}/deals?start_date=2024-02-01&end_date=2024-02-29",
                client_id
            ))
            .add_header(org_header(), org_value(org))
            .await;
        let listed: ApiResponse<Vec<DealResponse>> = response.json();
        assert_eq!(listed.data.len(), 1);

        server
            .delete(&format!("/api/v1/deals/{}", created.data.id))
            .add_header(org_header(), org_value(org))
            .await
            .assert_status(StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deal_without_value_is_rejected() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "no-value").await;
        let client_id = create_test_client(&server, org, "Acme").await;

        server
            .post(&format!("/api/v1/clients/{}/deals", client_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "date": "2024-02-10", "quantity": 2 }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
