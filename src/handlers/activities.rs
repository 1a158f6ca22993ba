use crate::error::ApiError;
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
use model::entities::commercial_activity::{self, ActivityType};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Kind of commercial activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Meeting,
    Proposal,
}

impl From<ActivityType> for ActivityKind {
    fn from(kind: ActivityType) -> Self {
        match kind {
            ActivityType::Meeting => ActivityKind::Meeting,
            ActivityType::Proposal => ActivityKind::Proposal,
        }
    }
}

impl From<ActivityKind> for ActivityType {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Meeting => ActivityType::Meeting,
            ActivityKind::Proposal => ActivityType::Proposal,
        }
    }
}

/// Fields of a new activity, shared by the dashboard and the public report form.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub client_id: i32,
    pub kind: ActivityKind,
    pub date: NaiveDate,
    pub prospect_name: String,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    pub lead_quality: Option<i32>,
}

/// Insert a commercial activity for a client of the organization.
pub async fn insert_activity<C: ConnectionTrait>(
    db: &C,
    organization_id: i32,
    activity: NewActivity,
) -> Result<commercial_activity::Model, ApiError> {
    let model = commercial_activity::ActiveModel {
        organization_id: Set(organization_id),
        client_id: Set(activity.client_id),
        activity_type: Set(activity.kind.into()),
        date: Set(activity.date),
        prospect_name: Set(activity.prospect_name),
        quantity: Set(activity.quantity),
        notes: Set(activity.notes),
        lead_quality: Set(activity.lead_quality),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model)
}

/// Request body for logging a meeting or proposal
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateActivityRequest {
    pub activity_type: ActivityKind,
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 200))]
    pub prospect_name: String,
    /// Number of events this row stands for; missing counts as one
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub lead_quality: Option<i32>,
}

/// Commercial activity response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub id: i32,
    pub client_id: i32,
    pub activity_type: ActivityKind,
    pub date: NaiveDate,
    pub prospect_name: String,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    pub lead_quality: Option<i32>,
}

impl From<commercial_activity::Model> for ActivityResponse {
    fn from(model: commercial_activity::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            activity_type: model.activity_type.into(),
            date: model.date,
            prospect_name: model.prospect_name,
            quantity: model.quantity,
            notes: model.notes,
            lead_quality: model.lead_quality,
        }
    }
}

/// Meetings and proposals of a client inside the window
#[utoipa::path(
    get,
    path = "/api/v1/clients/{client_id}/activities",
    tag = "crm",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
        WindowQuery,
    ),
    responses(
        (status = 200, description = "Activities retrieved successfully", body = ApiResponse<Vec<ActivityResponse>>),
        (status = 404, description = "Client not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_client_activities(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Query(query)): Valid<Query<WindowQuery>>,
) -> Result<Json<ApiResponse<Vec<ActivityResponse>>>, ApiError> {
    trace!("Entering get_client_activities function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;
    let window = resolve_window(&query)?;

    let activities = commercial_activity::Entity::find()
        .filter(commercial_activity::Column::ClientId.eq(client_id))
        .filter(commercial_activity::Column::Date.between(window.start, window.end))
        .order_by_desc(commercial_activity::Column::Date)
        .all(&state.db)
        .await?;

    debug!("Found {} activities", activities.len());
    let data: Vec<ActivityResponse> = activities.into_iter().map(ActivityResponse::from).collect();
    Ok(Json(ApiResponse::ok(data, "Activities retrieved successfully")))
}

/// Log a meeting or proposal for a client
#[utoipa::path(
    post,
    path = "/api/v1/clients/{client_id}/activities",
    tag = "crm",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created successfully", body = ApiResponse<ActivityResponse>),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_activity(
    tenant: TenantContext,
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateActivityRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<ActivityResponse>>), ApiError> {
    trace!("Entering create_activity function for client_id: {}", client_id);
    find_client(&state.db, &tenant, client_id).await?;

    let model = insert_activity(
        &state.db,
        tenant.organization_id,
        NewActivity {
            client_id,
            kind: request.activity_type,
            date: request.date,
            prospect_name: request.prospect_name,
            quantity: request.quantity,
            notes: request.notes,
            lead_quality: request.lead_quality,
        },
    )
    .await?;

    state.invalidate_cache();
    info!("Activity created successfully with ID: {}", model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ActivityResponse::from(model), "Activity created successfully")),
    ))
}

/// Delete a commercial activity
#[utoipa::path(
    delete,
    path = "/api/v1/activities/{activity_id}",
    tag = "crm",
    params(
        ("activity_id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 200, description = "Activity deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_activity(
    tenant: TenantContext,
    Path(activity_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_activity function for activity_id: {}", activity_id);
    find_owned::<commercial_activity::Entity, _>(
        &state.db,
        &tenant,
        commercial_activity::Column::OrganizationId,
        activity_id,
        "Activity",
    )
    .await?;

    commercial_activity::Entity::delete_by_id(activity_id).exec(&state.db).await?;
    state.invalidate_cache();
    info!("Activity with ID {} deleted successfully", activity_id);
    Ok(Json(ApiResponse::ok(
        format!("Activity {} deleted", activity_id),
        "Activity deleted successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::{ActivityKind, ActivityResponse};
    use crate::schemas::ApiResponse;
    use crate::test_utils::test_utils::{
        create_test_client, create_test_organization, org_header, org_value, setup_test_server,
    };
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_list_activities() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "activities").await;
        let client_id = create_test_client(&server, org, "Acme").await;
        let url = format!("/api/v1/clients/{}/activities", client_id);

        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "activity_type": "meeting", "date": "2024-08-05", "prospect_name": "Globex", "quantity": 3 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(&url)
            .add_header(org_header(), org_value(org))
            .json(&json!({ "activity_type": "proposal", "date": "2024-08-06", "prospect_name": "Initech" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .get(&format!("{}?start_date=2024-08-01&end_date=2024-08-31", url))
            .add_header(org_header(), org_value(org))
            .await;
        let body: ApiResponse<Vec<ActivityResponse>> = response.json();
        assert_eq!(body.data.len(), 2);
        assert_eq!(body.data[0].activity_type, ActivityKind::Proposal);
        assert_eq!(body.data[1].quantity, Some(3));
    }

    #[tokio::test]
    async fn test_lead_quality_out_of_range_is_rejected() {
        let server = setup_test_server().await;
        let org = create_test_organization(&server, "quality").await;
        let client_id = create_test_client(&server, org, "Acme").await;

        server
            .post(&format!("/api/v1/clients/{}/activities", client_id))
            .add_header(org_header(), org_value(org))
            .json(&json!({ "activity_type": "meeting", "date": "2024-08-05", "prospect_name": "Globex", "lead_quality": 6 }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
