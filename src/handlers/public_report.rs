//! Unauthenticated report form shared with a client.
//!
//! The client id in the path is the only credential; the organization is taken
//! from the client row. Every submission is written in a single transaction.

use crate::error::ApiError;
use crate::handlers::activities::{insert_activity, ActivityKind, NewActivity};
use crate::handlers::deals::{deal_total, insert_deal, NewDeal};
use crate::helpers::money::validate_amount;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use model::entities::client;
use rust_decimal::Decimal;
use sea_orm::{DatabaseTransaction, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

pub const WEEKLY_PROSPECT: &str = "Resumo Semanal";
pub const FEEDBACK_ONLY_PROSPECT: &str = "Feedback Semanal (Sem Dados)";

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// What the form needs to render
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportFormResponse {
    pub client_id: i32,
    pub client_name: String,
    /// Meetings, proposals and weekly summaries are only offered when true
    pub crm_enabled: bool,
}

/// A single sale
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct SaleReport {
    pub date: NaiveDate,
    #[validate(length(max = 200))]
    pub product: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(custom(function = "validate_amount"))]
    pub unit_value: Option<Decimal>,
    #[validate(custom(function = "validate_amount"))]
    pub total_value: Option<Decimal>,
    pub notes: Option<String>,
}

/// A single meeting or proposal with a prospect
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct ProspectReport {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub prospect_name: String,
    pub notes: Option<String>,
}

/// Aggregated numbers of one week
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct WeeklySummaryReport {
    pub date: NaiveDate,
    #[validate(range(min = 0))]
    pub weekly_meetings: i32,
    #[validate(range(min = 0))]
    pub weekly_proposals: i32,
    #[validate(range(min = 0))]
    pub weekly_sales_count: i32,
    #[validate(custom(function = "validate_amount"))]
    pub weekly_sales_value: Option<Decimal>,
    pub feedback: Option<String>,
    /// 1 (poor) to 5 (excellent)
    #[validate(range(min = 1, max = 5))]
    pub lead_quality: i32,
}

impl WeeklySummaryReport {
    fn feedback_text(&self) -> Option<String> {
        self.feedback
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    }

    fn has_counts(&self) -> bool {
        self.weekly_meetings > 0 || self.weekly_proposals > 0 || self.weekly_sales_count > 0
    }
}

/// Body of a report submission, tagged by `kind`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportSubmission {
    Sale(SaleReport),
    Meeting(ProspectReport),
    Proposal(ProspectReport),
    WeeklySummary(WeeklySummaryReport),
}

impl ReportSubmission {
    /// Kinds that are only accepted for clients with CRM enabled
    fn needs_crm(&self) -> bool {
        !matches!(self, ReportSubmission::Sale(_))
    }
}

impl Validate for ReportSubmission {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            ReportSubmission::Sale(report) => report.validate(),
            ReportSubmission::Meeting(report) | ReportSubmission::Proposal(report) => report.validate(),
            ReportSubmission::WeeklySummary(report) => report.validate(),
        }
    }
}

/// Ids of everything a submission created
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmissionReceipt {
    pub client_id: i32,
    pub activity_ids: Vec<i32>,
    pub deal_ids: Vec<i32>,
}

async fn find_public_client(state: &AppState, client_id: i32) -> Result<client::Model, ApiError> {
    client::Entity::find_by_id(client_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            warn!("Report form requested for unknown client {}", client_id);
            ApiError::NotFound(format!("Client {}", client_id))
        })
}

/// Form metadata for a client
#[utoipa::path(
    get,
    path = "/api/v1/report/{client_id}",
    tag = "public",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    responses(
        (status = 200, description = "Form metadata", body = ApiResponse<ReportFormResponse>),
        (status = 404, description = "Unknown client", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_report_form(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReportFormResponse>>, ApiError> {
    trace!("Entering get_report_form function for client_id: {}", client_id);
    let client = find_public_client(&state, client_id).await?;

    Ok(Json(ApiResponse::ok(
        ReportFormResponse {
            client_id: client.id,
            client_name: client.name,
            crm_enabled: client.crm_enabled,
        },
        "Report form retrieved successfully",
    )))
}

/// Submit a sale, a meeting, a proposal or a weekly summary for a client
#[utoipa::path(
    post,
    path = "/api/v1/report/{client_id}",
    tag = "public",
    params(
        ("client_id" = i32, Path, description = "Client ID"),
    ),
    request_body = ReportSubmission,
    responses(
        (status = 201, description = "Report stored", body = ApiResponse<SubmissionReceipt>),
        (status = 404, description = "Unknown client", body = ErrorResponse),
        (status = 422, description = "Invalid or empty report, or a CRM report for a client without CRM", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn submit_report(
    Path(client_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(submission)): Valid<Json<ReportSubmission>>,
) -> Result<(StatusCode, Json<ApiResponse<SubmissionReceipt>>), ApiError> {
    trace!("Entering submit_report function for client_id: {}", client_id);
    let client = find_public_client(&state, client_id).await?;
    if submission.needs_crm() && !client.crm_enabled {
        warn!("CRM report submitted for client {} without CRM", client_id);
        return Err(ApiError::Validation(format!(
            "Client {} does not track meetings, proposals or weekly summaries",
            client_id
        )));
    }

    let txn = state.db.begin().await?;
    let receipt = store_submission(&txn, &client, submission).await?;
    txn.commit().await?;

    state.invalidate_cache();
    info!(
        "Stored report for client {}: {} activities, {} deals",
        client_id,
        receipt.activity_ids.len(),
        receipt.deal_ids.len()
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(receipt, "Report submitted successfully")),
    ))
}

async fn store_submission(
    txn: &DatabaseTransaction,
    client: &client::Model,
    submission: ReportSubmission,
) -> Result<SubmissionReceipt, ApiError> {
    let org = client.organization_id;
    let mut receipt = SubmissionReceipt {
        client_id: client.id,
        ..Default::default()
    };

    match submission {
        ReportSubmission::Sale(sale) => {
            let total_value = deal_total(sale.quantity, sale.unit_value, sale.total_value)?;
            let deal = insert_deal(
                txn,
                org,
                NewDeal {
                    client_id: client.id,
                    date: sale.date,
                    product: sale.product,
                    quantity: sale.quantity,
                    unit_value: sale.unit_value,
                    total_value,
                    notes: sale.notes,
                },
            )
            .await?;
            receipt.deal_ids.push(deal.id);
        }
        ReportSubmission::Meeting(report) => {
            let id = insert_prospect(txn, client, ActivityKind::Meeting, report).await?;
            receipt.activity_ids.push(id);
        }
        ReportSubmission::Proposal(report) => {
            let id = insert_prospect(txn, client, ActivityKind::Proposal, report).await?;
            receipt.activity_ids.push(id);
        }
        ReportSubmission::WeeklySummary(summary) => {
            store_weekly_summary(txn, client, &summary, &mut receipt).await?;
        }
    }

    Ok(receipt)
}

async fn insert_prospect(
    txn: &DatabaseTransaction,
    client: &client::Model,
    kind: ActivityKind,
    report: ProspectReport,
) -> Result<i32, ApiError> {
    let activity = insert_activity(
        txn,
        client.organization_id,
        NewActivity {
            client_id: client.id,
            kind,
            date: report.date,
            prospect_name: report.prospect_name.trim().to_string(),
            quantity: Some(1),
            notes: report.notes,
            lead_quality: None,
        },
    )
    .await?;
    Ok(activity.id)
}

/// Expands a weekly summary into activities and a deal.
///
/// Feedback and lead quality go to the first activity created, or into the
/// deal notes when the week only had sales. A week with no numbers but with
/// feedback is kept as a zero-quantity meeting.
async fn store_weekly_summary(
    txn: &DatabaseTransaction,
    client: &client::Model,
    summary: &WeeklySummaryReport,
    receipt: &mut SubmissionReceipt,
) -> Result<(), ApiError> {
    let feedback = summary.feedback_text();
    let org = client.organization_id;

    if !summary.has_counts() {
        let Some(feedback) = feedback else {
            return Err(ApiError::Validation(
                "A weekly summary needs at least one number or some feedback".to_string(),
            ));
        };
        debug!("Weekly summary without numbers, storing feedback only");
        let activity = insert_activity(
            txn,
            org,
            NewActivity {
                client_id: client.id,
                kind: ActivityKind::Meeting,
                date: summary.date,
                prospect_name: FEEDBACK_ONLY_PROSPECT.to_string(),
                quantity: Some(0),
                notes: Some(feedback),
                lead_quality: Some(summary.lead_quality),
            },
        )
        .await?;
        receipt.activity_ids.push(activity.id);
        return Ok(());
    }

    let counts = [
        (ActivityKind::Meeting, summary.weekly_meetings),
        (ActivityKind::Proposal, summary.weekly_proposals),
    ];
    for (kind, quantity) in counts {
        if quantity <= 0 {
            continue;
        }
        let first = receipt.activity_ids.is_empty();
        let activity = insert_activity(
            txn,
            org,
            NewActivity {
                client_id: client.id,
                kind,
                date: summary.date,
                prospect_name: WEEKLY_PROSPECT.to_string(),
                quantity: Some(quantity),
                notes: if first { feedback.clone() } else { None },
                lead_quality: if first { Some(summary.lead_quality) } else { None },
            },
        )
        .await?;
        receipt.activity_ids.push(activity.id);
    }

    if summary.weekly_sales_count > 0 {
        let notes = if receipt.activity_ids.is_empty() {
            Some(match &feedback {
                Some(text) => format!("{} (lead quality {}/5)", text, summary.lead_quality),
                None => format!("Lead quality {}/5", summary.lead_quality),
            })
        } else {
            None
        };
        let deal = insert_deal(
            txn,
            org,
            NewDeal {
                client_id: client.id,
                date: summary.date,
                product: None,
                quantity: summary.weekly_sales_count,
                unit_value: None,
                total_value: summary.weekly_sales_value.unwrap_or(Decimal::ZERO),
                notes,
            },
        )
        .await?;
        receipt.deal_ids.push(deal.id);
    }

    Ok(())
}
