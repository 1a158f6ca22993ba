//! Common transport-layer types shared between the API server and its clients.
//! Handlers serialize these shapes and the client-side controllers in `compute`
//! deserialize them, so both sides agree on one definition.

mod analytics;
mod board;
mod window;

pub use analytics::{
    AdminOrganizationReport, BlendedMetrics, CampaignTotals, ClientAnalytics, ClientTotals,
    CommercialTotals, FinanceSeries, Funnel, FunnelStage, PlatformSummary, SeriesPoint,
    TargetStatus,
};
pub use board::{
    BoardSnapshot, ClientDto, ClientStatus, GoalDto, MoveTaskRequest, ProjectDto, TaskCategory,
    TaskDto, ToggleTaskRequest,
};
pub use window::{DateWindow, WindowError};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by every handler.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in a successful response with the given message.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error body returned by every failing handler.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Machine readable error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}
