//! Request context extractors.
//!
//! Every tenant-scoped route takes a [`TenantContext`]; handlers never read
//! the organization from anywhere else. Admin routes take [`AdminAccess`].

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use model::entities::organization;
use sea_orm::EntityTrait;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

pub const ORGANIZATION_HEADER: &str = "x-organization-id";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// The organization the current request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub organization_id: i32,
}

#[async_trait]
impl FromRequestParts<AppState> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ORGANIZATION_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Organization-Id header".to_string()))?;

        let organization_id: i32 = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| ApiError::Unauthorized("Invalid X-Organization-Id header".to_string()))?;

        match organization::Entity::find_by_id(organization_id).one(&state.db).await? {
            Some(_) => {
                debug!(organization_id, "Resolved tenant");
                Ok(TenantContext { organization_id })
            }
            None => {
                warn!(organization_id, "Request for unknown organization");
                Err(ApiError::Unauthorized(format!(
                    "Unknown organization {}",
                    organization_id
                )))
            }
        }
    }
}

/// Proof that the request carried the configured admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

#[async_trait]
impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(ApiError::Forbidden("Admin reports are disabled".to_string()));
        };

        let provided = parts
            .headers
            .get(ADMIN_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(token) if token == expected => Ok(AdminAccess),
            _ => {
                warn!("Rejected admin request with missing or wrong token");
                Err(ApiError::Forbidden("Invalid admin token".to_string()))
            }
        }
    }
}
