//! Tenant-scoped row lookups.
//!
//! A row that exists but belongs to another organization is reported as not
//! found, the same as a row that does not exist.

use model::entities::{campaign, client, project};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, PrimaryKeyTrait, QueryFilter,
};

use crate::error::ApiError;
use crate::tenant::TenantContext;

/// Find a row by id that belongs to the tenant.
pub async fn find_owned<E, C>(
    db: &C,
    tenant: &TenantContext,
    organization_column: E::Column,
    id: i32,
    what: &str,
) -> Result<E::Model, ApiError>
where
    E: EntityTrait,
    C: ConnectionTrait,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    E::find_by_id(id)
        .filter(organization_column.eq(tenant.organization_id))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} {}", what, id)))
}

pub async fn find_client<C: ConnectionTrait>(
    db: &C,
    tenant: &TenantContext,
    client_id: i32,
) -> Result<client::Model, ApiError> {
    find_owned::<client::Entity, _>(db, tenant, client::Column::OrganizationId, client_id, "Client").await
}

pub async fn find_campaign<C: ConnectionTrait>(
    db: &C,
    tenant: &TenantContext,
    campaign_id: i32,
) -> Result<campaign::Model, ApiError> {
    find_owned::<campaign::Entity, _>(db, tenant, campaign::Column::OrganizationId, campaign_id, "Campaign").await
}

pub async fn find_project<C: ConnectionTrait>(
    db: &C,
    tenant: &TenantContext,
    project_id: i32,
) -> Result<project::Model, ApiError> {
    find_owned::<project::Entity, _>(db, tenant, project::Column::OrganizationId, project_id, "Project").await
}

/// Checks that an optional client reference points into the tenant.
pub async fn check_client_ref<C: ConnectionTrait>(
    db: &C,
    tenant: &TenantContext,
    client_id: Option<i32>,
) -> Result<(), ApiError> {
    if let Some(client_id) = client_id {
        find_client(db, tenant, client_id).await?;
    }
    Ok(())
}

/// Checks that an optional project reference points into the tenant.
pub async fn check_project_ref<C: ConnectionTrait>(
    db: &C,
    tenant: &TenantContext,
    project_id: Option<i32>,
) -> Result<(), ApiError> {
    if let Some(project_id) = project_id {
        find_project(db, tenant, project_id).await?;
    }
    Ok(())
}
