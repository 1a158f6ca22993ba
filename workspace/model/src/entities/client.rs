use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Whether an agency is currently serving the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ClientStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
}

impl From<ClientStatus> for common::ClientStatus {
    fn from(status: ClientStatus) -> Self {
        match status {
            ClientStatus::Active => common::ClientStatus::Active,
            ClientStatus::Paused => common::ClientStatus::Paused,
        }
    }
}

impl From<common::ClientStatus> for ClientStatus {
    fn from(status: common::ClientStatus) -> Self {
        match status {
            common::ClientStatus::Active => ClientStatus::Active,
            common::ClientStatus::Paused => ClientStatus::Paused,
        }
    }
}

/// A customer of the agency.
///
/// Spend, revenue, leads and ROAS are deliberately absent: they are summed
/// from `campaign_metrics` for whatever window the caller asks about.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub name: String,
    pub industry: Option<String>,
    pub status: ClientStatus,
    /// ROAS the client expects; drives the above/below badge.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub target_roas: Option<Decimal>,
    /// Enables the CRM-lite features (meetings, proposals, deals).
    #[sea_orm(default_value = "false")]
    pub crm_enabled: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organization::Entity",
        from = "Column::OrganizationId",
        to = "super::organization::Column::Id",
        on_delete = "Cascade"
    )]
    Organization,
    #[sea_orm(has_many = "super::campaign::Entity")]
    Campaign,
    #[sea_orm(has_many = "super::deal::Entity")]
    Deal,
    #[sea_orm(has_many = "super::commercial_activity::Entity")]
    CommercialActivity,
    #[sea_orm(has_many = "super::insight::Entity")]
    Insight,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl Related<super::deal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

impl Related<super::commercial_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommercialActivity.def()
    }
}

impl Related<super::insight::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Insight.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
