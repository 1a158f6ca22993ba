use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActivityType {
    #[sea_orm(string_value = "meeting")]
    Meeting,
    #[sea_orm(string_value = "proposal")]
    Proposal,
}

/// A meeting or proposal logged for a client.
///
/// One row may stand for several events ("5 meetings this week"), so
/// consumers sum `quantity` (a missing value counts as one) instead of
/// counting rows.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "commercial_activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub client_id: i32,
    pub activity_type: ActivityType,
    pub date: NaiveDate,
    pub prospect_name: String,
    pub quantity: Option<i32>,
    pub notes: Option<String>,
    /// 1 (poor) to 5 (excellent), only set by weekly summaries.
    pub lead_quality: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "Cascade"
    )]
    Client,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
