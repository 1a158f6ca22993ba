use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// One day of ad-platform results for a campaign.
/// There is at most one row per `(campaign_id, date)`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaign_metrics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub campaign_id: i32,
    pub date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub spend: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub revenue: Decimal,
    pub leads: i64,
    pub purchases: i64,
    pub impressions: i64,
    pub clicks: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::campaign::Entity",
        from = "Column::CampaignId",
        to = "super::campaign::Column::Id",
        on_delete = "Cascade"
    )]
    Campaign,
}

impl Related<super::campaign::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaign.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
