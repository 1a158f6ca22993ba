use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::entity::prelude::*;

/// The four kanban columns of the urgency/importance matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TaskCategory {
    #[sea_orm(string_value = "do_now")]
    DoNow,
    #[sea_orm(string_value = "schedule")]
    Schedule,
    #[sea_orm(string_value = "delegate")]
    Delegate,
    #[sea_orm(string_value = "delete")]
    Delete,
}

impl From<TaskCategory> for common::TaskCategory {
    fn from(category: TaskCategory) -> Self {
        match category {
            TaskCategory::DoNow => common::TaskCategory::DoNow,
            TaskCategory::Schedule => common::TaskCategory::Schedule,
            TaskCategory::Delegate => common::TaskCategory::Delegate,
            TaskCategory::Delete => common::TaskCategory::Delete,
        }
    }
}

impl From<common::TaskCategory> for TaskCategory {
    fn from(category: common::TaskCategory) -> Self {
        match category {
            common::TaskCategory::DoNow => TaskCategory::DoNow,
            common::TaskCategory::Schedule => TaskCategory::Schedule,
            common::TaskCategory::Delegate => TaskCategory::Delegate,
            common::TaskCategory::Delete => TaskCategory::Delete,
        }
    }
}

/// A kanban card. Only `category` and `completed` change after creation
/// in normal use; `version` is bumped on every update.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub organization_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    #[sea_orm(default_value = "false")]
    pub completed: bool,
    pub client_id: Option<i32>,
    pub project_id: Option<i32>,
    pub due_date: Option<NaiveDate>,
    #[sea_orm(default_value = "1")]
    pub version: i32,
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
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "SetNull"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id",
        on_delete = "SetNull"
    )]
    Client,
}

impl Related<super::organization::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organization.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
