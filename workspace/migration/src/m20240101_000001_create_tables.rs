use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create organizations table
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(pk_auto(Organizations::Id))
                    .col(string(Organizations::Name))
                    .col(string(Organizations::Slug).unique_key())
                    .col(date_time(Organizations::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create clients table
        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(pk_auto(Clients::Id))
                    .col(integer(Clients::OrganizationId))
                    .col(string(Clients::Name))
                    .col(string_null(Clients::Industry))
                    .col(string_len(Clients::Status, 16).default("active"))
                    .col(decimal_null(Clients::TargetRoas).decimal_len(16, 4))
                    .col(boolean(Clients::CrmEnabled).default(false))
                    .col(date_time(Clients::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_organization")
                            .from(Clients::Table, Clients::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create campaigns table
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(pk_auto(Campaigns::Id))
                    .col(integer(Campaigns::OrganizationId))
                    .col(integer(Campaigns::ClientId))
                    .col(string(Campaigns::Name))
                    .col(string(Campaigns::Platform))
                    .col(string_len(Campaigns::Status, 16).default("active"))
                    .col(date_time(Campaigns::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_client")
                            .from(Campaigns::Table, Campaigns::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create campaign_metrics table, one row per campaign and day
        manager
            .create_table(
                Table::create()
                    .table(CampaignMetrics::Table)
                    .if_not_exists()
                    .col(pk_auto(CampaignMetrics::Id))
                    .col(integer(CampaignMetrics::CampaignId))
                    .col(date(CampaignMetrics::Date))
                    .col(decimal(CampaignMetrics::Spend).decimal_len(16, 4))
                    .col(decimal(CampaignMetrics::Revenue).decimal_len(16, 4))
                    .col(big_integer(CampaignMetrics::Leads).default(0))
                    .col(big_integer(CampaignMetrics::Purchases).default(0))
                    .col(big_integer(CampaignMetrics::Impressions).default(0))
                    .col(big_integer(CampaignMetrics::Clicks).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_metric_campaign")
                            .from(CampaignMetrics::Table, CampaignMetrics::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_campaign_metrics_campaign_date")
                    .table(CampaignMetrics::Table)
                    .col(CampaignMetrics::CampaignId)
                    .col(CampaignMetrics::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create deals table
        manager
            .create_table(
                Table::create()
                    .table(Deals::Table)
                    .if_not_exists()
                    .col(pk_auto(Deals::Id))
                    .col(integer(Deals::OrganizationId))
                    .col(integer(Deals::ClientId))
                    .col(date(Deals::Date))
                    .col(string_null(Deals::Product))
                    .col(integer(Deals::Quantity).default(1))
                    .col(decimal_null(Deals::UnitValue).decimal_len(16, 4))
                    .col(decimal(Deals::TotalValue).decimal_len(16, 4))
                    .col(string_null(Deals::Notes))
                    .col(date_time(Deals::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deal_client")
                            .from(Deals::Table, Deals::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create commercial_activities table
        manager
            .create_table(
                Table::create()
                    .table(CommercialActivities::Table)
                    .if_not_exists()
                    .col(pk_auto(CommercialActivities::Id))
                    .col(integer(CommercialActivities::OrganizationId))
                    .col(integer(CommercialActivities::ClientId))
                    .col(string_len(CommercialActivities::ActivityType, 16))
                    .col(date(CommercialActivities::Date))
                    .col(string(CommercialActivities::ProspectName))
                    .col(integer_null(CommercialActivities::Quantity))
                    .col(string_null(CommercialActivities::Notes))
                    .col(integer_null(CommercialActivities::LeadQuality))
                    .col(date_time(CommercialActivities::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commercial_activity_client")
                            .from(CommercialActivities::Table, CommercialActivities::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create projects table
        manager
            .create_table(
                Table::create()
                    .table(Projects::Table)
                    .if_not_exists()
                    .col(pk_auto(Projects::Id))
                    .col(integer(Projects::OrganizationId))
                    .col(integer_null(Projects::ClientId))
                    .col(string(Projects::Name))
                    .col(string_null(Projects::Description))
                    .col(integer(Projects::Progress).default(0))
                    .col(date_null(Projects::Deadline))
                    .col(date_time(Projects::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_organization")
                            .from(Projects::Table, Projects::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_client")
                            .from(Projects::Table, Projects::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tasks table
        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_auto(Tasks::Id))
                    .col(integer(Tasks::OrganizationId))
                    .col(string(Tasks::Title))
                    .col(string_null(Tasks::Description))
                    .col(string_len(Tasks::Category, 16))
                    .col(boolean(Tasks::Completed).default(false))
                    .col(integer_null(Tasks::ClientId))
                    .col(integer_null(Tasks::ProjectId))
                    .col(date_null(Tasks::DueDate))
                    .col(integer(Tasks::Version).default(1))
                    .col(date_time(Tasks::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_organization")
                            .from(Tasks::Table, Tasks::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_client")
                            .from(Tasks::Table, Tasks::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_project")
                            .from(Tasks::Table, Tasks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create goals table
        manager
            .create_table(
                Table::create()
                    .table(Goals::Table)
                    .if_not_exists()
                    .col(pk_auto(Goals::Id))
                    .col(integer(Goals::OrganizationId))
                    .col(integer_null(Goals::ClientId))
                    .col(string(Goals::Title))
                    .col(decimal(Goals::TargetValue).decimal_len(16, 4))
                    .col(decimal(Goals::CurrentValue).decimal_len(16, 4))
                    .col(date_null(Goals::Deadline))
                    .col(date_time(Goals::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_goal_organization")
                            .from(Goals::Table, Goals::OrganizationId)
                            .to(Organizations::Table, Organizations::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create notes table
        manager
            .create_table(
                Table::create()
                    .table(Notes::Table)
                    .if_not_exists()
                    .col(pk_auto(Notes::Id))
                    .col(integer(Notes::OrganizationId))
                    .col(integer(Notes::ClientId))
                    .col(text(Notes::Content))
                    .col(date_time(Notes::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_client")
                            .from(Notes::Table, Notes::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create contracts table
        manager
            .create_table(
                Table::create()
                    .table(Contracts::Table)
                    .if_not_exists()
                    .col(pk_auto(Contracts::Id))
                    .col(integer(Contracts::OrganizationId))
                    .col(integer(Contracts::ClientId))
                    .col(string(Contracts::Title))
                    .col(decimal(Contracts::MonthlyFee).decimal_len(16, 4))
                    .col(date(Contracts::StartDate))
                    .col(date_null(Contracts::EndDate))
                    .col(string_len(Contracts::Status, 16).default("active"))
                    .col(date_time(Contracts::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contract_client")
                            .from(Contracts::Table, Contracts::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create insights table
        manager
            .create_table(
                Table::create()
                    .table(Insights::Table)
                    .if_not_exists()
                    .col(pk_auto(Insights::Id))
                    .col(integer(Insights::OrganizationId))
                    .col(integer(Insights::ClientId))
                    .col(string_len(Insights::InsightType, 16))
                    .col(string(Insights::Title))
                    .col(text(Insights::Description))
                    .col(date_time(Insights::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_insight_client")
                            .from(Insights::Table, Insights::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of creation to respect foreign key constraints
        manager
            .drop_table(Table::drop().table(Insights::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contracts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Projects::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommercialActivities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Deals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignMetrics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    Name,
    Slug,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Clients {
    Table,
    Id,
    OrganizationId,
    Name,
    Industry,
    Status,
    TargetRoas,
    CrmEnabled,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Name,
    Platform,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CampaignMetrics {
    Table,
    Id,
    CampaignId,
    Date,
    Spend,
    Revenue,
    Leads,
    Purchases,
    Impressions,
    Clicks,
}

#[derive(DeriveIden)]
enum Deals {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Date,
    Product,
    Quantity,
    UnitValue,
    TotalValue,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CommercialActivities {
    Table,
    Id,
    OrganizationId,
    ClientId,
    ActivityType,
    Date,
    ProspectName,
    Quantity,
    Notes,
    LeadQuality,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Projects {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Name,
    Description,
    Progress,
    Deadline,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    OrganizationId,
    Title,
    Description,
    Category,
    Completed,
    ClientId,
    ProjectId,
    DueDate,
    Version,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Goals {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Title,
    TargetValue,
    CurrentValue,
    Deadline,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Contracts {
    Table,
    Id,
    OrganizationId,
    ClientId,
    Title,
    MonthlyFee,
    StartDate,
    EndDate,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Insights {
    Table,
    Id,
    OrganizationId,
    ClientId,
    InsightType,
    Title,
    Description,
    CreatedAt,
}
