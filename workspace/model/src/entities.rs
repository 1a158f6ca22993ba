//! Root of the SeaORM entity modules.
//! Every tenant-scoped table carries an `organization_id`; rows are never
//! shared between organizations.

pub mod campaign;
pub mod campaign_metric;
pub mod client;
pub mod commercial_activity;
pub mod contract;
pub mod deal;
pub mod goal;
pub mod insight;
pub mod note;
pub mod organization;
pub mod project;
pub mod task;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::campaign::Entity as Campaign;
    pub use super::campaign_metric::Entity as CampaignMetric;
    pub use super::client::Entity as Client;
    pub use super::commercial_activity::Entity as CommercialActivity;
    pub use super::contract::Entity as Contract;
    pub use super::deal::Entity as Deal;
    pub use super::goal::Entity as Goal;
    pub use super::insight::Entity as Insight;
    pub use super::note::Entity as Note;
    pub use super::organization::Entity as Organization;
    pub use super::project::Entity as Project;
    pub use super::task::Entity as Task;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, ModelTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    async fn new_organization(db: &DatabaseConnection, slug: &str) -> Result<organization::Model, DbErr> {
        organization::ActiveModel {
            name: Set(format!("Agency {}", slug)),
            slug: Set(slug.to_string()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    async fn new_client(db: &DatabaseConnection, org: &organization::Model, name: &str) -> Result<client::Model, DbErr> {
        client::ActiveModel {
            organization_id: Set(org.id),
            name: Set(name.to_string()),
            industry: Set(Some("retail".to_string())),
            status: Set(client::ClientStatus::Active),
            target_roas: Set(Some(Decimal::new(4, 0))),
            crm_enabled: Set(true),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let org = new_organization(&db, "acme").await?;
        let client = new_client(&db, &org, "Bakery").await?;

        let campaign = campaign::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(client.id),
            name: Set("Spring sale".to_string()),
            platform: Set("meta".to_string()),
            status: Set(campaign::CampaignStatus::Active),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        for day in 1..=3 {
            campaign_metric::ActiveModel {
                campaign_id: Set(campaign.id),
                date: Set(NaiveDate::from_ymd_opt(2024, 5, day).unwrap()),
                spend: Set(Decimal::new(100, 0)),
                revenue: Set(Decimal::new(350, 0)),
                leads: Set(4),
                purchases: Set(1),
                impressions: Set(1000),
                clicks: Set(40),
                ..Default::default()
            }
            .insert(&db)
            .await?;
        }

        let metrics = campaign.find_related(CampaignMetric).all(&db).await?;
        assert_eq!(metrics.len(), 3);

        let campaigns = client.find_related(Campaign).all(&db).await?;
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].name, "Spring sale");

        let project = project::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(Some(client.id)),
            name: Set("Website".to_string()),
            progress: Set(40),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let task = task::ActiveModel {
            organization_id: Set(org.id),
            title: Set("Write copy".to_string()),
            category: Set(task::TaskCategory::Schedule),
            completed: Set(false),
            project_id: Set(Some(project.id)),
            client_id: Set(Some(client.id)),
            version: Set(1),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let project_tasks = project.find_related(Task).all(&db).await?;
        assert_eq!(project_tasks, vec![task.clone()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_large_amounts_keep_their_value() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let org = new_organization(&db, "large").await?;
        let client = new_client(&db, &org, "Dealer").await?;
        let total = Decimal::new(12_345_678_901_225, 2);

        let stored = deal::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(client.id),
            date: Set(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            quantity: Set(1),
            total_value: Set(total),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let found = Deal::find_by_id(stored.id).one(&db).await?.unwrap();
        assert_eq!(found.total_value, total);

        Ok(())
    }

    #[tokio::test]
    async fn test_client_delete_cascades() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let org = new_organization(&db, "cascade").await?;
        let client = new_client(&db, &org, "Florist").await?;

        deal::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(client.id),
            date: Set(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            quantity: Set(1),
            total_value: Set(Decimal::new(2000, 0)),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        commercial_activity::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(client.id),
            activity_type: Set(commercial_activity::ActivityType::Meeting),
            date: Set(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
            prospect_name: Set("Prospect".to_string()),
            quantity: Set(Some(5)),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        Client::delete_by_id(client.id).exec(&db).await?;

        let deals = Deal::find()
            .filter(deal::Column::ClientId.eq(client.id))
            .all(&db)
            .await?;
        assert!(deals.is_empty());
        let activities = CommercialActivity::find().all(&db).await?;
        assert!(activities.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_metric_day_is_rejected() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let org = new_organization(&db, "unique").await?;
        let client = new_client(&db, &org, "Gym").await?;
        let campaign = campaign::ActiveModel {
            organization_id: Set(org.id),
            client_id: Set(client.id),
            name: Set("Always on".to_string()),
            platform: Set("google".to_string()),
            status: Set(campaign::CampaignStatus::Active),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let row = || campaign_metric::ActiveModel {
            campaign_id: Set(campaign.id),
            date: Set(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()),
            spend: Set(Decimal::ONE),
            revenue: Set(Decimal::ZERO),
            leads: Set(0),
            purchases: Set(0),
            impressions: Set(0),
            clicks: Set(0),
            ..Default::default()
        };

        row().insert(&db).await?;
        assert!(row().insert(&db).await.is_err());

        Ok(())
    }
}
