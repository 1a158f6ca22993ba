//! Fixtures shared by the unit tests of this crate.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, Utc};
use migration::{Migrator, MigratorTrait};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

use common::DateWindow;
use model::entities::{
    campaign, campaign_metric, client, commercial_activity, deal, organization, task,
};

pub type Result<T> = std::result::Result<T, DbErr>;

pub fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
    DateWindow::new(start, end).unwrap()
}

pub fn campaign_model(id: i32, name: &str) -> campaign::Model {
    campaign::Model {
        id,
        organization_id: 1,
        client_id: 1,
        name: name.to_string(),
        platform: "meta".to_string(),
        status: campaign::CampaignStatus::Active,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn metric_model(
    campaign_id: i32,
    date: NaiveDate,
    spend: Decimal,
    revenue: Decimal,
    leads: i64,
) -> campaign_metric::Model {
    campaign_metric::Model {
        id: 0,
        campaign_id,
        date,
        spend,
        revenue,
        leads,
        purchases: 0,
        impressions: leads * 100,
        clicks: leads * 10,
    }
}

pub fn deal_model(id: i32, date: NaiveDate, total_value: Decimal) -> deal::Model {
    deal::Model {
        id,
        organization_id: 1,
        client_id: 1,
        date,
        product: None,
        quantity: 1,
        unit_value: None,
        total_value,
        notes: None,
        created_at: Utc::now().naive_utc(),
    }
}

pub fn activity_model(
    id: i32,
    activity_type: commercial_activity::ActivityType,
    date: NaiveDate,
    quantity: Option<i32>,
) -> commercial_activity::Model {
    commercial_activity::Model {
        id,
        organization_id: 1,
        client_id: 1,
        activity_type,
        date,
        prospect_name: format!("Prospect {}", id),
        quantity,
        notes: None,
        lead_quality: None,
        created_at: Utc::now().naive_utc(),
    }
}

pub async fn setup_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub async fn new_organization(db: &DatabaseConnection) -> Result<organization::Model> {
    static ORG_ID: AtomicU64 = AtomicU64::new(0);
    let current_id = ORG_ID.fetch_add(1, Ordering::SeqCst);

    organization::ActiveModel {
        name: Set(format!("Agency {}", current_id)),
        slug: Set(format!("agency-{}", current_id)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_client(
    db: &DatabaseConnection,
    org: &organization::Model,
    name: &str,
    status: client::ClientStatus,
) -> Result<client::Model> {
    client::ActiveModel {
        organization_id: Set(org.id),
        name: Set(name.to_string()),
        industry: Set(None),
        status: Set(status),
        target_roas: Set(Some(Decimal::new(4, 0))),
        crm_enabled: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_campaign(db: &DatabaseConnection, client: &client::Model, name: &str) -> Result<campaign::Model> {
    campaign::ActiveModel {
        organization_id: Set(client.organization_id),
        client_id: Set(client.id),
        name: Set(name.to_string()),
        platform: Set("google".to_string()),
        status: Set(campaign::CampaignStatus::Active),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_metric(
    db: &DatabaseConnection,
    campaign: &campaign::Model,
    date: NaiveDate,
    spend: i64,
    revenue: i64,
    leads: i64,
) -> Result<campaign_metric::Model> {
    campaign_metric::ActiveModel {
        campaign_id: Set(campaign.id),
        date: Set(date),
        spend: Set(Decimal::new(spend, 0)),
        revenue: Set(Decimal::new(revenue, 0)),
        leads: Set(leads),
        purchases: Set(0),
        impressions: Set(leads * 100),
        clicks: Set(leads * 10),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_deal(
    db: &DatabaseConnection,
    client: &client::Model,
    date: NaiveDate,
    total_value: i64,
) -> Result<deal::Model> {
    deal::ActiveModel {
        organization_id: Set(client.organization_id),
        client_id: Set(client.id),
        date: Set(date),
        product: Set(Some("Offline sale".to_string())),
        quantity: Set(1),
        unit_value: Set(None),
        total_value: Set(Decimal::new(total_value, 0)),
        notes: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_activity(
    db: &DatabaseConnection,
    client: &client::Model,
    activity_type: commercial_activity::ActivityType,
    date: NaiveDate,
    quantity: Option<i32>,
) -> Result<commercial_activity::Model> {
    commercial_activity::ActiveModel {
        organization_id: Set(client.organization_id),
        client_id: Set(client.id),
        activity_type: Set(activity_type),
        date: Set(date),
        prospect_name: Set("Prospect".to_string()),
        quantity: Set(quantity),
        notes: Set(None),
        lead_quality: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_task(
    db: &DatabaseConnection,
    org: &organization::Model,
    title: &str,
    completed: bool,
) -> Result<task::Model> {
    task::ActiveModel {
        organization_id: Set(org.id),
        title: Set(title.to_string()),
        description: Set(None),
        category: Set(task::TaskCategory::DoNow),
        completed: Set(completed),
        client_id: Set(None),
        project_id: Set(None),
        due_date: Set(None),
        version: Set(1),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
