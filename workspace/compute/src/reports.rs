//! Platform-wide reporting for administrators. These aggregates cross tenant
//! boundaries and are all-time, not windowed.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use common::{AdminOrganizationReport, PlatformSummary};
use model::entities::{campaign, campaign_metric, client, organization, task};

use crate::error::Result;

#[derive(Debug, Default, Clone, Copy)]
struct Money {
    spend: Decimal,
    revenue: Decimal,
}

/// Spend and revenue per client over all campaign metrics.
async fn money_by_client(db: &DatabaseConnection) -> Result<HashMap<i32, Money>> {
    let owner: HashMap<i32, i32> = campaign::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.client_id))
        .collect();

    let mut money: HashMap<i32, Money> = HashMap::new();
    for row in campaign_metric::Entity::find().all(db).await? {
        if let Some(client_id) = owner.get(&row.campaign_id) {
            let entry = money.entry(*client_id).or_default();
            entry.spend += row.spend;
            entry.revenue += row.revenue;
        }
    }
    Ok(money)
}

/// One row per organization with its client counts and totals.
#[instrument(skip(db))]
pub async fn organization_reports(db: &DatabaseConnection) -> Result<Vec<AdminOrganizationReport>> {
    let organizations = organization::Entity::find()
        .order_by_asc(organization::Column::Name)
        .all(db)
        .await?;
    let clients = client::Entity::find().all(db).await?;
    let money = money_by_client(db).await?;

    let mut reports: Vec<AdminOrganizationReport> = organizations
        .into_iter()
        .map(|org| AdminOrganizationReport {
            organization_id: org.id,
            name: org.name,
            client_count: 0,
            active_client_count: 0,
            total_spend: Decimal::ZERO,
            total_revenue: Decimal::ZERO,
        })
        .collect();
    let index: HashMap<i32, usize> = reports
        .iter()
        .enumerate()
        .map(|(i, r)| (r.organization_id, i))
        .collect();

    for client in clients {
        let Some(&i) = index.get(&client.organization_id) else {
            continue;
        };
        let report = &mut reports[i];
        report.client_count += 1;
        if client.status == client::ClientStatus::Active {
            report.active_client_count += 1;
        }
        if let Some(m) = money.get(&client.id) {
            report.total_spend += m.spend;
            report.total_revenue += m.revenue;
        }
    }

    debug!(organizations = reports.len(), "Built organization reports");
    Ok(reports)
}

/// Totals over the whole platform.
#[instrument(skip(db))]
pub async fn platform_summary(db: &DatabaseConnection) -> Result<PlatformSummary> {
    let money = money_by_client(db).await?;

    Ok(PlatformSummary {
        organizations: organization::Entity::find().count(db).await? as i64,
        clients: client::Entity::find().count(db).await? as i64,
        active_clients: client::Entity::find()
            .filter(client::Column::Status.eq(client::ClientStatus::Active))
            .count(db)
            .await? as i64,
        campaigns: campaign::Entity::find().count(db).await? as i64,
        open_tasks: task::Entity::find()
            .filter(task::Column::Completed.eq(false))
            .count(db)
            .await? as i64,
        total_spend: money.values().map(|m| m.spend).sum(),
        total_revenue: money.values().map(|m| m.revenue).sum(),
    })
}
