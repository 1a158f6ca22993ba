//! Database-backed composition of the client dashboard and reports payloads.

use std::collections::HashMap;

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use common::{CampaignTotals, ClientAnalytics, ClientTotals, DateWindow, FinanceSeries};
use model::entities::{campaign, campaign_metric, client, commercial_activity, deal};

use crate::activity::commercial_totals;
use crate::error::{ComputeError, Result};
use crate::metrics::{blended_metrics, campaign_totals, client_totals, target_status};
use crate::series::{
    commercial_funnel, evolution_series, finance_series, frame_to_series, marketing_funnel,
};

async fn campaigns_of(db: &DatabaseConnection, client_ids: &[i32]) -> Result<Vec<campaign::Model>> {
    if client_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(campaign::Entity::find()
        .filter(campaign::Column::ClientId.is_in(client_ids.iter().copied()))
        .order_by_asc(campaign::Column::Id)
        .all(db)
        .await?)
}

async fn metrics_of(
    db: &DatabaseConnection,
    campaigns: &[campaign::Model],
    window: &DateWindow,
) -> Result<Vec<campaign_metric::Model>> {
    if campaigns.is_empty() {
        return Ok(Vec::new());
    }
    Ok(campaign_metric::Entity::find()
        .filter(campaign_metric::Column::CampaignId.is_in(campaigns.iter().map(|c| c.id)))
        .filter(campaign_metric::Column::Date.between(window.start, window.end))
        .order_by_asc(campaign_metric::Column::Date)
        .all(db)
        .await?)
}

async fn deals_of(
    db: &DatabaseConnection,
    client_ids: &[i32],
    window: &DateWindow,
) -> Result<Vec<deal::Model>> {
    if client_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(deal::Entity::find()
        .filter(deal::Column::ClientId.is_in(client_ids.iter().copied()))
        .filter(deal::Column::Date.between(window.start, window.end))
        .order_by_asc(deal::Column::Date)
        .all(db)
        .await?)
}

/// Full dashboard payload for one client.
#[instrument(skip(db, client), fields(client_id = client.id))]
pub async fn client_analytics(
    db: &DatabaseConnection,
    client: &client::Model,
    window: DateWindow,
) -> Result<ClientAnalytics> {
    let campaigns = campaigns_of(db, &[client.id]).await?;
    let metrics = metrics_of(db, &campaigns, &window).await?;
    let deals = deals_of(db, &[client.id], &window).await?;
    let activities = commercial_activity::Entity::find()
        .filter(commercial_activity::Column::ClientId.eq(client.id))
        .filter(commercial_activity::Column::Date.between(window.start, window.end))
        .all(db)
        .await?;

    debug!(
        campaigns = campaigns.len(),
        metrics = metrics.len(),
        deals = deals.len(),
        activities = activities.len(),
        "Loaded client data"
    );

    let campaign_rows: Vec<CampaignTotals> = campaigns
        .iter()
        .map(|c| campaign_totals(c, &metrics, &window))
        .collect();
    let totals = client_totals(&metrics, &window);
    let blended = blended_metrics(&campaign_rows, &deals, &window);
    let commercial = commercial_totals(&activities, &deals, &window);
    let frame = finance_series(&metrics, &deals, &window)?;

    Ok(ClientAnalytics {
        client_id: client.id,
        window,
        target_roas: client.target_roas,
        target_status: target_status(blended.roas, client.target_roas),
        finance_series: frame_to_series(&frame, false)?,
        marketing_funnel: marketing_funnel(&totals),
        commercial_funnel: commercial_funnel(blended.ad_leads, &commercial),
        campaigns: campaign_rows,
        totals,
        blended,
        commercial,
    })
}

/// Totals of each campaign of a client inside the window.
#[instrument(skip(db))]
pub async fn client_campaign_totals(
    db: &DatabaseConnection,
    client_id: i32,
    window: DateWindow,
) -> Result<Vec<CampaignTotals>> {
    let campaigns = campaigns_of(db, &[client_id]).await?;
    let metrics = metrics_of(db, &campaigns, &window).await?;
    Ok(campaigns
        .iter()
        .map(|c| campaign_totals(c, &metrics, &window))
        .collect())
}

/// Totals per client for the client list.
#[instrument(skip(db, clients))]
pub async fn totals_by_client(
    db: &DatabaseConnection,
    clients: &[client::Model],
    window: DateWindow,
) -> Result<HashMap<i32, ClientTotals>> {
    let client_ids: Vec<i32> = clients.iter().map(|c| c.id).collect();
    let campaigns = campaigns_of(db, &client_ids).await?;
    let metrics = metrics_of(db, &campaigns, &window).await?;

    let owner: HashMap<i32, i32> = campaigns.iter().map(|c| (c.id, c.client_id)).collect();
    let mut per_client: HashMap<i32, Vec<campaign_metric::Model>> = HashMap::new();
    for row in metrics {
        if let Some(client_id) = owner.get(&row.campaign_id) {
            per_client.entry(*client_id).or_default().push(row);
        }
    }

    Ok(client_ids
        .into_iter()
        .map(|id| {
            let rows = per_client.remove(&id).unwrap_or_default();
            (id, client_totals(&rows, &window))
        })
        .collect())
}

/// Zero-filled daily series over all clients of an organization, or over one
/// of them.
#[instrument(skip(db))]
pub async fn evolution(
    db: &DatabaseConnection,
    organization_id: i32,
    client_id: Option<i32>,
    window: DateWindow,
) -> Result<FinanceSeries> {
    let mut query = client::Entity::find().filter(client::Column::OrganizationId.eq(organization_id));
    if let Some(client_id) = client_id {
        query = query.filter(client::Column::Id.eq(client_id));
    }
    let client_ids: Vec<i32> = query.all(db).await?.into_iter().map(|c| c.id).collect();

    if let (Some(client_id), true) = (client_id, client_ids.is_empty()) {
        return Err(ComputeError::NotFound(format!("client {}", client_id)));
    }

    let campaigns = campaigns_of(db, &client_ids).await?;
    let metrics = metrics_of(db, &campaigns, &window).await?;
    let deals = deals_of(db, &client_ids, &window).await?;

    let frame = evolution_series(&metrics, &deals, &window)?;
    frame_to_series(&frame, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::NaiveDate;
    use common::TargetStatus;
    use model::entities::commercial_activity::ActivityType;
    use rust_decimal::Decimal;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, day).unwrap()
    }

    #[tokio::test]
    async fn test_client_analytics_blends_offline_revenue() {
        let db = setup_db().await.unwrap();
        let org = new_organization(&db).await.unwrap();
        let client = new_client(&db, &org, "Acme", client::ClientStatus::Active).await.unwrap();
        let campaign = new_campaign(&db, &client, "Search").await.unwrap();

        new_metric(&db, &campaign, date(2), 400, 1000, 10).await.unwrap();
        new_metric(&db, &campaign, date(3), 600, 2000, 15).await.unwrap();
        new_metric(&db, &campaign, date(28), 9000, 9000, 90).await.unwrap();
        new_deal(&db, &client, date(10), 2000).await.unwrap();
        new_deal(&db, &client, date(25), 7777).await.unwrap();
        new_activity(&db, &client, ActivityType::Meeting, date(4), Some(3)).await.unwrap();
        new_activity(&db, &client, ActivityType::Meeting, date(5), None).await.unwrap();

        let analytics = client_analytics(&db, &client, window(date(1), date(20)))
            .await
            .unwrap();

        assert_eq!(analytics.blended.ad_spend, Decimal::new(1000, 0));
        assert_eq!(analytics.blended.total_revenue, Decimal::new(5000, 0));
        assert_eq!(analytics.blended.roas, Decimal::new(5, 0));
        assert_eq!(analytics.blended.roi, Decimal::new(4, 0));
        assert_eq!(analytics.target_status, TargetStatus::Above);
        assert_eq!(analytics.campaigns.len(), 1);
        assert_eq!(analytics.commercial.meetings, 4);
        assert_eq!(analytics.commercial.closed_deals, 1);
        assert_eq!(analytics.finance_series.points.len(), 2);
        assert!(!analytics.commercial_funnel.cohort_linked);
    }

    #[tokio::test]
    async fn test_totals_by_client_keeps_clients_apart() {
        let db = setup_db().await.unwrap();
        let org = new_organization(&db).await.unwrap();
        let acme = new_client(&db, &org, "Acme", client::ClientStatus::Active).await.unwrap();
        let globex = new_client(&db, &org, "Globex", client::ClientStatus::Paused).await.unwrap();
        let search = new_campaign(&db, &acme, "Search").await.unwrap();
        new_metric(&db, &search, date(1), 100, 250, 4).await.unwrap();

        let totals = totals_by_client(&db, &[acme.clone(), globex.clone()], window(date(1), date(30)))
            .await
            .unwrap();

        assert_eq!(totals[&acme.id].spend, Decimal::new(100, 0));
        assert_eq!(totals[&acme.id].cpl, Decimal::new(25, 0));
        assert_eq!(totals[&globex.id], ClientTotals::default());
    }

    #[tokio::test]
    async fn test_evolution_rejects_foreign_client() {
        let db = setup_db().await.unwrap();
        let org = new_organization(&db).await.unwrap();
        let other = new_organization(&db).await.unwrap();
        let foreign = new_client(&db, &other, "Foreign", client::ClientStatus::Active).await.unwrap();

        let err = evolution(&db, org.id, Some(foreign.id), window(date(1), date(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, ComputeError::NotFound(_)));

        let series = evolution(&db, org.id, None, window(date(1), date(7))).await.unwrap();
        assert_eq!(series.points.len(), 7);
        assert!(series.zero_filled);
    }
}
