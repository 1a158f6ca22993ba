//! CRM-lite aggregation over commercial activities and closed deals.

use rust_decimal::Decimal;
use tracing::instrument;

use common::{CommercialTotals, DateWindow};
use model::entities::{
    commercial_activity::{self, ActivityType},
    deal,
};

/// Quantity an activity contributes to its total. A missing quantity counts as
/// one, a negative one as zero.
pub fn effective_quantity(quantity: Option<i32>) -> i64 {
    match quantity {
        None => 1,
        Some(q) => i64::from(q.max(0)),
    }
}

/// Sums meetings and proposals by quantity and counts the deals closed inside
/// the window.
#[instrument(skip(activities, deals))]
pub fn commercial_totals(
    activities: &[commercial_activity::Model],
    deals: &[deal::Model],
    window: &DateWindow,
) -> CommercialTotals {
    let mut totals = CommercialTotals::default();

    for activity in activities.iter().filter(|a| window.contains(a.date)) {
        let quantity = effective_quantity(activity.quantity);
        match activity.activity_type {
            ActivityType::Meeting => totals.meetings += quantity,
            ActivityType::Proposal => totals.proposals += quantity,
        }
    }

    for deal in deals.iter().filter(|d| window.contains(d.date)) {
        totals.closed_deals += 1;
        totals.deal_revenue += deal.total_value;
    }

    if totals.deal_revenue < Decimal::ZERO {
        tracing::warn!(revenue = %totals.deal_revenue, "Negative deal revenue in window");
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{activity_model, deal_model, window};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_effective_quantity() {
        assert_eq!(effective_quantity(None), 1);
        assert_eq!(effective_quantity(Some(0)), 0);
        assert_eq!(effective_quantity(Some(4)), 4);
        assert_eq!(effective_quantity(Some(-3)), 0);
    }

    #[test]
    fn test_meetings_sum_quantity_not_rows() {
        let activities = vec![
            activity_model(1, ActivityType::Meeting, date(2), Some(3)),
            activity_model(2, ActivityType::Meeting, date(3), None),
            activity_model(3, ActivityType::Meeting, date(4), Some(0)),
            activity_model(4, ActivityType::Proposal, date(5), Some(2)),
            activity_model(5, ActivityType::Proposal, date(6), None),
        ];

        let totals = commercial_totals(&activities, &[], &window(date(1), date(31)));

        assert_eq!(totals.meetings, 4);
        assert_eq!(totals.proposals, 3);
        assert_eq!(totals.closed_deals, 0);
    }

    #[test]
    fn test_closed_deals_count_rows_inside_window() {
        let deals = vec![
            deal_model(1, date(1), Decimal::new(100, 0)),
            deal_model(2, date(10), Decimal::new(250, 0)),
            deal_model(3, date(11), Decimal::new(900, 0)),
        ];
        let activities = vec![activity_model(1, ActivityType::Meeting, date(11), Some(5))];

        let totals = commercial_totals(&activities, &deals, &window(date(1), date(10)));

        assert_eq!(totals.closed_deals, 2);
        assert_eq!(totals.deal_revenue, Decimal::new(350, 0));
        assert_eq!(totals.meetings, 0);
    }
}
