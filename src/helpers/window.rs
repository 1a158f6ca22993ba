use chrono::{NaiveDate, Utc};
use common::DateWindow;

use crate::error::ApiError;
use crate::schemas::WindowQuery;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
/// Longest window any endpoint computes, matching the `days` bound.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Helper function to determine the date window from query parameters
pub fn resolve_window(query: &WindowQuery) -> Result<DateWindow, ApiError> {
    resolve_window_at(query, Utc::now().date_naive())
}

/// Same as [`resolve_window`] with an explicit "today".
pub fn resolve_window_at(query: &WindowQuery, today: NaiveDate) -> Result<DateWindow, ApiError> {
    let window = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => {
            DateWindow::new(start, end).map_err(|e| ApiError::Validation(e.to_string()))
        }
        (None, None) => Ok(DateWindow::trailing(
            today,
            query.days.unwrap_or(DEFAULT_WINDOW_DAYS),
        )),
        _ => Err(ApiError::Validation(
            "start_date and end_date must be given together".to_string(),
        )),
    }?;

    if window.len_days() > MAX_WINDOW_DAYS {
        return Err(ApiError::Validation(format!(
            "Date window spans {} days, at most {} are allowed",
            window.len_days(),
            MAX_WINDOW_DAYS
        )));
    }
    Ok(window)
}

/// Cache key for a windowed payload of one tenant.
pub fn cache_key(kind: &str, organization_id: i32, subject: Option<i32>, window: &DateWindow) -> String {
    format!(
        "{}:{}:{}:{}:{}",
        kind,
        organization_id,
        subject.map(|id| id.to_string()).unwrap_or_else(|| "all".to_string()),
        window.start,
        window.end
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, day).unwrap()
    }

    #[test]
    fn test_explicit_window() {
        let query = WindowQuery {
            start_date: Some(date(1)),
            end_date: Some(date(10)),
            days: None,
        };
        let window = resolve_window_at(&query, date(30)).unwrap();
        assert_eq!(window.start, date(1));
        assert_eq!(window.end, date(10));
    }

    #[test]
    fn test_default_window_is_trailing() {
        let window = resolve_window_at(&WindowQuery::default(), date(30)).unwrap();
        assert_eq!(window.end, date(30));
        assert_eq!(window.len_days(), i64::from(DEFAULT_WINDOW_DAYS));
    }

    #[test]
    fn test_half_open_and_inverted_windows_are_rejected() {
        let half = WindowQuery {
            start_date: Some(date(1)),
            ..Default::default()
        };
        assert!(matches!(resolve_window_at(&half, date(30)), Err(ApiError::Validation(_))));

        let inverted = WindowQuery {
            start_date: Some(date(10)),
            end_date: Some(date(1)),
            days: None,
        };
        assert!(matches!(resolve_window_at(&inverted, date(30)), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_window_length_is_capped() {
        let year = |start: NaiveDate, end: NaiveDate| WindowQuery {
            start_date: Some(start),
            end_date: Some(end),
            days: None,
        };
        let leap_year = year(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        assert_eq!(resolve_window_at(&leap_year, date(30)).unwrap().len_days(), MAX_WINDOW_DAYS);

        let everything = year(NaiveDate::MIN, NaiveDate::MAX);
        assert!(matches!(resolve_window_at(&everything, date(30)), Err(ApiError::Validation(_))));

        let one_too_many = year(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        assert!(matches!(resolve_window_at(&one_too_many, date(30)), Err(ApiError::Validation(_))));
    }
}
