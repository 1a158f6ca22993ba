use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Rejected date window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("window start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// An inclusive `[start, end]` range of calendar days.
///
/// Every dashboard filter (client totals, blended KPIs, chart series) is
/// expressed as one of these. Boundaries are compared as dates, so a record
/// dated exactly on `start` or `end` is inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateWindow {
    /// First day of the window (YYYY-MM-DD)
    pub start: NaiveDate,
    /// Last day of the window (YYYY-MM-DD)
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending on `end`, e.g. the dashboard's default "last 30 days".
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day of the window in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn boundaries_are_inclusive() {
        let window = DateWindow::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        assert!(window.contains(date(2024, 3, 1)));
        assert!(window.contains(date(2024, 3, 31)));
        assert!(!window.contains(date(2024, 2, 29)));
        assert!(!window.contains(date(2024, 4, 1)));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = DateWindow::new(date(2024, 3, 2), date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, WindowError::Inverted { .. }));
    }

    #[test]
    fn trailing_window_counts_the_end_day() {
        let window = DateWindow::trailing(date(2024, 1, 30), 30);
        assert_eq!(window.start, date(2024, 1, 1));
        assert_eq!(window.len_days(), 30);
        assert_eq!(window.days().count(), 30);
    }

    #[test]
    fn single_day_window() {
        let day = date(2024, 12, 31);
        let window = DateWindow::new(day, day).unwrap();
        assert_eq!(window.days().collect::<Vec<_>>(), vec![day]);
    }
}
