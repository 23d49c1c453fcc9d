use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `created_at` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    /// `[start 00:00:00, end 23:59:59]`.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(end_of_day()),
        }
    }

    pub fn for_day(day: NaiveDate) -> Self {
        Self::between(day, day)
    }

    /// The seven calendar days ending on `last_day`.
    pub fn week_ending(last_day: NaiveDate) -> Self {
        let first_day = last_day.checked_sub_days(Days::new(6)).unwrap_or(NaiveDate::MIN);
        Self::between(first_day, last_day)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Parses an ISO `YYYY-MM-DD` calendar date supplied as request parameter `field`.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| AppError::InvalidDate {
        field,
        value: raw.to_owned(),
    })
}
