use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

mod window;

pub use window::{parse_date, DateWindow};

pub const DEFAULT_PROPERTY_CHANNEL: &str = "mch-property-synch:sms-property";
pub const DEFAULT_RESIDENT_CHANNEL: &str = "mch-resident-synch:sms-resident";
pub const DEFAULT_PROPERTY_DLQ_CHANNEL: &str = "mch-property-synch.sms-property.DLQ";
pub const DEFAULT_RESIDENT_DLQ_CHANNEL: &str = "mch-resident-synch.sms-resident.DLQ";

/// Error text substring that marks a failed event in statistics.
pub const ERROR_MARKER: &str = "error";
/// Exact error text recorded for a successful event.
pub const SUCCESS_MARKER: &str = "success";

/// One message that passed through an integration channel. Rows are written
/// by the event pipeline and only ever read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvent {
    pub id: i64,
    pub channel_name: String,
    pub event_payload: String,
    pub error_body: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Conjunction of optional predicates over report events. The default
/// filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub id: Option<i64>,
    /// Case-insensitive exact match.
    pub channel: Option<String>,
    pub window: Option<DateWindow>,
    /// Case-insensitive substring match.
    pub error_contains: Option<String>,
    /// Case-sensitive exact match.
    pub error_equals: Option<String>,
    /// Case-insensitive substring match.
    pub payload_contains: Option<String>,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Self::default()
        }
    }

    pub fn created_within(window: DateWindow) -> Self {
        Self {
            window: Some(window),
            ..Self::default()
        }
    }

    pub fn error_containing(text: impl Into<String>) -> Self {
        Self {
            error_contains: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error_equal_to(text: impl Into<String>) -> Self {
        Self {
            error_equals: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn payload_containing(text: impl Into<String>) -> Self {
        Self {
            payload_contains: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// In-process evaluation of the filter, mirroring the SQL predicates.
    pub fn matches(&self, event: &ReportEvent) -> bool {
        if self.id.is_some_and(|id| id != event.id) {
            return false;
        }
        if let Some(channel) = &self.channel {
            if event.channel_name.to_lowercase() != channel.to_lowercase() {
                return false;
            }
        }
        if let Some(window) = &self.window {
            if !window.contains(event.created_at) {
                return false;
            }
        }
        if let Some(needle) = &self.error_contains {
            match &event.error_body {
                Some(body) if contains_ignore_case(body, needle) => {}
                _ => return false,
            }
        }
        if let Some(expected) = &self.error_equals {
            if event.error_body.as_deref() != Some(expected.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &self.payload_contains {
            if !contains_ignore_case(&event.event_payload, needle) {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records matched by a query together with how much of the store they cover.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    #[serde(rename = "totalQueryCount")]
    pub matched_count: i64,
    #[serde(rename = "totalItemsCount")]
    pub total_count: i64,
    #[serde(rename = "percentageCount")]
    pub matched_percentage: f64,
    #[serde(rename = "reportEntities")]
    pub reports: Vec<ReportEvent>,
}

/// Category counts over one window. Categories may overlap, so the counts
/// need not add up to the total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub total_items_count: i64,
    pub total_errors_count: i64,
    pub total_success_count: i64,
    pub total_property_count: i64,
    pub total_resident_count: i64,
    pub total_property_dlq_count: i64,
    pub total_resident_dlq_count: i64,
    pub percentage_errors_count: f64,
    pub percentage_success_count: f64,
    pub percentage_property_count: f64,
    pub percentage_resident_count: f64,
    pub percentage_property_dlq_count: f64,
    pub percentage_resident_dlq_count: f64,
}

/// Channel names counted by the statistics endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StatisticsChannels {
    pub property: String,
    pub resident: String,
    pub property_dlq: String,
    pub resident_dlq: String,
}

impl Default for StatisticsChannels {
    fn default() -> Self {
        Self {
            property: DEFAULT_PROPERTY_CHANNEL.to_owned(),
            resident: DEFAULT_RESIDENT_CHANNEL.to_owned(),
            property_dlq: DEFAULT_PROPERTY_DLQ_CHANNEL.to_owned(),
            resident_dlq: DEFAULT_RESIDENT_DLQ_CHANNEL.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn event(channel: &str, payload: &str, error: Option<&str>) -> ReportEvent {
        ReportEvent {
            id: 7,
            channel_name: channel.to_owned(),
            event_payload: payload.to_owned(),
            error_body: error.map(ToOwned::to_owned),
            created_at: NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ReportFilter::all().matches(&event("a", "", None)));
    }

    #[test]
    fn channel_match_ignores_case_but_not_substrings() {
        let row = event("MCH-Property-Synch:SMS-Property", "", None);
        assert!(ReportFilter::by_channel(DEFAULT_PROPERTY_CHANNEL).matches(&row));
        assert!(!ReportFilter::by_channel("mch-property").matches(&row));
    }

    #[test]
    fn error_contains_skips_rows_without_error_text() {
        let filter = ReportFilter::error_containing("ERROR");
        assert!(filter.matches(&event("a", "", Some("Timeout error on send"))));
        assert!(!filter.matches(&event("a", "", None)));
    }

    #[test]
    fn error_equals_is_case_sensitive() {
        let filter = ReportFilter::error_equal_to(SUCCESS_MARKER);
        assert!(filter.matches(&event("a", "", Some("success"))));
        assert!(!filter.matches(&event("a", "", Some("Success"))));
    }

    #[test]
    fn predicates_combine_with_and() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let filter = ReportFilter::by_channel("a").within(DateWindow::for_day(day));
        assert!(filter.matches(&event("A", "", None)));

        let other_day = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let filter = ReportFilter::by_channel("a").within(DateWindow::for_day(other_day));
        assert!(!filter.matches(&event("A", "", None)));
    }

    #[test]
    fn summary_serializes_with_wire_names() {
        let summary = ReportSummary {
            matched_count: 1,
            total_count: 4,
            matched_percentage: 25.0,
            reports: vec![event("a", "{}", None)],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["totalQueryCount"], 1);
        assert_eq!(value["totalItemsCount"], 4);
        assert_eq!(value["percentageCount"], 25.0);
        assert_eq!(value["reportEntities"][0]["channelName"], "a");
        assert_eq!(value["reportEntities"][0]["createdAt"], "2024-03-05T12:00:00");
    }

    #[test]
    fn statistics_channels_fill_missing_keys_with_defaults() {
        let channels: StatisticsChannels =
            serde_json::from_str(r#"{"property":"custom-property"}"#).unwrap();
        assert_eq!(channels.property, "custom-property");
        assert_eq!(channels.resident, DEFAULT_RESIDENT_CHANNEL);
        assert_eq!(channels.resident_dlq, DEFAULT_RESIDENT_DLQ_CHANNEL);
    }
}
