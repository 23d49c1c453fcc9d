use std::sync::Arc;

use chrono::NaiveDate;

use crate::{
    db::ReportStore,
    domain::{DateWindow, ReportEvent, ReportFilter, ReportSummary, StatisticsChannels},
    errors::AppError,
};

mod statistics;

/// Share of `matched` in `total`, in percent. Zero whenever there is nothing
/// to divide by.
pub fn percentage(matched: i64, total: i64) -> f64 {
    if matched == 0 || total <= 0 {
        return 0.0;
    }
    matched as f64 * 100.0 / total as f64
}

/// Turns report queries into summaries of matched rows against the whole table.
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn ReportStore>,
    channels: StatisticsChannels,
}

impl ReportingService {
    pub fn new(store: Arc<dyn ReportStore>, channels: StatisticsChannels) -> Self {
        Self { store, channels }
    }

    pub async fn all_reports(&self) -> Result<ReportSummary, AppError> {
        let filter = ReportFilter::all();
        let (reports, total_count) = tokio::try_join!(
            self.store.list_reports(&filter),
            self.store.count_reports(&filter),
        )?;
        let matched_count = reports.len() as i64;
        Ok(build_summary(matched_count, total_count, reports))
    }

    /// A missing id is an empty summary, not an error.
    pub async fn report_by_id(&self, id: i64) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::by_id(id)).await
    }

    pub async fn reports_by_channel(&self, channel: &str) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::by_channel(channel)).await
    }

    pub async fn reports_by_date(&self, day: NaiveDate) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::created_within(DateWindow::for_day(day)))
            .await
    }

    pub async fn reports_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::created_within(DateWindow::between(start, end)))
            .await
    }

    pub async fn reports_by_error(&self, text: &str) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::error_containing(text)).await
    }

    pub async fn reports_by_success(&self, text: &str) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::error_equal_to(text)).await
    }

    pub async fn reports_by_payload(&self, text: &str) -> Result<ReportSummary, AppError> {
        self.summarize(ReportFilter::payload_containing(text)).await
    }

    async fn summarize(&self, filter: ReportFilter) -> Result<ReportSummary, AppError> {
        let everything = ReportFilter::all();
        let (reports, matched_count, total_count) = tokio::try_join!(
            self.store.list_reports(&filter),
            self.store.count_reports(&filter),
            self.store.count_reports(&everything),
        )?;
        tracing::debug!(?filter, matched_count, total_count, "report query summarized");
        Ok(build_summary(matched_count, total_count, reports))
    }
}

fn build_summary(matched_count: i64, total_count: i64, reports: Vec<ReportEvent>) -> ReportSummary {
    ReportSummary {
        matched_count,
        total_count,
        matched_percentage: percentage(matched_count, total_count),
        reports,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::domain::{
        ReportEvent, DEFAULT_PROPERTY_CHANNEL, DEFAULT_PROPERTY_DLQ_CHANNEL,
        DEFAULT_RESIDENT_CHANNEL, DEFAULT_RESIDENT_DLQ_CHANNEL,
    };

    pub fn at(day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, day)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    pub fn event(id: i64, channel: &str, error: Option<&str>, created_at: NaiveDateTime) -> ReportEvent {
        ReportEvent {
            id,
            channel_name: channel.to_owned(),
            event_payload: format!("{{\"propertyId\":{id}}}"),
            error_body: error.map(ToOwned::to_owned),
            created_at,
        }
    }

    /// Ten events between 2024-04-04 and 2024-04-10: three errors, two
    /// successes, and one event outside that week on 2024-04-01.
    pub fn week_of_events() -> Vec<ReportEvent> {
        vec![
            event(1, DEFAULT_PROPERTY_CHANNEL, Some("success"), at(4, 0, 0, 0)),
            event(2, DEFAULT_PROPERTY_CHANNEL, Some("Connection ERROR"), at(5, 9, 30, 0)),
            event(3, DEFAULT_RESIDENT_CHANNEL, Some("success"), at(6, 10, 0, 0)),
            event(4, DEFAULT_RESIDENT_CHANNEL, None, at(6, 11, 0, 0)),
            event(5, DEFAULT_PROPERTY_DLQ_CHANNEL, Some("mapping error: id"), at(7, 12, 0, 0)),
            event(6, DEFAULT_RESIDENT_DLQ_CHANNEL, Some("error"), at(8, 13, 0, 0)),
            event(7, "mch-other:sms-other", Some(""), at(8, 14, 0, 0)),
            event(8, DEFAULT_PROPERTY_CHANNEL, Some("Success"), at(9, 15, 0, 0)),
            event(9, DEFAULT_PROPERTY_CHANNEL, None, at(10, 16, 0, 0)),
            event(10, "MCH-PROPERTY-SYNCH:SMS-PROPERTY", None, at(10, 23, 59, 59)),
            event(11, DEFAULT_PROPERTY_CHANNEL, Some("error"), at(1, 8, 0, 0)),
        ]
    }
}
