use chrono::NaiveDate;

use super::{percentage, ReportingService};
use crate::{
    domain::{DateWindow, ReportFilter, StatisticsSummary, ERROR_MARKER, SUCCESS_MARKER},
    errors::AppError,
};

impl ReportingService {
    /// Statistics for the seven days ending on the date of the newest event.
    /// An empty table yields an all-zero summary.
    pub async fn last_week_statistics(&self) -> Result<StatisticsSummary, AppError> {
        let Some(latest) = self.store.most_recent().await? else {
            tracing::debug!("no report events recorded, returning empty statistics");
            return Ok(StatisticsSummary::default());
        };

        let window = DateWindow::week_ending(latest.created_at.date());
        self.statistics_for_window(window).await
    }

    pub async fn statistics_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StatisticsSummary, AppError> {
        self.statistics_for_window(DateWindow::between(start, end))
            .await
    }

    /// Runs the seven window counts concurrently. Any failing count fails the
    /// whole summary.
    pub async fn statistics_for_window(
        &self,
        window: DateWindow,
    ) -> Result<StatisticsSummary, AppError> {
        let channels = &self.channels;
        let total = ReportFilter::created_within(window);
        let errors = ReportFilter::error_containing(ERROR_MARKER).within(window);
        let success = ReportFilter::error_equal_to(SUCCESS_MARKER).within(window);
        let property = ReportFilter::by_channel(&channels.property).within(window);
        let resident = ReportFilter::by_channel(&channels.resident).within(window);
        let property_dlq = ReportFilter::by_channel(&channels.property_dlq).within(window);
        let resident_dlq = ReportFilter::by_channel(&channels.resident_dlq).within(window);

        let (total, errors, success, property, resident, property_dlq, resident_dlq) = tokio::try_join!(
            self.store.count_reports(&total),
            self.store.count_reports(&errors),
            self.store.count_reports(&success),
            self.store.count_reports(&property),
            self.store.count_reports(&resident),
            self.store.count_reports(&property_dlq),
            self.store.count_reports(&resident_dlq),
        )?;

        tracing::debug!(
            start = %window.start,
            end = %window.end,
            total,
            errors,
            success,
            "statistics window counted"
        );

        Ok(StatisticsSummary {
            total_items_count: total,
            total_errors_count: errors,
            total_success_count: success,
            total_property_count: property,
            total_resident_count: resident,
            total_property_dlq_count: property_dlq,
            total_resident_dlq_count: resident_dlq,
            percentage_errors_count: percentage(errors, total),
            percentage_success_count: percentage(success, total),
            percentage_property_count: percentage(property, total),
            percentage_resident_count: percentage(resident, total),
            percentage_property_dlq_count: percentage(property_dlq, total),
            percentage_resident_dlq_count: percentage(resident_dlq, total),
        })
    }
}
