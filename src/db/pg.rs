use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    db::ReportStore,
    domain::{ReportEvent, ReportFilter},
    errors::AppError,
};

const REPORT_COLUMNS: &str = "id, channel_name, event_payload, error_body, created_at";
const REPORT_TABLE: &str = "test_support.report_event";

#[derive(Clone)]
pub struct PgReportStore {
    pool: PgPool,
}

impl PgReportStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        Ok(Self::new(super::connect(database_url, max_connections).await?))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Appends `WHERE` predicates for every populated filter field. Substring
/// matches use `strpos` so `%` and `_` in user text stay literal.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReportFilter) {
    builder.push(" WHERE TRUE");
    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(channel) = &filter.channel {
        builder
            .push(" AND LOWER(channel_name) = LOWER(")
            .push_bind(channel.clone())
            .push(")");
    }
    if let Some(window) = &filter.window {
        builder
            .push(" AND created_at BETWEEN ")
            .push_bind(window.start)
            .push(" AND ")
            .push_bind(window.end);
    }
    if let Some(needle) = &filter.error_contains {
        builder
            .push(" AND STRPOS(LOWER(error_body), LOWER(")
            .push_bind(needle.clone())
            .push(")) > 0");
    }
    if let Some(expected) = &filter.error_equals {
        builder
            .push(" AND error_body = ")
            .push_bind(expected.clone());
    }
    if let Some(needle) = &filter.payload_contains {
        builder
            .push(" AND STRPOS(LOWER(event_payload), LOWER(")
            .push_bind(needle.clone())
            .push(")) > 0");
    }
}

#[async_trait]
impl ReportStore for PgReportStore {
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportEvent>, AppError> {
        let mut builder = QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM {REPORT_TABLE}"));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let reports = builder
            .build_query_as::<ReportEvent>()
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    async fn count_reports(&self, filter: &ReportFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {REPORT_TABLE}"));
        push_filter(&mut builder, filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn most_recent(&self) -> Result<Option<ReportEvent>, AppError> {
        let report = sqlx::query_as::<_, ReportEvent>(&format!(
            "SELECT {REPORT_COLUMNS} FROM {REPORT_TABLE} ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::DateWindow;

    fn rendered(filter: &ReportFilter) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM t");
        push_filter(&mut builder, filter);
        builder.sql().to_owned()
    }

    #[test]
    fn empty_filter_has_no_predicates() {
        assert_eq!(rendered(&ReportFilter::all()), "SELECT COUNT(*) FROM t WHERE TRUE");
    }

    #[test]
    fn windowed_channel_filter_binds_in_order() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let filter = ReportFilter::by_channel("x").within(DateWindow::for_day(day));
        assert_eq!(
            rendered(&filter),
            "SELECT COUNT(*) FROM t WHERE TRUE AND LOWER(channel_name) = LOWER($1) \
             AND created_at BETWEEN $2 AND $3"
        );
    }

    #[test]
    fn substring_filters_use_strpos() {
        let filter = ReportFilter {
            error_contains: Some("error".into()),
            payload_contains: Some("50%".into()),
            ..ReportFilter::default()
        };
        assert_eq!(
            rendered(&filter),
            "SELECT COUNT(*) FROM t WHERE TRUE AND STRPOS(LOWER(error_body), LOWER($1)) > 0 \
             AND STRPOS(LOWER(event_payload), LOWER($2)) > 0"
        );
    }
}
