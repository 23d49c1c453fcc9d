use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    db::ReportStore,
    domain::{ReportEvent, ReportFilter},
    errors::AppError,
};

/// In-process store seeded once at construction; nothing mutates it afterwards.
#[derive(Clone, Default)]
pub struct MemoryReportStore {
    events: Arc<Vec<ReportEvent>>,
}

impl MemoryReportStore {
    pub fn with_events(events: impl IntoIterator<Item = ReportEvent>) -> Self {
        let mut events: Vec<ReportEvent> = events.into_iter().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Self {
            events: Arc::new(events),
        }
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<ReportEvent>, AppError> {
        let events = self
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        Ok(events)
    }

    async fn count_reports(&self, filter: &ReportFilter) -> Result<i64, AppError> {
        let count = self
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .count();
        Ok(count as i64)
    }

    async fn most_recent(&self) -> Result<Option<ReportEvent>, AppError> {
        Ok(self.events.first().cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn event(id: i64, day: u32) -> ReportEvent {
        ReportEvent {
            id,
            channel_name: "c".to_owned(),
            event_payload: String::new(),
            error_body: None,
            created_at: NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = MemoryReportStore::with_events([event(1, 3), event(2, 9), event(3, 5)]);
        let ids: Vec<i64> = store
            .list_reports(&ReportFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|event| event.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(store.most_recent().await.unwrap().unwrap().id, 2);
    }

    #[tokio::test]
    async fn empty_store_has_no_most_recent() {
        let store = MemoryReportStore::default();
        assert!(store.most_recent().await.unwrap().is_none());
        assert_eq!(store.count_reports(&ReportFilter::all()).await.unwrap(), 0);
    }
}
