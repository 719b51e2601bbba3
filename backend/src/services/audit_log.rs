use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::{
    db::{Store, StoreError},
    models::{audit_log::RequestLog, PageWindow},
    repositories::audit_log::{self as audit_repo, RequestLogFilters},
    utils::time::{day_bucket_name, today_local},
};

/// Appends and lists the per-day audit trail. Days are calendar days in the
/// configured time zone.
#[derive(Clone, Debug)]
pub struct AuditLogService {
    store: Store,
    time_zone: Tz,
}

impl AuditLogService {
    pub fn new(store: Store, time_zone: Tz) -> Self {
        Self { store, time_zone }
    }

    pub async fn record(&self, entry: &RequestLog) -> Result<(), StoreError> {
        let day = day_bucket_name(today_local(&self.time_zone));
        audit_repo::append_request_log(&self.store, &day, entry).await
    }

    pub async fn list(
        &self,
        date: NaiveDate,
        filters: RequestLogFilters<'_>,
        window: PageWindow,
    ) -> Result<Vec<RequestLog>, StoreError> {
        let day = day_bucket_name(date);
        audit_repo::list_request_logs(&self.store, &day, filters, window).await
    }
}
