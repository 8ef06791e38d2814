use super::{ServiceError, ServiceResult};
use crate::{clients::relational::RelationalClient, models::access_log::AccessLogEntry};
use tracing::debug;

/// Number of rows returned by [`AccessLogService::list`].
pub const RECENT_LOG_LIMIT: i64 = 50;

#[derive(Clone)]
pub struct AccessLogService {
    relational: RelationalClient,
}

impl AccessLogService {
    pub fn new(relational: RelationalClient) -> Self {
        Self { relational }
    }

    /// The most recent access-log rows, newest first.
    pub async fn list(&self) -> ServiceResult<Vec<AccessLogEntry>> {
        let mut conn = self.relational.connect().await?;
        let result = conn.recent_access_logs(RECENT_LOG_LIMIT).await;
        let logs = conn.finish(result).await?;

        if logs.is_empty() {
            return Err(ServiceError::NoLogsFound);
        }

        debug!(count = logs.len(), "listed access logs");
        Ok(logs)
    }
}
