//! Durable trail of admin and moderation actions.
//!
//! Recording is deliberately infallible from the caller's perspective: an
//! action that succeeded is not rolled back because its log line failed.

use tracing::warn;

use crate::db::Store;

#[derive(Clone)]
pub struct AuditService {
    store: Store,
}

impl AuditService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn record(&self, event_type: &str, message: &str, details: Option<String>) {
        if let Err(e) = self
            .store
            .add_audit_log(event_type, "info", message, details)
            .await
        {
            warn!(event_type = %event_type, "Failed to write audit log entry: {e}");
        }
    }

    pub async fn record_warn(&self, event_type: &str, message: &str, details: Option<String>) {
        if let Err(e) = self
            .store
            .add_audit_log(event_type, "warn", message, details)
            .await
        {
            warn!(event_type = %event_type, "Failed to write audit log entry: {e}");
        }
    }

    pub async fn prune(&self, older_than_days: i64) -> anyhow::Result<u64> {
        self.store.prune_audit_logs(older_than_days).await
    }
}
