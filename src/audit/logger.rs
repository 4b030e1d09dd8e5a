//! Fire-and-forget audit writer.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::audit::AuditEntry;
use crate::observability::metrics;
use crate::store::{Database, StoreError};

/// Handle for recording audit entries. Cheap to clone; all clones feed the
/// same detached writer task.
#[derive(Clone)]
pub struct AuditLogger {
    tx: Option<mpsc::UnboundedSender<AuditEntry>>,
}

impl AuditLogger {
    /// Spawn the writer task and return a recording handle.
    pub fn spawn(db: Arc<dyn Database>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(writer_loop(db, rx));
        Self { tx: Some(tx) }
    }

    /// A logger that drops everything (audit disabled by config).
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Record a mutating action. Never blocks, never fails the caller.
    pub fn record(&self, entry: AuditEntry) {
        self.enqueue(entry);
    }

    /// Record a read / PII access. Never blocks, never fails the caller.
    pub fn record_read(&self, entry: AuditEntry) {
        self.enqueue(entry);
    }

    fn enqueue(&self, entry: AuditEntry) {
        let Some(tx) = &self.tx else { return };
        if tx.send(entry).is_err() {
            tracing::warn!("audit writer gone, dropping entry");
            metrics::record_audit_dropped();
        }
    }
}

async fn writer_loop(db: Arc<dyn Database>, mut rx: mpsc::UnboundedReceiver<AuditEntry>) {
    while let Some(entry) = rx.recv().await {
        match db.insert_audit_entry(entry).await {
            Ok(()) => {}
            // First-run tolerance: no audit schema yet, silently skip.
            Err(StoreError::MissingTable(table)) => {
                tracing::debug!(table = table, "audit table not provisioned, entry skipped");
            }
            Err(err) => {
                tracing::warn!(error = %err, "audit write failed, entry dropped");
                metrics::record_audit_dropped();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatabase;
    use std::time::Duration;

    #[tokio::test]
    async fn entries_reach_the_store() {
        let db = Arc::new(MemoryDatabase::new());
        let logger = AuditLogger::spawn(db.clone());
        logger.record(AuditEntry::system("accounts.create", "accounts"));
        logger.record_read(AuditEntry::system("accounts.read", "accounts"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(db.audit_entry_count(), 2);
    }

    #[tokio::test]
    async fn missing_table_is_a_soft_noop() {
        let db = Arc::new(MemoryDatabase::new());
        db.set_audit_table_missing(true);
        let logger = AuditLogger::spawn(db.clone());
        logger.record(AuditEntry::system("accounts.create", "accounts"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(db.audit_entry_count(), 0);
    }

    #[tokio::test]
    async fn disabled_logger_accepts_entries_quietly() {
        let logger = AuditLogger::disabled();
        logger.record(AuditEntry::system("accounts.create", "accounts"));
        logger.record_read(AuditEntry::system("accounts.read", "accounts"));
    }
}
