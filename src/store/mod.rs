//! Persistence collaborator.
//!
//! # Data Flow
//! ```text
//! handler (with AuthContext)
//!     → Database trait (every verb takes the tenant's organization_id)
//!     → backing store (in-memory here; relational in production)
//! ```
//!
//! # Design Decisions
//! - The trait is the tenant boundary: no verb exists that reads across
//!   organizations, so handlers cannot leak cross-tenant data by accident
//! - Writes rely on the store's per-statement atomicity; no transactions
//!   span multiple statements
//! - `MissingTable` is distinguished from other failures so the audit
//!   writer can treat an unprovisioned audit table as a soft no-op

pub mod entities;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::audit::AuditEntry;
pub use entities::{
    Account, AccountFilter, AccountStats, AccountStatus, AuditFilter, DashboardStats, Glosa,
    GlosaFilter, GlosaStats, GlosaStatus, Membership, PushKeys, PushSubscription,
};
pub use memory::MemoryDatabase;

/// Errors from the persistence collaborator.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A table the query needs has not been provisioned.
    #[error("table not provisioned: {0}")]
    MissingTable(&'static str),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected or failed the statement.
    #[error("query failed: {0}")]
    Query(String),
}

/// Tenant-scoped persistence verbs.
#[async_trait]
pub trait Database: Send + Sync {
    /// Cheap connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Resolve a user's organization membership and role.
    async fn membership(&self, user_id: Uuid) -> Result<Option<Membership>, StoreError>;

    async fn list_accounts(
        &self,
        organization_id: Uuid,
        filter: &AccountFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Account>, u64), StoreError>;

    async fn insert_account(&self, account: Account) -> Result<Account, StoreError>;

    /// Set `status` on the given ids within one organization.
    /// Returns how many rows changed.
    async fn update_account_status(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
        status: AccountStatus,
    ) -> Result<u64, StoreError>;

    /// Delete the given ids within one organization. Returns rows removed.
    async fn delete_accounts(&self, organization_id: Uuid, ids: &[Uuid])
        -> Result<u64, StoreError>;

    async fn list_glosas(
        &self,
        organization_id: Uuid,
        filter: &GlosaFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Glosa>, u64), StoreError>;

    async fn insert_glosa(&self, glosa: Glosa) -> Result<Glosa, StoreError>;

    async fn account_stats(&self, organization_id: Uuid) -> Result<AccountStats, StoreError>;

    async fn glosa_stats(&self, organization_id: Uuid) -> Result<GlosaStats, StoreError>;

    /// Append-only audit write. Entries are never updated or deleted.
    async fn insert_audit_entry(&self, entry: AuditEntry) -> Result<(), StoreError>;

    async fn list_audit_entries(
        &self,
        organization_id: Uuid,
        filter: &AuditFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditEntry>, u64), StoreError>;

    /// Upsert a push subscription keyed by endpoint.
    async fn save_push_subscription(&self, sub: PushSubscription) -> Result<(), StoreError>;

    /// Remove a subscription by endpoint. Returns whether one existed.
    async fn delete_push_subscription(
        &self,
        organization_id: Uuid,
        endpoint: &str,
    ) -> Result<bool, StoreError>;

    async fn list_push_subscriptions(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<PushSubscription>, StoreError>;
}
