//! In-memory store implementation.
//!
//! Backs development, demos, and the integration tests. Concurrent access
//! goes through `DashMap`; the audit log is an ordered append-only vector.
//! Failure-injection knobs let tests exercise the pipeline's error paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::security::rbac::{Identity, Role, SessionResolver};
use crate::store::entities::*;
use crate::store::{Database, StoreError};

/// DashMap-backed `Database`.
#[derive(Default)]
pub struct MemoryDatabase {
    accounts: DashMap<Uuid, Account>,
    glosas: DashMap<Uuid, Glosa>,
    memberships: DashMap<Uuid, Membership>,
    subscriptions: DashMap<String, PushSubscription>,
    audit_log: RwLock<Vec<AuditEntry>>,
    fail_pings: AtomicBool,
    fail_queries: AtomicBool,
    audit_table_missing: AtomicBool,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user's membership (seeding only).
    pub fn add_membership(&self, user_id: Uuid, organization_id: Uuid, role: Role) {
        self.memberships.insert(
            user_id,
            Membership {
                organization_id,
                role,
            },
        );
    }

    /// Insert an account directly (seeding only).
    pub fn add_account(&self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    /// Insert a glosa directly (seeding only).
    pub fn add_glosa(&self, glosa: Glosa) {
        self.glosas.insert(glosa.id, glosa);
    }

    /// Make `ping` fail, simulating an unreachable database.
    pub fn set_ping_failure(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }

    /// Make every query fail, simulating a store outage.
    pub fn set_query_failure(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Simulate an unprovisioned audit table (first-run environments).
    pub fn set_audit_table_missing(&self, missing: bool) {
        self.audit_table_missing.store(missing, Ordering::SeqCst);
    }

    /// Number of stored audit entries (test observability).
    pub fn audit_entry_count(&self) -> usize {
        self.audit_log.read().map(|log| log.len()).unwrap_or(0)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("injected store failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_pings.load(Ordering::SeqCst) || self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ping failed".into()));
        }
        Ok(())
    }

    async fn membership(&self, user_id: Uuid) -> Result<Option<Membership>, StoreError> {
        self.check_available()?;
        Ok(self.memberships.get(&user_id).map(|m| m.value().clone()))
    }

    async fn list_accounts(
        &self,
        organization_id: Uuid,
        filter: &AccountFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Account>, u64), StoreError> {
        self.check_available()?;
        let mut rows: Vec<Account> = self
            .accounts
            .iter()
            .filter(|a| a.organization_id == organization_id)
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .map(|a| a.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as u64;
        let page: Vec<Account> = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_account(&self, account: Account) -> Result<Account, StoreError> {
        self.check_available()?;
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account_status(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
        status: AccountStatus,
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut changed = 0;
        for id in ids {
            if let Some(mut account) = self.accounts.get_mut(id) {
                if account.organization_id == organization_id {
                    account.status = status;
                    account.updated_at = Utc::now();
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn delete_accounts(
        &self,
        organization_id: Uuid,
        ids: &[Uuid],
    ) -> Result<u64, StoreError> {
        self.check_available()?;
        let mut removed = 0;
        for id in ids {
            let owned = self
                .accounts
                .get(id)
                .map(|a| a.organization_id == organization_id)
                .unwrap_or(false);
            if owned && self.accounts.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn list_glosas(
        &self,
        organization_id: Uuid,
        filter: &GlosaFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<Glosa>, u64), StoreError> {
        self.check_available()?;
        let mut rows: Vec<Glosa> = self
            .glosas
            .iter()
            .filter(|g| g.organization_id == organization_id)
            .filter(|g| filter.status.map_or(true, |s| g.status == s))
            .map(|g| g.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = rows.len() as u64;
        let page: Vec<Glosa> = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_glosa(&self, glosa: Glosa) -> Result<Glosa, StoreError> {
        self.check_available()?;
        self.glosas.insert(glosa.id, glosa.clone());
        Ok(glosa)
    }

    async fn account_stats(&self, organization_id: Uuid) -> Result<AccountStats, StoreError> {
        self.check_available()?;
        let mut stats = AccountStats::default();
        for account in self.accounts.iter() {
            if account.organization_id != organization_id {
                continue;
            }
            stats.total += 1;
            stats.amount_cents_total += account.amount_cents;
            match account.status {
                AccountStatus::Pending => stats.pending += 1,
                AccountStatus::UnderReview => stats.under_review += 1,
                AccountStatus::Denied => stats.denied += 1,
                AccountStatus::Paid => stats.paid += 1,
            }
        }
        Ok(stats)
    }

    async fn glosa_stats(&self, organization_id: Uuid) -> Result<GlosaStats, StoreError> {
        self.check_available()?;
        let mut stats = GlosaStats::default();
        for glosa in self.glosas.iter() {
            if glosa.organization_id != organization_id {
                continue;
            }
            stats.total += 1;
            stats.amount_cents_total += glosa.amount_cents;
            match glosa.status {
                GlosaStatus::Open => stats.open += 1,
                GlosaStatus::Appealed => stats.appealed += 1,
                GlosaStatus::Resolved => stats.resolved += 1,
            }
        }
        Ok(stats)
    }

    async fn insert_audit_entry(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.check_available()?;
        if self.audit_table_missing.load(Ordering::SeqCst) {
            return Err(StoreError::MissingTable("audit_log"));
        }
        let mut log = self
            .audit_log
            .write()
            .map_err(|_| StoreError::Query("audit log lock poisoned".into()))?;
        log.push(entry);
        Ok(())
    }

    async fn list_audit_entries(
        &self,
        organization_id: Uuid,
        filter: &AuditFilter,
        offset: u64,
        limit: u64,
    ) -> Result<(Vec<AuditEntry>, u64), StoreError> {
        self.check_available()?;
        let log = self
            .audit_log
            .read()
            .map_err(|_| StoreError::Query("audit log lock poisoned".into()))?;
        let mut rows: Vec<AuditEntry> = log
            .iter()
            .filter(|e| e.organization_id == Some(organization_id))
            .filter(|e| filter.action.as_deref().map_or(true, |a| e.action == a))
            .filter(|e| filter.resource.as_deref().map_or(true, |r| e.resource == r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = rows.len() as u64;
        let page: Vec<AuditEntry> = rows
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn save_push_subscription(&self, sub: PushSubscription) -> Result<(), StoreError> {
        self.check_available()?;
        self.subscriptions.insert(sub.endpoint.clone(), sub);
        Ok(())
    }

    async fn delete_push_subscription(
        &self,
        organization_id: Uuid,
        endpoint: &str,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let owned = self
            .subscriptions
            .get(endpoint)
            .map(|s| s.organization_id == organization_id)
            .unwrap_or(false);
        if owned {
            Ok(self.subscriptions.remove(endpoint).is_some())
        } else {
            Ok(false)
        }
    }

    async fn list_push_subscriptions(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<PushSubscription>, StoreError> {
        self.check_available()?;
        Ok(self
            .subscriptions
            .iter()
            .filter(|s| s.organization_id == organization_id)
            .map(|s| s.value().clone())
            .collect())
    }
}

/// Token-to-identity map standing in for the external auth collaborator.
#[derive(Default)]
pub struct MemorySessions {
    tokens: DashMap<String, Identity>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, token: &str, identity: Identity) {
        self.tokens.insert(token.to_string(), identity);
    }
}

#[async_trait]
impl SessionResolver for MemorySessions {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.tokens.get(token).map(|i| i.value().clone()))
    }
}

/// Tokens produced by [`seed_demo`].
pub struct DemoSeed {
    pub organization_id: Uuid,
    pub admin_token: String,
    pub operator_token: String,
    pub viewer_token: String,
}

/// Seed one organization with a user per role and a few records.
/// Development convenience, gated by `dev.seed_demo_data`.
pub fn seed_demo(db: &MemoryDatabase, sessions: &MemorySessions) -> DemoSeed {
    let organization_id = Uuid::new_v4();

    let register = |role: Role, label: &str| {
        let user_id = Uuid::new_v4();
        let token = format!("dev-{}-{}", label, Uuid::new_v4());
        sessions.register(
            &token,
            Identity {
                user_id,
                email: format!("{}@hospital.example", label),
            },
        );
        db.add_membership(user_id, organization_id, role);
        token
    };

    let admin_token = register(Role::Admin, "admin");
    let operator_token = register(Role::Operator, "operator");
    let viewer_token = register(Role::Viewer, "viewer");

    let now = Utc::now();
    let account_id = Uuid::new_v4();
    db.add_account(Account {
        id: account_id,
        organization_id,
        patient_name: "Maria Souza".into(),
        patient_cpf: Some("123.456.789-01".into()),
        insurer: "Unimed".into(),
        amount_cents: 128_500,
        status: AccountStatus::UnderReview,
        created_at: now,
        updated_at: now,
    });
    db.add_glosa(Glosa {
        id: Uuid::new_v4(),
        organization_id,
        account_id,
        code: "1705".into(),
        reason: "Cobrança em duplicidade".into(),
        amount_cents: 12_000,
        status: GlosaStatus::Open,
        created_at: now,
    });

    DemoSeed {
        organization_id,
        admin_token,
        operator_token,
        viewer_token,
    }
}
