//! Domain records persisted by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::rbac::Role;

/// A billing account submitted to an insurer or to SUS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub patient_name: String,
    /// National ID (CPF). Masked on the way out unless the caller holds
    /// the reveal capability.
    pub patient_cpf: Option<String>,
    pub insurer: String,
    pub amount_cents: i64,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a billing account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    UnderReview,
    Denied,
    Paid,
}

/// Filters accepted by the account listing.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub status: Option<AccountStatus>,
}

/// A claim denial (glosa) issued against an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Glosa {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub account_id: Uuid,
    /// Insurer denial code (e.g. TISS table code).
    pub code: String,
    pub reason: String,
    pub amount_cents: i64,
    pub status: GlosaStatus,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a glosa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlosaStatus {
    Open,
    Appealed,
    Resolved,
}

/// Filters accepted by the glosa listing.
#[derive(Debug, Clone, Default)]
pub struct GlosaFilter {
    pub status: Option<GlosaStatus>,
}

/// A user's place in an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub organization_id: Uuid,
    pub role: Role,
}

/// Filters accepted by the audit log listing.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub resource: Option<String>,
}

/// Account counters for the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountStats {
    pub total: u64,
    pub pending: u64,
    pub under_review: u64,
    pub denied: u64,
    pub paid: u64,
    pub amount_cents_total: i64,
}

/// Glosa counters for the dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlosaStats {
    pub total: u64,
    pub open: u64,
    pub appealed: u64,
    pub resolved: u64,
    pub amount_cents_total: i64,
}

/// Combined dashboard payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub accounts: AccountStats,
    pub glosas: GlosaStats,
}

/// Web Push subscription keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushKeys {
    pub p256dh: String,
    pub auth: String,
}

/// A stored Web Push subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: PushKeys,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub created_at: DateTime<Utc>,
}
