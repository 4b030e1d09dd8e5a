//! Role-based access control.
//!
//! # Responsibilities
//! - Resolve the caller's identity via the session collaborator
//! - Resolve organization membership and role via the store
//! - Test the required capability against a static role table
//! - Attach the resolved AuthContext so handlers can scope queries
//!
//! # Design Decisions
//! - Roles and capabilities are closed enums; the mapping is a static
//!   table checked exhaustively, not string matching
//! - Missing session and missing membership are both 401; only a known
//!   member lacking a capability earns 403

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::observability::metrics;
use crate::store::{Database, StoreError};

/// Roles a member can hold within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

/// Actions the API gates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    AccountsRead,
    AccountsWrite,
    GlosasRead,
    GlosasWrite,
    DashboardRead,
    AuditRead,
    NotificationsWrite,
    /// Receive national IDs unmasked.
    PiiReveal,
}

impl Role {
    /// Static role → capability table.
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                AccountsRead,
                AccountsWrite,
                GlosasRead,
                GlosasWrite,
                DashboardRead,
                AuditRead,
                NotificationsWrite,
                PiiReveal,
            ],
            Role::Operator => &[
                AccountsRead,
                AccountsWrite,
                GlosasRead,
                GlosasWrite,
                DashboardRead,
                NotificationsWrite,
            ],
            Role::Viewer => &[AccountsRead, GlosasRead, DashboardRead, NotificationsWrite],
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Identity resolved from a session token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

/// Session-to-identity resolution; the external auth collaborator.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>, StoreError>;
}

/// Caller context carried through a request. Derived fresh per request,
/// never cached across requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub organization_id: Uuid,
}

impl AuthContext {
    pub fn can_reveal_pii(&self) -> bool {
        self.role.allows(Capability::PiiReveal)
    }
}

/// Resolves and authorizes callers for every protected route.
pub struct PermissionChecker {
    sessions: Arc<dyn SessionResolver>,
    db: Arc<dyn Database>,
}

impl PermissionChecker {
    pub fn new(sessions: Arc<dyn SessionResolver>, db: Arc<dyn Database>) -> Self {
        Self { sessions, db }
    }

    /// Run the authorize step of the pipeline.
    ///
    /// 401 when the bearer token is absent, unknown, or has no membership;
    /// 403 when the member's role lacks `required`.
    pub async fn check(
        &self,
        headers: &HeaderMap,
        required: Capability,
    ) -> Result<AuthContext, ApiError> {
        let token = bearer_token(headers).ok_or_else(|| {
            metrics::record_auth_denied("unauthenticated");
            ApiError::Unauthenticated
        })?;

        let identity = self
            .sessions
            .resolve(token)
            .await?
            .ok_or_else(|| {
                metrics::record_auth_denied("unauthenticated");
                ApiError::Unauthenticated
            })?;

        let membership = self
            .db
            .membership(identity.user_id)
            .await?
            .ok_or_else(|| {
                metrics::record_auth_denied("no_membership");
                ApiError::Unauthenticated
            })?;

        if !membership.role.allows(required) {
            tracing::debug!(
                user = %identity.user_id,
                role = ?membership.role,
                required = ?required,
                "capability denied"
            );
            metrics::record_auth_denied("forbidden");
            return Err(ApiError::Forbidden);
        }

        Ok(AuthContext {
            user_id: identity.user_id,
            email: identity.email,
            role: membership.role,
            organization_id: membership.organization_id,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatabase;

    #[test]
    fn admin_holds_every_capability() {
        use Capability::*;
        for cap in [
            AccountsRead,
            AccountsWrite,
            GlosasRead,
            GlosasWrite,
            DashboardRead,
            AuditRead,
            NotificationsWrite,
            PiiReveal,
        ] {
            assert!(Role::Admin.allows(cap), "admin should allow {:?}", cap);
        }
    }

    #[test]
    fn operator_cannot_read_audit_or_reveal_pii() {
        assert!(Role::Operator.allows(Capability::AccountsWrite));
        assert!(!Role::Operator.allows(Capability::AuditRead));
        assert!(!Role::Operator.allows(Capability::PiiReveal));
    }

    #[test]
    fn viewer_is_read_only() {
        assert!(Role::Viewer.allows(Capability::AccountsRead));
        assert!(!Role::Viewer.allows(Capability::AccountsWrite));
        assert!(!Role::Viewer.allows(Capability::GlosasWrite));
        assert!(!Role::Viewer.allows(Capability::AuditRead));
    }

    #[test]
    fn bearer_extraction_requires_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn unknown_token_is_unauthenticated() {
        use crate::store::memory::MemorySessions;
        let db = Arc::new(MemoryDatabase::new());
        let sessions = Arc::new(MemorySessions::new());
        let checker = PermissionChecker::new(sessions, db);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer nope".parse().unwrap());
        let err = checker
            .check(&headers, Capability::AccountsRead)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn member_without_capability_is_forbidden() {
        use crate::store::memory::MemorySessions;
        let db = Arc::new(MemoryDatabase::new());
        let sessions = Arc::new(MemorySessions::new());
        let user_id = Uuid::new_v4();
        sessions.register(
            "viewer-token",
            Identity {
                user_id,
                email: "viewer@hospital.example".into(),
            },
        );
        db.add_membership(user_id, Uuid::new_v4(), Role::Viewer);
        let checker = PermissionChecker::new(sessions, db);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer viewer-token".parse().unwrap());
        let err = checker
            .check(&headers, Capability::AccountsWrite)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));

        let ctx = checker
            .check(&headers, Capability::AccountsRead)
            .await
            .unwrap();
        assert_eq!(ctx.role, Role::Viewer);
        assert!(!ctx.can_reveal_pii());
    }
}
