//! Compliance audit log listing.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::audit::AuditEntry;
use crate::error::ApiError;
use crate::http::response::{resolve_page, Envelope, Pagination};
use crate::http::server::AppState;
use crate::security::rbac::Capability;
use crate::store::AuditFilter;

#[derive(Debug, Deserialize)]
pub struct ListAuditParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
}

/// `GET /api/audit-logs`: admin-facing, filterable by action/resource.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListAuditParams>,
) -> Result<Json<Envelope<Vec<AuditEntry>>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::AuditRead).await?;
    let window = resolve_page(params.page, params.limit, &state.config.pagination)?;

    let filter = AuditFilter {
        action: params.action,
        resource: params.resource,
    };
    let (rows, total) = state
        .db
        .list_audit_entries(ctx.organization_id, &filter, window.offset, window.limit)
        .await?;

    Ok(Json(Envelope::paginated(
        rows,
        Pagination::new(window.page, window.limit, total),
    )))
}
