//! Glosa (claim denial) endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::error::ApiError;
use crate::http::response::{resolve_page, Envelope, Pagination};
use crate::http::server::AppState;
use crate::security::rbac::Capability;
use crate::store::{Glosa, GlosaFilter, GlosaStatus};

#[derive(Debug, Deserialize)]
pub struct ListGlosasParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<GlosaStatus>,
}

/// `GET /api/glosas`: paginated, tenant-scoped listing. No PII here.
pub async fn list_glosas(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ListGlosasParams>,
) -> Result<Json<Envelope<Vec<Glosa>>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::GlosasRead).await?;
    let window = resolve_page(params.page, params.limit, &state.config.pagination)?;

    let filter = GlosaFilter {
        status: params.status,
    };
    let (rows, total) = state
        .db
        .list_glosas(ctx.organization_id, &filter, window.offset, window.limit)
        .await?;

    state.audit.record_read(
        AuditEntry::read(&ctx, "glosas", rows.len() as u64, false).with_client_ip(addr.ip()),
    );

    Ok(Json(Envelope::paginated(
        rows,
        Pagination::new(window.page, window.limit, total),
    )))
}

#[derive(Debug, Deserialize)]
pub struct CreateGlosaRequest {
    pub account_id: Uuid,
    pub code: String,
    pub reason: String,
    pub amount_cents: i64,
}

fn validate_create(req: &CreateGlosaRequest) -> Result<(), ApiError> {
    if req.code.trim().is_empty() {
        return Err(ApiError::Validation("code must not be empty".into()));
    }
    if req.reason.trim().is_empty() {
        return Err(ApiError::Validation("reason must not be empty".into()));
    }
    if req.amount_cents <= 0 {
        return Err(ApiError::Validation("amount_cents must be positive".into()));
    }
    Ok(())
}

/// `POST /api/glosas`: register a denial received from an insurer.
pub async fn create_glosa(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CreateGlosaRequest>,
) -> Result<Json<Envelope<Glosa>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::GlosasWrite).await?;
    validate_create(&req)?;

    let glosa = Glosa {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        account_id: req.account_id,
        code: req.code,
        reason: req.reason,
        amount_cents: req.amount_cents,
        status: GlosaStatus::Open,
        created_at: Utc::now(),
    };
    let glosa = state.db.insert_glosa(glosa).await?;

    state.audit.record(
        AuditEntry::write(
            &ctx,
            "glosas.create",
            "glosas",
            json!({ "code": glosa.code, "amount_cents": glosa.amount_cents }),
        )
        .with_resource_id(glosa.id)
        .with_client_ip(addr.ip()),
    );

    Ok(Json(Envelope::new(glosa)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_code_is_rejected_first() {
        let req = CreateGlosaRequest {
            account_id: Uuid::new_v4(),
            code: " ".into(),
            reason: "".into(),
            amount_cents: 0,
        };
        let err = validate_create(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("code")));
    }
}
