//! Billing account endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::error::ApiError;
use crate::http::response::{resolve_page, Envelope, Pagination};
use crate::http::server::AppState;
use crate::notify::{notify_all, PushPayload};
use crate::security::pii;
use crate::security::rbac::Capability;
use crate::store::{Account, AccountFilter, AccountStatus};

#[derive(Debug, Deserialize)]
pub struct ListAccountsParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<AccountStatus>,
}

/// `GET /api/accounts`: paginated, tenant-scoped, masked by entitlement.
pub async fn list_accounts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ListAccountsParams>,
) -> Result<Json<Envelope<Vec<Account>>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::AccountsRead).await?;
    let window = resolve_page(params.page, params.limit, &state.config.pagination)?;

    let filter = AccountFilter {
        status: params.status,
    };
    let (rows, total) = state
        .db
        .list_accounts(ctx.organization_id, &filter, window.offset, window.limit)
        .await?;

    let reveal = ctx.can_reveal_pii();
    let data = pii::mask_accounts(&rows, reveal);

    state.audit.record_read(
        AuditEntry::read(&ctx, "accounts", data.len() as u64, true)
            .with_client_ip(addr.ip())
            .with_details(json!({ "masked": !reveal })),
    );

    Ok(Json(Envelope::paginated(
        data,
        Pagination::new(window.page, window.limit, total),
    )))
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub patient_name: String,
    pub patient_cpf: Option<String>,
    pub insurer: String,
    pub amount_cents: i64,
}

fn validate_create(req: &CreateAccountRequest) -> Result<(), ApiError> {
    if req.patient_name.trim().is_empty() {
        return Err(ApiError::Validation("patient_name must not be empty".into()));
    }
    if req.insurer.trim().is_empty() {
        return Err(ApiError::Validation("insurer must not be empty".into()));
    }
    if req.amount_cents <= 0 {
        return Err(ApiError::Validation("amount_cents must be positive".into()));
    }
    if let Some(cpf) = &req.patient_cpf {
        if !pii::is_valid_cpf(cpf) {
            return Err(ApiError::Validation("patient_cpf must be a valid CPF".into()));
        }
    }
    Ok(())
}

/// `POST /api/accounts`: create one billing account.
pub async fn create_account(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<Envelope<Account>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::AccountsWrite).await?;
    validate_create(&req)?;

    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        organization_id: ctx.organization_id,
        patient_name: req.patient_name,
        patient_cpf: req.patient_cpf,
        insurer: req.insurer,
        amount_cents: req.amount_cents,
        status: AccountStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let stored = state.db.insert_account(account).await?;

    state.audit.record(
        AuditEntry::write(
            &ctx,
            "accounts.create",
            "accounts",
            json!({ "insurer": stored.insurer, "amount_cents": stored.amount_cents }),
        )
        .with_resource_id(stored.id)
        .with_client_ip(addr.ip()),
    );

    let data = pii::mask_account(&stored, ctx.can_reveal_pii());
    Ok(Json(Envelope::new(data)))
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    UpdateStatus,
    Delete,
}

#[derive(Debug, Deserialize)]
pub struct BulkAccountsRequest {
    pub ids: Vec<Uuid>,
    pub action: BulkAction,
    pub status: Option<AccountStatus>,
}

/// Validated execution plan for a bulk request.
#[derive(Debug)]
enum BulkPlan {
    UpdateStatus(AccountStatus),
    Delete,
}

/// Fails closed: an action missing its required field never reaches the
/// store.
fn plan_bulk(req: &BulkAccountsRequest) -> Result<BulkPlan, ApiError> {
    if req.ids.is_empty() {
        return Err(ApiError::Validation("ids must not be empty".into()));
    }
    match req.action {
        BulkAction::UpdateStatus => match req.status {
            Some(status) => Ok(BulkPlan::UpdateStatus(status)),
            None => Err(ApiError::Validation(
                "status is required for update_status".into(),
            )),
        },
        BulkAction::Delete => Ok(BulkPlan::Delete),
    }
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub affected: u64,
}

/// `POST /api/accounts/bulk`: update or delete a set of accounts.
pub async fn bulk_accounts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<BulkAccountsRequest>,
) -> Result<Json<Envelope<BulkOutcome>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::AccountsWrite).await?;
    let plan = plan_bulk(&req)?;

    let (action, affected) = match plan {
        BulkPlan::UpdateStatus(status) => {
            let affected = state
                .db
                .update_account_status(ctx.organization_id, &req.ids, status)
                .await?;

            // Best-effort fan-out to the organization's subscribers;
            // failures are logged, never surfaced.
            let db = state.db.clone();
            let push = state.push.clone();
            let organization_id = ctx.organization_id;
            let payload = PushPayload {
                title: "Contas atualizadas".into(),
                body: format!("{} conta(s) mudaram de status", affected),
                url: None,
            };
            tokio::spawn(async move {
                match db.list_push_subscriptions(organization_id).await {
                    Ok(subs) => notify_all(push.as_ref(), &subs, &payload).await,
                    Err(err) => {
                        tracing::warn!(error = %err, "could not load push subscriptions")
                    }
                }
            });

            ("accounts.bulk_update_status", affected)
        }
        BulkPlan::Delete => {
            let affected = state
                .db
                .delete_accounts(ctx.organization_id, &req.ids)
                .await?;
            ("accounts.bulk_delete", affected)
        }
    };

    state.audit.record(
        AuditEntry::write(
            &ctx,
            action,
            "accounts",
            json!({ "requested": req.ids.len(), "affected": affected }),
        )
        .with_client_ip(addr.ip()),
    );

    Ok(Json(Envelope::new(BulkOutcome { affected })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(ids: Vec<Uuid>, action: BulkAction, status: Option<AccountStatus>) -> BulkAccountsRequest {
        BulkAccountsRequest { ids, action, status }
    }

    #[test]
    fn empty_ids_fail_validation() {
        let err = plan_bulk(&bulk(vec![], BulkAction::Delete, None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("ids")));
    }

    #[test]
    fn update_status_requires_status_field() {
        let err =
            plan_bulk(&bulk(vec![Uuid::new_v4()], BulkAction::UpdateStatus, None)).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("status")));
    }

    #[test]
    fn delete_needs_no_extra_fields() {
        assert!(plan_bulk(&bulk(vec![Uuid::new_v4()], BulkAction::Delete, None)).is_ok());
    }

    #[test]
    fn create_validation_reports_first_offending_field() {
        let mut req = CreateAccountRequest {
            patient_name: "".into(),
            patient_cpf: Some("12345678901".into()),
            insurer: "Amil".into(),
            amount_cents: 100,
        };
        let err = validate_create(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("patient_name")));

        req.patient_name = "Ana Lima".into();
        req.patient_cpf = Some("123".into());
        let err = validate_create(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("patient_cpf")));
    }
}
