//! Push subscription endpoints.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::AuditEntry;
use crate::error::ApiError;
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::security::rbac::Capability;
use crate::store::{PushKeys, PushSubscription};

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub endpoint: String,
    pub keys: SubscribeKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeKeys {
    pub p256dh: String,
    pub auth: String,
}

fn validate_subscribe(req: &SubscribeRequest) -> Result<(), ApiError> {
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::Validation("endpoint must not be empty".into()));
    }
    if req.keys.p256dh.trim().is_empty() {
        return Err(ApiError::Validation("keys.p256dh must not be empty".into()));
    }
    if req.keys.auth.trim().is_empty() {
        return Err(ApiError::Validation("keys.auth must not be empty".into()));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SubscribeOutcome {
    pub subscribed: bool,
}

/// `POST /api/notifications/push-subscribe`.
pub async fn subscribe(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<Envelope<SubscribeOutcome>>, ApiError> {
    let ctx = state
        .auth
        .check(&headers, Capability::NotificationsWrite)
        .await?;
    validate_subscribe(&req)?;

    state
        .db
        .save_push_subscription(PushSubscription {
            endpoint: req.endpoint.clone(),
            keys: PushKeys {
                p256dh: req.keys.p256dh,
                auth: req.keys.auth,
            },
            user_id: ctx.user_id,
            organization_id: ctx.organization_id,
            created_at: Utc::now(),
        })
        .await?;

    state.audit.record(
        AuditEntry::write(
            &ctx,
            "notifications.subscribe",
            "push_subscriptions",
            json!({ "endpoint": req.endpoint }),
        )
        .with_client_ip(addr.ip()),
    );

    Ok(Json(Envelope::new(SubscribeOutcome { subscribed: true })))
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeOutcome {
    pub unsubscribed: bool,
}

/// `DELETE /api/notifications/push-subscribe`.
pub async fn unsubscribe(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<UnsubscribeRequest>,
) -> Result<Json<Envelope<UnsubscribeOutcome>>, ApiError> {
    let ctx = state
        .auth
        .check(&headers, Capability::NotificationsWrite)
        .await?;
    if req.endpoint.trim().is_empty() {
        return Err(ApiError::Validation("endpoint must not be empty".into()));
    }

    let removed = state
        .db
        .delete_push_subscription(ctx.organization_id, &req.endpoint)
        .await?;

    state.audit.record(
        AuditEntry::write(
            &ctx,
            "notifications.unsubscribe",
            "push_subscriptions",
            json!({ "endpoint": req.endpoint, "removed": removed }),
        )
        .with_client_ip(addr.ip()),
    );

    Ok(Json(Envelope::new(UnsubscribeOutcome {
        unsubscribed: removed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fail_validation_in_order() {
        let mut req = SubscribeRequest {
            endpoint: "https://push.example/sub/1".into(),
            keys: SubscribeKeys {
                p256dh: "".into(),
                auth: "".into(),
            },
        };
        let err = validate_subscribe(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("p256dh")));

        req.keys.p256dh = "key".into();
        let err = validate_subscribe(&req).unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.contains("auth")));
    }
}
