//! Dashboard aggregates.

use axum::{extract::State, http::HeaderMap, Json};

use crate::error::ApiError;
use crate::http::response::Envelope;
use crate::http::server::AppState;
use crate::security::rbac::Capability;
use crate::store::DashboardStats;

/// `GET /api/dashboard/stats`.
///
/// The two reference lookups run concurrently and succeed or fail as a
/// unit; there is no partial-success merging.
pub async fn stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Envelope<DashboardStats>>, ApiError> {
    let ctx = state.auth.check(&headers, Capability::DashboardRead).await?;

    let (accounts, glosas) = tokio::try_join!(
        state.db.account_stats(ctx.organization_id),
        state.db.glosa_stats(ctx.organization_id),
    )?;

    Ok(Json(Envelope::new(DashboardStats { accounts, glosas })))
}
