//! Audit entry shape and constructors.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::security::rbac::AuthContext;

/// One append-only audit record. Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    /// Dotted action name, e.g. `accounts.bulk_update_status`.
    pub action: String,
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    /// Whether the accessed record set contained PII fields.
    pub pii_access: bool,
    /// How many records the access returned (reads only).
    pub record_count: u64,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Entry for a mutating action.
    pub fn write(ctx: &AuthContext, action: &str, resource: &str, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: ctx.user_id,
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id: None,
            organization_id: Some(ctx.organization_id),
            details,
            client_ip: None,
            pii_access: false,
            record_count: 0,
            timestamp: Utc::now(),
        }
    }

    /// Entry for a read access, tracking PII exposure volume.
    pub fn read(ctx: &AuthContext, resource: &str, record_count: u64, pii_access: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: ctx.user_id,
            action: format!("{resource}.read"),
            resource: resource.to_string(),
            resource_id: None,
            organization_id: Some(ctx.organization_id),
            details: serde_json::Value::Object(serde_json::Map::new()),
            client_ip: None,
            pii_access,
            record_count,
            timestamp: Utc::now(),
        }
    }

    /// Entry with no acting user (startup tasks, tests).
    pub fn system(action: &str, resource: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id: Uuid::nil(),
            action: action.to_string(),
            resource: resource.to_string(),
            resource_id: None,
            organization_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
            client_ip: None,
            pii_access: false,
            record_count: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_resource_id(mut self, id: Uuid) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = Some(ip.to_string());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}
