use serde::Serialize;
use std::fmt;

use crate::auth::Role;

/// Audit events for security monitoring and bookkeeping
#[derive(Debug, Clone, Serialize)]
pub enum AuditEvent {
    /// New account registered
    SignedUp {
        user_id: i64,
        email: String,
        role: Role,
        client_ip: String,
    },
    /// Sign-in rejected
    SignInFailed {
        email: String,
        client_ip: String,
        reason: String,
    },
    /// Caller with a resolved role hit a route of another role
    AccessDenied {
        user_id: i64,
        role: Role,
        path: String,
    },
    /// Owner linked a tenant to a property
    TenantAssigned {
        owner_id: i64,
        property_id: i64,
        tenant_id: i64,
    },
    /// Tenant recorded a rent payment
    PaymentRecorded {
        tenant_id: i64,
        property_id: i64,
        receipt_id: String,
        amount: f64,
    },
    /// Rate limit exceeded
    RateLimitExceeded {
        client_ip: String,
        endpoint: String,
    },
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignedUp { email, role, client_ip, .. } => {
                write!(f, "New {role} account {email} registered from {client_ip}")
            }
            Self::SignInFailed { email, client_ip, reason } => {
                write!(f, "Sign-in failed for {email} from {client_ip}: {reason}")
            }
            Self::AccessDenied { user_id, role, path } => {
                write!(f, "User {user_id} with role {role} denied access to {path}")
            }
            Self::TenantAssigned { owner_id, property_id, tenant_id } => {
                write!(f, "Owner {owner_id} assigned tenant {tenant_id} to property {property_id}")
            }
            Self::PaymentRecorded { tenant_id, property_id, receipt_id, amount } => {
                write!(f, "Tenant {tenant_id} paid {amount:.2} for property {property_id} (receipt {receipt_id})")
            }
            Self::RateLimitExceeded { client_ip, endpoint } => {
                write!(f, "Rate limit exceeded from {client_ip} on {endpoint}")
            }
        }
    }
}

/// Log audit event with structured data
pub fn log_event(event: &AuditEvent) {
    match event {
        AuditEvent::SignInFailed { .. } | AuditEvent::AccessDenied { .. } | AuditEvent::RateLimitExceeded { .. } => {
            tracing::warn!(
                event_type = "audit",
                event = ?event,
                message = %event,
                "Security event"
            );
        }
        _ => {
            tracing::info!(
                event_type = "audit",
                event = ?event,
                message = %event,
                "Audit event"
            );
        }
    }
}

/// Extract client IP from request headers (considering proxies)
#[must_use]
pub fn extract_client_ip(headers: &axum::http::HeaderMap) -> String {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded_for {
        return ip.to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}
