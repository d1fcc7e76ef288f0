//! Access gate for role-protected routes.
//!
//! A caller is in exactly one of three states: no session, a session whose
//! role row has not been written yet, or a session with a resolved role.
//! Gating is a pure function of that state and the route's allow-list, so a
//! pending role is never mistaken for a denied one.

use serde::Serialize;

use crate::auth::Role;
use crate::core::PERMISSION_DENIED;

pub const LOGIN_ROUTE: &str = "/auth";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "state", content = "role", rename_all = "lowercase")]
pub enum RoleResolution {
    Anonymous,
    Pending,
    Resolved(Role),
}

impl RoleResolution {
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::Resolved(role) => Some(role),
            Self::Anonymous | Self::Pending => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// Role not known yet; the client keeps showing its loading state.
    Loading,
    Render,
    Redirect {
        to: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
    },
}

#[must_use]
pub fn evaluate(resolution: RoleResolution, allowed: &[Role]) -> GateDecision {
    match resolution {
        RoleResolution::Anonymous => GateDecision::Redirect {
            to: LOGIN_ROUTE.to_string(),
            notice: None,
        },
        RoleResolution::Pending => GateDecision::Loading,
        RoleResolution::Resolved(role) if allowed.contains(&role) => GateDecision::Render,
        RoleResolution::Resolved(role) => GateDecision::Redirect {
            to: role.home_route().to_string(),
            notice: Some(PERMISSION_DENIED.to_string()),
        },
    }
}

/// Allow-list for a client route. `None` means the route is public.
#[must_use]
pub fn allowed_roles_for(path: &str) -> Option<&'static [Role]> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let first_segment = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    match first_segment {
        "owner" => Some(&[Role::Owner]),
        "tenant" => Some(&[Role::Tenant]),
        "admin" => Some(&[Role::Admin]),
        _ => None,
    }
}
