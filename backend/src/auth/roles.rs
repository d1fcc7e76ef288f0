use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
    Tenant,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Owner, Self::Tenant];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner => "owner",
            Self::Tenant => "tenant",
        }
    }

    /// Landing route of the client for this role.
    #[must_use]
    pub const fn home_route(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Owner => "/owner/dashboard",
            Self::Tenant => "/tenant/dashboard",
        }
    }

    /// Roles that may be chosen at sign-up; admins are provisioned from the CLI.
    #[must_use]
    pub const fn is_self_service(self) -> bool {
        matches!(self, Self::Owner | Self::Tenant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            "tenant" => Ok(Self::Tenant),
            _ => Err(ParseEnumError::new("role", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Set of roles a promotional card is shown to. Stored as a JSON array.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<Role>);

impl RoleSet {
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles: Vec<Role> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        Self(roles)
    }

    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        let names: Vec<&str> = self.0.iter().map(|r| r.as_str()).collect();
        serde_json::Value::from(names).to_string()
    }
}

impl TryFrom<String> for RoleSet {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let names: Vec<String> =
            serde_json::from_str(&value).map_err(|_| ParseEnumError::new("role set", value.as_str()))?;
        let roles = names
            .iter()
            .map(|name| name.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!("Owner".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!(" tenant ".parse::<Role>().unwrap(), Role::Tenant);
        assert!("landlord".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_not_self_service() {
        assert!(!Role::Admin.is_self_service());
        assert!(Role::Owner.is_self_service());
        assert!(Role::Tenant.is_self_service());
    }

    #[test]
    fn role_set_is_sorted_and_deduplicated() {
        let set = RoleSet::new([Role::Tenant, Role::Owner, Role::Tenant]);
        assert_eq!(set.to_json(), r#"["owner","tenant"]"#);
    }

    #[test]
    fn role_set_parses_stored_json() {
        let set = RoleSet::try_from(r#"["tenant","owner"]"#.to_string()).unwrap();
        assert!(set.contains(Role::Owner));
        assert!(set.contains(Role::Tenant));
        assert!(!set.contains(Role::Admin));
    }

    #[test]
    fn role_set_rejects_unknown_roles() {
        assert!(RoleSet::try_from(r#"["owner","guest"]"#.to_string()).is_err());
        assert!(RoleSet::try_from("owner".to_string()).is_err());
    }
}
