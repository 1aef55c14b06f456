use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a user may do in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Seller,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Admin, Role::Seller];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Seller => "seller",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
            Role::Admin => "Admin",
            Role::Seller => "Seller",
        }
    }

    /// Landing page after login and target of the "Home" nav entry.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Owner => "/owner",
            Role::Admin | Role::Seller => "/seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles allowed to manage users.
pub const MANAGERS: &[Role] = &[Role::Owner, Role::Admin];

/// Roles allowed to create distribution points.
pub const CREATORS: &[Role] = &[Role::Owner];

/// Result of checking a caller's role against a required set.
///
/// A denied gate still renders the wrapped content, only degraded and inert
/// under an overlay. It is a visual affordance; handlers that mutate state
/// check roles on their own with [`require_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    pub allowed: bool,
}

impl Gate {
    pub fn check(required: &[Role], role: Role) -> Self {
        Self {
            allowed: required.contains(&role),
        }
    }

    /// CSS class for the wrapper element around gated content.
    pub fn wrapper_class(&self) -> &'static str {
        if self.allowed {
            "gate"
        } else {
            "gate gate-denied"
        }
    }
}

/// Server-side role check for mutating endpoints.
pub fn require_role(required: &[Role], role: Role) -> Result<(), crate::error::AppError> {
    if required.contains(&role) {
        Ok(())
    } else {
        Err(crate::error::AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_strings() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn seller_is_denied_manager_content() {
        let gate = Gate::check(MANAGERS, Role::Seller);
        assert!(!gate.allowed);
        assert_eq!(gate.wrapper_class(), "gate gate-denied");
    }

    #[test]
    fn managers_pass_manager_gate() {
        assert!(Gate::check(MANAGERS, Role::Owner).allowed);
        assert!(Gate::check(MANAGERS, Role::Admin).allowed);
    }

    #[test]
    fn empty_requirement_denies_everyone() {
        for role in Role::ALL {
            assert!(!Gate::check(&[], role).allowed);
        }
    }

    #[test]
    fn require_role_forbids_outsiders() {
        assert!(require_role(CREATORS, Role::Owner).is_ok());
        assert!(matches!(
            require_role(CREATORS, Role::Seller),
            Err(crate::error::AppError::Forbidden)
        ));
    }

    #[test]
    fn home_path_depends_on_role() {
        assert_eq!(Role::Owner.home_path(), "/owner");
        assert_eq!(Role::Admin.home_path(), "/seller");
        assert_eq!(Role::Seller.home_path(), "/seller");
    }
}
