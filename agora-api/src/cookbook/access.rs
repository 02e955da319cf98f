//! Who may change what.
//!
//! Plain functions over ids and roles, so every rule is testable without a
//! store or a request.

use serde::{Deserialize, Serialize};

use crate::db::DocId;

/// A user's role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// The authenticated caller, with the role currently on record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: DocId,
    pub role: Role,
}

/// Why an action was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Owner,
    Admin,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny,
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

/// Recipes may be changed by their creator or by any admin. Ownership is
/// checked first.
#[must_use]
pub fn authorize_recipe_change(actor: &Actor, owner: &DocId) -> Decision {
    if actor.id == *owner {
        Decision::Allow(Grant::Owner)
    } else if actor.role == Role::Admin {
        Decision::Allow(Grant::Admin)
    } else {
        Decision::Deny
    }
}

/// Only admins may register other admins.
#[must_use]
pub fn authorize_admin_registration(actor: &Actor) -> Decision {
    match actor.role {
        Role::Admin => Decision::Allow(Grant::Admin),
        Role::User => Decision::Deny,
    }
}
