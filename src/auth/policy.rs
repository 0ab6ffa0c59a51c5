//! Access policy: decides whether an identity may perform an operation.
//!
//! [`authorize`] is a pure function over the caller, the operation, the
//! target's ownership metadata and an optional group gate. It never touches
//! the store, so handlers load the target first and pass in what they found.
//!
//! Rules, in evaluation order:
//!
//! 1. Group gate. When `required_group` is given the caller must be
//!    authenticated and belong to one of the listed groups.
//! 2. Reads are open to everyone, anonymous callers included.
//! 3. Creating needs an authenticated caller. Registration does not go
//!    through the policy at all.
//! 4. Updating or deleting an advertisement is reserved to its owner and to
//!    admins. Ownerless rows can only be touched by admins.
//! 5. Updating or deleting a user is reserved to that user and to admins.
//!    Changing a user's group is additionally gated on [`ADMIN_ONLY`].

use crate::auth::identity::Identity;
use crate::domain::{Group, UserId};

/// Gate for operations only admins may perform, such as group reassignment.
pub const ADMIN_ONLY: &[Group] = &[Group::Admin];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// What the operation targets, with the ownership data the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Advertisement { owner_id: Option<UserId> },
    User { id: UserId },
    /// A collection as a whole: search results, or the target of a create.
    Listing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No usable identity was presented. Maps to 401.
    Unauthenticated,
    /// The identity is known but lacks the rights. Maps to 403.
    Forbidden,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("Authentication required"),
            Self::Forbidden => f.write_str("Insufficient permissions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Convert into a `Result` so callers can use `?`.
    pub const fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

#[must_use]
pub fn authorize(
    identity: &Identity,
    operation: Operation,
    resource: Resource,
    required_group: Option<&[Group]>,
) -> Decision {
    if let Some(groups) = required_group {
        let Identity::User(principal) = identity else {
            return Decision::Deny(DenyReason::Unauthenticated);
        };
        if !groups.contains(&principal.group) {
            return Decision::Deny(DenyReason::Forbidden);
        }
    }

    match (operation, resource) {
        (Operation::Read, _) => Decision::Allow,
        (Operation::Create, _) => authenticated(identity),
        (Operation::Update | Operation::Delete, Resource::Advertisement { owner_id }) => {
            owner_or_admin(identity, owner_id)
        }
        (Operation::Update | Operation::Delete, Resource::User { id }) => {
            self_or_admin(identity, id)
        }
        (Operation::Update | Operation::Delete, Resource::Listing) => {
            owner_or_admin(identity, None)
        }
    }
}

fn authenticated(identity: &Identity) -> Decision {
    match identity {
        Identity::Anonymous => Decision::Deny(DenyReason::Unauthenticated),
        Identity::User(_) => Decision::Allow,
    }
}

fn owner_or_admin(identity: &Identity, owner_id: Option<UserId>) -> Decision {
    let Identity::User(principal) = identity else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if principal.is_admin() {
        return Decision::Allow;
    }

    // Unowned rows are never claimable by a regular user.
    match owner_id {
        Some(owner) if owner == principal.id => Decision::Allow,
        _ => Decision::Deny(DenyReason::Forbidden),
    }
}

fn self_or_admin(identity: &Identity, target: UserId) -> Decision {
    let Identity::User(principal) = identity else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    if principal.is_admin() || principal.id == target {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::Forbidden)
    }
}
