//! Caller identity as supplied by the external identity/role oracle.
//!
//! The engine never authenticates anyone. The API layer resolves the caller
//! and passes a [`Caller`] inside [`super::CommandMetadata`].

use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs auctions they own.
    Admin,
    /// Registered team member; may bid for their own team.
    Bidder,
    /// Read-only audience.
    Viewer,
}

/// Who is calling, with what role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    pub fn bidder(user_id: UserId) -> Self {
        Self::new(user_id, Role::Bidder)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn only_admin_role_is_admin() {
        let user = UserId::new("u-1").unwrap();
        assert!(Caller::admin(user.clone()).is_admin());
        assert!(!Caller::bidder(user).is_admin());
    }
}
