// SPDX-FileCopyrightText: 2026 Tocsin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role checks consumed by the workflow and the owner filters.

use std::collections::HashSet;

use crate::types::UserId;

/// Answers whether a user holds elevated privileges.
pub trait Authorizer: Send + Sync {
    /// May create and manage records.
    fn is_admin(&self, user: UserId) -> bool;

    /// Sees and manages every record regardless of owner.
    fn is_superadmin(&self, user: UserId) -> bool;
}

/// Fixed id lists read from configuration. Superadmins are admins too.
#[derive(Debug, Clone, Default)]
pub struct StaticRoles {
    admins: HashSet<UserId>,
    superadmins: HashSet<UserId>,
}

impl StaticRoles {
    pub fn new(
        admins: impl IntoIterator<Item = i64>,
        superadmins: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            admins: admins.into_iter().map(UserId).collect(),
            superadmins: superadmins.into_iter().map(UserId).collect(),
        }
    }
}

impl Authorizer for StaticRoles {
    fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user) || self.superadmins.contains(&user)
    }

    fn is_superadmin(&self, user: UserId) -> bool {
        self.superadmins.contains(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superadmin_implies_admin() {
        let roles = StaticRoles::new([1], [2]);
        assert!(roles.is_admin(UserId(1)));
        assert!(!roles.is_superadmin(UserId(1)));
        assert!(roles.is_admin(UserId(2)));
        assert!(roles.is_superadmin(UserId(2)));
        assert!(!roles.is_admin(UserId(3)));
    }
}
