//! Per-request principal and the visibility/mutation rules applied to it.
//!
//! Super users may do anything. Everyone else sees only the groups they are
//! a member of, and may change a group-scoped entity only when their
//! membership carries the matching admin flag.

use dpm_core::EntityKind;
use dpm_core::models::GroupPermissions;
use dpm_core::models::auth::TokenClaims;

use crate::error::{AppError, AppResult};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Principal {
    pub email: String,
    pub admin: bool,
    pub permissions: Vec<GroupPermissions>,
}

impl Principal {
    /// Rights are read from the store on every request so membership changes
    /// apply to tokens already issued.
    pub fn resolve(store: &Store, claims: &TokenClaims) -> Self {
        Self {
            email: claims.sub.clone(),
            admin: store.is_super_user(&claims.sub),
            permissions: store.permissions_of(&claims.sub),
        }
    }

    fn membership(&self, group: i64) -> Option<&GroupPermissions> {
        self.permissions.iter().find(|p| p.group_id == group)
    }

    pub fn can_view(&self, group: i64) -> bool {
        self.admin || self.membership(group).is_some()
    }

    pub fn can_manage(&self, kind: EntityKind, group: i64) -> bool {
        if self.admin {
            return true;
        }
        let Some(p) = self.membership(group) else {
            return false;
        };
        match kind {
            EntityKind::Group | EntityKind::User => p.is_group_admin,
            EntityKind::Topic => p.is_topic_admin,
            EntityKind::Application => p.is_application_admin,
            EntityKind::SuperUser => false,
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} is not a super user", self.email)))
        }
    }

    pub fn require_manage(&self, kind: EntityKind, group: i64) -> AppResult<()> {
        if self.can_manage(kind, group) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "{} may not change {} in group {group}",
                self.email,
                kind.path_segment()
            )))
        }
    }

    /// Hidden entities answer like missing ones.
    pub fn require_view(&self, group: i64, not_found: &'static str) -> AppResult<()> {
        if self.can_view(group) {
            Ok(())
        } else {
            Err(AppError::NotFound(not_found))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(sub: &str) -> TokenClaims {
        TokenClaims {
            sub: sub.into(),
            name: sub.into(),
            roles: vec![],
            exp: 0,
            iat: 0,
            jti: "t".into(),
        }
    }

    #[test]
    fn super_user_manages_everything() {
        let store = Store::seeded();
        let p = Principal::resolve(&store, &claims("unity-admin@test.test"));
        assert!(p.admin);
        assert!(p.can_manage(EntityKind::Topic, 999));
        assert!(p.require_admin().is_ok());
    }

    #[test]
    fn member_rights_follow_flags() {
        let store = Store::seeded();
        let alpha = store.groups()[0].id;
        let beta = store.groups()[1].id;

        let admin = Principal::resolve(&store, &claims("kstanley@test.test"));
        assert!(admin.can_manage(EntityKind::Application, alpha));
        assert!(!admin.can_view(beta));

        let member = Principal::resolve(&store, &claims("jgilbert@test.test"));
        assert!(member.can_view(alpha) && member.can_view(beta));
        assert!(!member.can_manage(EntityKind::Topic, alpha));
        assert!(!member.can_manage(EntityKind::SuperUser, alpha));
        assert!(member.require_admin().is_err());
    }
}
