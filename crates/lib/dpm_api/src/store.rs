//! In-memory entity store.
//!
//! Rows keep only owned fields; derived values (group names, counts,
//! canonical topic names) are computed when a row is read so a rename is
//! visible everywhere at once. Access control lives in `services::access`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use dpm_core::codes;
use dpm_core::models::{
    AccessPermissionBody, Application, ApplicationDraft, ApplicationPermission, Group,
    GroupDraft, GroupPermissions, SuperUser, SuperUserDraft, Topic, TopicDraft, TopicKind, User,
    UserDraft,
};
use dpm_core::validation::{Validate, ValidationError};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid: {}", .0.join(", "))]
    Invalid(Vec<&'static str>),

    #[error("not found: {0}")]
    NotFound(&'static str),
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        StoreError::Invalid(e.codes)
    }
}

#[derive(Debug, Clone)]
struct GroupRow {
    name: String,
    description: Option<String>,
    is_public: bool,
}

#[derive(Debug, Clone)]
struct MembershipRow {
    email: String,
    group: i64,
    is_group_admin: bool,
    is_topic_admin: bool,
    is_application_admin: bool,
}

#[derive(Debug, Clone)]
struct TopicRow {
    name: String,
    kind: TopicKind,
    description: Option<String>,
    is_public: bool,
    group: i64,
    date_created: DateTime<Utc>,
    date_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct ApplicationRow {
    name: String,
    description: Option<String>,
    is_public: bool,
    group: i64,
    date_created: DateTime<Utc>,
    date_updated: DateTime<Utc>,
    password_hash: Option<String>,
    /// SHA-256 of the only bind token currently accepted.
    bind_token_hash: Option<String>,
}

#[derive(Debug, Clone)]
struct PermissionRow {
    application: i64,
    topic: i64,
    access: AccessPermissionBody,
}

#[derive(Debug, Default)]
pub struct Store {
    last_id: i64,
    groups: BTreeMap<i64, GroupRow>,
    memberships: BTreeMap<i64, MembershipRow>,
    super_users: BTreeMap<i64, String>,
    topics: BTreeMap<i64, TopicRow>,
    applications: BTreeMap<i64, ApplicationRow>,
    permissions: BTreeMap<i64, PermissionRow>,
    /// Logged-out token ids with their expiry.
    revoked: HashMap<String, i64>,
}

/// Partition names are trimmed; blank ones are dropped.
fn trimmed_partitions(mut access: AccessPermissionBody) -> AccessPermissionBody {
    fn clean(set: BTreeSet<String>) -> BTreeSet<String> {
        set.into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
    access.read_partitions = clean(access.read_partitions);
    access.write_partitions = clean(access.write_partitions);
    access
}

fn trimmed(description: &Option<String>) -> Option<String> {
    description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn by_name<T>(mut rows: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    rows.sort_by_cached_key(|row| key(row).to_lowercase());
    rows
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the demo data used by the dev server and tests.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        store.seed();
        store
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn seed(&mut self) {
        let mut group_ids = Vec::new();
        for name in ["Alpha", "Beta", "Gamma", "Delta"] {
            let id = self.next_id();
            self.groups.insert(
                id,
                GroupRow {
                    name: name.to_string(),
                    description: None,
                    is_public: false,
                },
            );
            group_ids.push(id);
        }
        let (alpha, beta) = (group_ids[0], group_ids[1]);

        let id = self.next_id();
        self.super_users
            .insert(id, "unity-admin@test.test".to_string());

        for (email, group, admin) in [
            ("kstanley@test.test", alpha, true),
            ("jgilbert@test.test", alpha, false),
            ("jgilbert@test.test", beta, false),
        ] {
            let id = self.next_id();
            self.memberships.insert(
                id,
                MembershipRow {
                    email: email.to_string(),
                    group,
                    is_group_admin: admin,
                    is_topic_admin: admin,
                    is_application_admin: admin,
                },
            );
        }

        let now = Utc::now();
        for (name, kind, group) in [
            ("Test Topic 123", TopicKind::C, alpha),
            ("Test Topic 456", TopicKind::B, beta),
        ] {
            let id = self.next_id();
            self.topics.insert(
                id,
                TopicRow {
                    name: name.to_string(),
                    kind,
                    description: None,
                    is_public: false,
                    group,
                    date_created: now,
                    date_updated: now,
                },
            );
        }
        for (name, group) in [("Application One", alpha), ("Application Two", beta)] {
            let id = self.next_id();
            self.applications.insert(
                id,
                ApplicationRow {
                    name: name.to_string(),
                    description: None,
                    is_public: false,
                    group,
                    date_created: now,
                    date_updated: now,
                    password_hash: None,
                    bind_token_hash: None,
                },
            );
        }
    }

    // -- principals ---------------------------------------------------------

    pub fn is_super_user(&self, email: &str) -> bool {
        self.super_users
            .values()
            .any(|e| e.eq_ignore_ascii_case(email))
    }

    /// Resolve a login name to a known email. The local part alone is accepted
    /// when it is unambiguous (`unity-admin` for `unity-admin@test.test`).
    pub fn find_principal(&self, username: &str) -> Option<String> {
        let username = username.trim();
        let emails = self
            .super_users
            .values()
            .chain(self.memberships.values().map(|m| &m.email));
        let mut local_matches = HashSet::new();
        for email in emails {
            if email.eq_ignore_ascii_case(username) {
                return Some(email.clone());
            }
            if let Some((local, _)) = email.split_once('@')
                && local.eq_ignore_ascii_case(username)
            {
                local_matches.insert(email.clone());
            }
        }
        if local_matches.len() == 1 {
            local_matches.into_iter().next()
        } else {
            None
        }
    }

    /// Per-group rights of `email`, ordered by group name.
    pub fn permissions_of(&self, email: &str) -> Vec<GroupPermissions> {
        let rows = self
            .memberships
            .values()
            .filter(|m| m.email.eq_ignore_ascii_case(email))
            .filter_map(|m| {
                self.groups.get(&m.group).map(|g| GroupPermissions {
                    group_id: m.group,
                    group_name: g.name.clone(),
                    is_group_admin: m.is_group_admin,
                    is_topic_admin: m.is_topic_admin,
                    is_application_admin: m.is_application_admin,
                })
            })
            .collect();
        by_name(rows, |p: &GroupPermissions| p.group_name.clone())
    }

    /// Revoke a token until `exp`. Entries whose token has expired anyway
    /// are dropped here.
    pub fn revoke(&mut self, jti: &str, exp: i64) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, until| *until >= now);
        self.revoked.insert(jti.to_string(), exp);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    // -- groups -------------------------------------------------------------

    fn group_row(&self, id: i64) -> StoreResult<&GroupRow> {
        self.groups
            .get(&id)
            .ok_or(StoreError::NotFound(codes::GROUP_NOT_FOUND))
    }

    fn group_name(&self, id: i64) -> String {
        self.groups
            .get(&id)
            .map(|g| g.name.clone())
            .unwrap_or_default()
    }

    fn group_view(&self, id: i64, row: &GroupRow) -> Group {
        Group {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            is_public: row.is_public,
            membership_count: self.memberships.values().filter(|m| m.group == id).count(),
            topic_count: self.topics.values().filter(|t| t.group == id).count(),
            application_count: self.applications.values().filter(|a| a.group == id).count(),
        }
    }

    pub fn groups(&self) -> Vec<Group> {
        let rows = self
            .groups
            .iter()
            .map(|(id, row)| self.group_view(*id, row))
            .collect();
        by_name(rows, |g: &Group| g.name.clone())
    }

    pub fn group(&self, id: i64) -> StoreResult<Group> {
        let row = self.group_row(id)?;
        Ok(self.group_view(id, row))
    }

    fn group_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.groups
            .iter()
            .any(|(id, g)| Some(*id) != except && g.name.eq_ignore_ascii_case(name))
    }

    pub fn create_group(&mut self, draft: &GroupDraft) -> StoreResult<Group> {
        draft.validate()?;
        let name = draft.name.trim();
        if self.group_name_taken(name, None) {
            return Err(StoreError::Invalid(vec![codes::GROUP_ALREADY_EXISTS]));
        }
        let id = self.next_id();
        let row = GroupRow {
            name: name.to_string(),
            description: trimmed(&draft.description),
            is_public: draft.is_public,
        };
        self.groups.insert(id, row);
        self.group(id)
    }

    /// Making a group private makes its topics and applications private too.
    pub fn update_group(&mut self, id: i64, draft: &GroupDraft) -> StoreResult<Group> {
        self.group_row(id)?;
        draft.validate()?;
        let name = draft.name.trim();
        if self.group_name_taken(name, Some(id)) {
            return Err(StoreError::Invalid(vec![codes::GROUP_ALREADY_EXISTS]));
        }
        let description = trimmed(&draft.description);
        let row = self
            .groups
            .get_mut(&id)
            .ok_or(StoreError::NotFound(codes::GROUP_NOT_FOUND))?;
        let going_private = row.is_public && !draft.is_public;
        row.name = name.to_string();
        row.description = description;
        row.is_public = draft.is_public;
        if going_private {
            self.topics
                .values_mut()
                .filter(|t| t.group == id)
                .for_each(|t| t.is_public = false);
            self.applications
                .values_mut()
                .filter(|a| a.group == id)
                .for_each(|a| a.is_public = false);
        }
        self.group(id)
    }

    /// Deletes the group with its memberships, topics, applications and every
    /// permission touching them.
    pub fn delete_group(&mut self, id: i64) -> StoreResult<()> {
        self.groups
            .remove(&id)
            .ok_or(StoreError::NotFound(codes::GROUP_NOT_FOUND))?;
        self.memberships.retain(|_, m| m.group != id);
        let topics: HashSet<i64> = self
            .topics
            .iter()
            .filter(|(_, t)| t.group == id)
            .map(|(tid, _)| *tid)
            .collect();
        let applications: HashSet<i64> = self
            .applications
            .iter()
            .filter(|(_, a)| a.group == id)
            .map(|(aid, _)| *aid)
            .collect();
        self.permissions
            .retain(|_, p| !topics.contains(&p.topic) && !applications.contains(&p.application));
        self.topics.retain(|tid, _| !topics.contains(tid));
        self.applications.retain(|aid, _| !applications.contains(aid));
        Ok(())
    }

    // -- users (group memberships) ------------------------------------------

    fn user_view(&self, id: i64, row: &MembershipRow) -> User {
        User {
            id,
            email: row.email.clone(),
            group: row.group,
            group_name: self.group_name(row.group),
            is_group_admin: row.is_group_admin,
            is_topic_admin: row.is_topic_admin,
            is_application_admin: row.is_application_admin,
        }
    }

    pub fn users(&self) -> Vec<User> {
        let rows = self
            .memberships
            .iter()
            .map(|(id, row)| self.user_view(*id, row))
            .collect();
        by_name(rows, |u: &User| format!("{}\u{0}{}", u.email, u.group_name))
    }

    pub fn user(&self, id: i64) -> StoreResult<User> {
        self.memberships
            .get(&id)
            .map(|row| self.user_view(id, row))
            .ok_or(StoreError::NotFound(codes::GROUP_MEMBERSHIP_NOT_FOUND))
    }

    fn membership_taken(&self, email: &str, group: i64, except: Option<i64>) -> bool {
        self.memberships.iter().any(|(id, m)| {
            Some(*id) != except && m.group == group && m.email.eq_ignore_ascii_case(email)
        })
    }

    pub fn create_user(&mut self, draft: &UserDraft) -> StoreResult<User> {
        draft.validate()?;
        self.group_row(draft.group)?;
        let email = draft.email.trim().to_lowercase();
        if self.membership_taken(&email, draft.group, None) {
            return Err(StoreError::Invalid(vec![codes::GROUP_MEMBERSHIP_ALREADY_EXISTS]));
        }
        let id = self.next_id();
        self.memberships.insert(
            id,
            MembershipRow {
                email,
                group: draft.group,
                is_group_admin: draft.is_group_admin,
                is_topic_admin: draft.is_topic_admin,
                is_application_admin: draft.is_application_admin,
            },
        );
        self.user(id)
    }

    /// Email and flags may change; the group may not.
    pub fn update_user(&mut self, id: i64, draft: &UserDraft) -> StoreResult<User> {
        let current_group = self.user(id)?.group;
        let draft = UserDraft {
            group: if draft.group == 0 { current_group } else { draft.group },
            ..draft.clone()
        };
        draft.validate()?;
        if draft.group != current_group {
            return Err(StoreError::Invalid(vec![
                codes::GROUP_MEMBERSHIP_REQUIRES_GROUP_ASSOCIATION,
            ]));
        }
        let email = draft.email.trim().to_lowercase();
        if self.membership_taken(&email, current_group, Some(id)) {
            return Err(StoreError::Invalid(vec![codes::GROUP_MEMBERSHIP_ALREADY_EXISTS]));
        }
        let row = self
            .memberships
            .get_mut(&id)
            .ok_or(StoreError::NotFound(codes::GROUP_MEMBERSHIP_NOT_FOUND))?;
        row.email = email;
        row.is_group_admin = draft.is_group_admin;
        row.is_topic_admin = draft.is_topic_admin;
        row.is_application_admin = draft.is_application_admin;
        self.user(id)
    }

    pub fn delete_user(&mut self, id: i64) -> StoreResult<()> {
        self.memberships
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(codes::GROUP_MEMBERSHIP_NOT_FOUND))
    }

    // -- super users --------------------------------------------------------

    pub fn super_users(&self) -> Vec<SuperUser> {
        let rows = self
            .super_users
            .iter()
            .map(|(id, email)| SuperUser {
                id: *id,
                email: email.clone(),
            })
            .collect();
        by_name(rows, |s: &SuperUser| s.email.clone())
    }

    pub fn super_user(&self, id: i64) -> StoreResult<SuperUser> {
        self.super_users
            .get(&id)
            .map(|email| SuperUser {
                id,
                email: email.clone(),
            })
            .ok_or(StoreError::NotFound(codes::USER_NOT_FOUND))
    }

    fn super_user_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.super_users
            .iter()
            .any(|(id, e)| Some(*id) != except && e.eq_ignore_ascii_case(email))
    }

    pub fn create_super_user(&mut self, draft: &SuperUserDraft) -> StoreResult<SuperUser> {
        draft.validate()?;
        let email = draft.email.trim().to_lowercase();
        if self.super_user_taken(&email, None) {
            return Err(StoreError::Invalid(vec![codes::USER_ALREADY_EXISTS]));
        }
        let id = self.next_id();
        self.super_users.insert(id, email);
        self.super_user(id)
    }

    pub fn update_super_user(&mut self, id: i64, draft: &SuperUserDraft) -> StoreResult<SuperUser> {
        self.super_user(id)?;
        draft.validate()?;
        let email = draft.email.trim().to_lowercase();
        if self.super_user_taken(&email, Some(id)) {
            return Err(StoreError::Invalid(vec![codes::USER_ALREADY_EXISTS]));
        }
        self.super_users.insert(id, email);
        self.super_user(id)
    }

    pub fn delete_super_user(&mut self, id: i64) -> StoreResult<()> {
        self.super_users
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(codes::USER_NOT_FOUND))
    }

    // -- topics -------------------------------------------------------------

    fn topic_view(&self, id: i64, row: &TopicRow) -> Topic {
        Topic {
            id,
            name: row.name.clone(),
            kind: row.kind,
            description: row.description.clone(),
            is_public: row.is_public,
            group: row.group,
            group_name: self.group_name(row.group),
            canonical_name: format!("{}.{}", row.group, row.name),
            date_created: row.date_created,
            date_updated: row.date_updated,
        }
    }

    pub fn topics(&self) -> Vec<Topic> {
        let rows = self
            .topics
            .iter()
            .map(|(id, row)| self.topic_view(*id, row))
            .collect();
        by_name(rows, |t: &Topic| t.name.clone())
    }

    pub fn topic(&self, id: i64) -> StoreResult<Topic> {
        self.topics
            .get(&id)
            .map(|row| self.topic_view(id, row))
            .ok_or(StoreError::NotFound(codes::TOPIC_NOT_FOUND))
    }

    fn topic_name_taken(&self, name: &str, group: i64, except: Option<i64>) -> bool {
        self.topics.iter().any(|(id, t)| {
            Some(*id) != except && t.group == group && t.name.eq_ignore_ascii_case(name)
        })
    }

    pub fn create_topic(&mut self, draft: &TopicDraft) -> StoreResult<Topic> {
        draft.validate()?;
        self.group_row(draft.group)?;
        let name = draft.name.trim();
        if self.topic_name_taken(name, draft.group, None) {
            return Err(StoreError::Invalid(vec![codes::TOPIC_ALREADY_EXISTS]));
        }
        let now = Utc::now();
        let id = self.next_id();
        self.topics.insert(
            id,
            TopicRow {
                name: name.to_string(),
                kind: draft.kind,
                description: trimmed(&draft.description),
                is_public: draft.is_public,
                group: draft.group,
                date_created: now,
                date_updated: now,
            },
        );
        self.topic(id)
    }

    /// Name, description and visibility may change; group and kind may not.
    pub fn update_topic(&mut self, id: i64, draft: &TopicDraft) -> StoreResult<Topic> {
        let current = self.topic(id)?;
        let draft = TopicDraft {
            group: if draft.group == 0 { current.group } else { draft.group },
            ..draft.clone()
        };
        draft.validate()?;
        if draft.group != current.group {
            return Err(StoreError::Invalid(vec![
                codes::TOPIC_CANNOT_UPDATE_GROUP_ASSOCIATION,
            ]));
        }
        let name = draft.name.trim();
        if self.topic_name_taken(name, current.group, Some(id)) {
            return Err(StoreError::Invalid(vec![codes::TOPIC_ALREADY_EXISTS]));
        }
        let row = self
            .topics
            .get_mut(&id)
            .ok_or(StoreError::NotFound(codes::TOPIC_NOT_FOUND))?;
        row.name = name.to_string();
        row.description = trimmed(&draft.description);
        row.is_public = draft.is_public;
        row.date_updated = Utc::now();
        self.topic(id)
    }

    pub fn delete_topic(&mut self, id: i64) -> StoreResult<()> {
        self.topics
            .remove(&id)
            .ok_or(StoreError::NotFound(codes::TOPIC_NOT_FOUND))?;
        self.permissions.retain(|_, p| p.topic != id);
        Ok(())
    }

    // -- applications -------------------------------------------------------

    fn application_view(&self, id: i64, row: &ApplicationRow) -> Application {
        Application {
            id,
            name: row.name.clone(),
            description: row.description.clone(),
            is_public: row.is_public,
            group: row.group,
            group_name: self.group_name(row.group),
            date_created: row.date_created,
            date_updated: row.date_updated,
        }
    }

    fn application_row_mut(&mut self, id: i64) -> StoreResult<&mut ApplicationRow> {
        self.applications
            .get_mut(&id)
            .ok_or(StoreError::NotFound(codes::APPLICATION_NOT_FOUND))
    }

    pub fn applications(&self) -> Vec<Application> {
        let rows = self
            .applications
            .iter()
            .map(|(id, row)| self.application_view(*id, row))
            .collect();
        by_name(rows, |a: &Application| a.name.clone())
    }

    pub fn application(&self, id: i64) -> StoreResult<Application> {
        self.applications
            .get(&id)
            .map(|row| self.application_view(id, row))
            .ok_or(StoreError::NotFound(codes::APPLICATION_NOT_FOUND))
    }

    fn application_name_taken(&self, name: &str, group: i64, except: Option<i64>) -> bool {
        self.applications.iter().any(|(id, a)| {
            Some(*id) != except && a.group == group && a.name.eq_ignore_ascii_case(name)
        })
    }

    pub fn create_application(&mut self, draft: &ApplicationDraft) -> StoreResult<Application> {
        draft.validate()?;
        self.group_row(draft.group)?;
        let name = draft.name.trim();
        if self.application_name_taken(name, draft.group, None) {
            return Err(StoreError::Invalid(vec![codes::APPLICATION_ALREADY_EXISTS]));
        }
        let now = Utc::now();
        let id = self.next_id();
        self.applications.insert(
            id,
            ApplicationRow {
                name: name.to_string(),
                description: trimmed(&draft.description),
                is_public: draft.is_public,
                group: draft.group,
                date_created: now,
                date_updated: now,
                password_hash: None,
                bind_token_hash: None,
            },
        );
        self.application(id)
    }

    pub fn update_application(
        &mut self,
        id: i64,
        draft: &ApplicationDraft,
    ) -> StoreResult<Application> {
        let current = self.application(id)?;
        let draft = ApplicationDraft {
            group: if draft.group == 0 { current.group } else { draft.group },
            ..draft.clone()
        };
        draft.validate()?;
        if draft.group != current.group {
            return Err(StoreError::Invalid(vec![
                codes::APPLICATION_CANNOT_UPDATE_GROUP_ASSOCIATION,
            ]));
        }
        let name = draft.name.trim();
        if self.application_name_taken(name, current.group, Some(id)) {
            return Err(StoreError::Invalid(vec![codes::APPLICATION_ALREADY_EXISTS]));
        }
        let row = self.application_row_mut(id)?;
        row.name = name.to_string();
        row.description = trimmed(&draft.description);
        row.is_public = draft.is_public;
        row.date_updated = Utc::now();
        self.application(id)
    }

    pub fn delete_application(&mut self, id: i64) -> StoreResult<()> {
        self.applications
            .remove(&id)
            .ok_or(StoreError::NotFound(codes::APPLICATION_NOT_FOUND))?;
        self.permissions.retain(|_, p| p.application != id);
        Ok(())
    }

    pub fn set_application_password(&mut self, id: i64, hash: String) -> StoreResult<()> {
        self.application_row_mut(id)?.password_hash = Some(hash);
        Ok(())
    }

    pub fn application_password_hash(&self, id: i64) -> Option<&str> {
        self.applications
            .get(&id)
            .and_then(|a| a.password_hash.as_deref())
    }

    /// Replaces the accepted bind token; earlier tokens stop verifying.
    pub fn set_bind_token_hash(&mut self, id: i64, hash: String) -> StoreResult<()> {
        self.application_row_mut(id)?.bind_token_hash = Some(hash);
        Ok(())
    }

    pub fn bind_token_hash(&self, id: i64) -> Option<&str> {
        self.applications
            .get(&id)
            .and_then(|a| a.bind_token_hash.as_deref())
    }

    // -- application permissions --------------------------------------------

    fn permission_view(&self, id: i64, row: &PermissionRow) -> ApplicationPermission {
        ApplicationPermission {
            id,
            application_id: row.application,
            application_name: self
                .applications
                .get(&row.application)
                .map(|a| a.name.clone())
                .unwrap_or_default(),
            topic_id: row.topic,
            topic_name: self
                .topics
                .get(&row.topic)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            read: row.access.read,
            write: row.access.write,
            read_partitions: row.access.read_partitions.clone(),
            write_partitions: row.access.write_partitions.clone(),
        }
    }

    pub fn permissions(&self) -> Vec<ApplicationPermission> {
        self.permissions
            .iter()
            .map(|(id, row)| self.permission_view(*id, row))
            .collect()
    }

    pub fn permission(&self, id: i64) -> StoreResult<ApplicationPermission> {
        self.permissions
            .get(&id)
            .map(|row| self.permission_view(id, row))
            .ok_or(StoreError::NotFound(codes::APPLICATION_PERMISSION_NOT_FOUND))
    }

    pub fn add_permission(
        &mut self,
        application: i64,
        topic: i64,
        access: AccessPermissionBody,
    ) -> StoreResult<ApplicationPermission> {
        self.application(application)?;
        self.topic(topic)?;
        if self
            .permissions
            .values()
            .any(|p| p.application == application && p.topic == topic)
        {
            return Err(StoreError::Invalid(vec![
                codes::APPLICATION_PERMISSION_ALREADY_EXISTS,
            ]));
        }
        let id = self.next_id();
        self.permissions.insert(
            id,
            PermissionRow {
                application,
                topic,
                access: trimmed_partitions(access),
            },
        );
        self.permission(id)
    }

    pub fn update_permission(
        &mut self,
        id: i64,
        access: AccessPermissionBody,
    ) -> StoreResult<ApplicationPermission> {
        let row = self
            .permissions
            .get_mut(&id)
            .ok_or(StoreError::NotFound(codes::APPLICATION_PERMISSION_NOT_FOUND))?;
        row.access = trimmed_partitions(access);
        self.permission(id)
    }

    pub fn delete_permission(&mut self, id: i64) -> StoreResult<()> {
        self.permissions
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(codes::APPLICATION_PERMISSION_NOT_FOUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alpha(store: &Store) -> i64 {
        store
            .groups()
            .into_iter()
            .find(|g| g.name == "Alpha")
            .map(|g| g.id)
            .unwrap()
    }

    #[test]
    fn seed_has_demo_entities() {
        let store = Store::seeded();
        let names: Vec<String> = store.groups().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Delta", "Gamma"]);
        assert!(store.is_super_user("unity-admin@test.test"));
        assert_eq!(store.applications().len(), 2);
        assert_eq!(store.topics().len(), 2);
    }

    #[test]
    fn revocation_drops_expired_entries() {
        let mut store = Store::seeded();
        let now = Utc::now().timestamp();
        store.revoke("stale", now - 60);
        assert!(store.is_revoked("stale"));
        store.revoke("fresh", now + 3600);
        assert!(!store.is_revoked("stale"));
        assert!(store.is_revoked("fresh"));
        assert_eq!(store.revoked.len(), 1);
    }

    #[test]
    fn group_counts_are_derived() {
        let store = Store::seeded();
        let group = store.group(alpha(&store)).unwrap();
        assert_eq!(group.membership_count, 2);
        assert_eq!(group.topic_count, 1);
        assert_eq!(group.application_count, 1);
    }

    #[test]
    fn duplicate_group_name_is_rejected() {
        let mut store = Store::seeded();
        let err = store.create_group(&GroupDraft::named("alpha")).unwrap_err();
        assert_eq!(err, StoreError::Invalid(vec![codes::GROUP_ALREADY_EXISTS]));
    }

    #[test]
    fn short_name_is_rejected() {
        let mut store = Store::new();
        let err = store.create_group(&GroupDraft::named("ab")).unwrap_err();
        assert_eq!(
            err,
            StoreError::Invalid(vec![codes::GROUP_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS])
        );
    }

    #[test]
    fn delete_group_cascades() {
        let mut store = Store::seeded();
        let id = alpha(&store);
        store.delete_group(id).unwrap();
        assert!(store.users().iter().all(|u| u.group != id));
        assert!(store.topics().iter().all(|t| t.group != id));
        assert!(store.applications().iter().all(|a| a.group != id));
        assert_eq!(
            store.delete_group(id),
            Err(StoreError::NotFound(codes::GROUP_NOT_FOUND))
        );
    }

    #[test]
    fn making_group_private_cascades() {
        let mut store = Store::new();
        let mut draft = GroupDraft::named("Public Group");
        draft.is_public = true;
        let group = store.create_group(&draft).unwrap();
        let mut topic = TopicDraft::named("Open Topic");
        topic.is_public = true;
        topic.group = group.id;
        let topic = store.create_topic(&topic).unwrap();
        assert!(topic.is_public);

        draft.is_public = false;
        store.update_group(group.id, &draft).unwrap();
        assert!(!store.topic(topic.id).unwrap().is_public);
    }

    #[test]
    fn topic_canonical_name_and_group_lock() {
        let mut store = Store::seeded();
        let group = alpha(&store);
        let mut draft = TopicDraft::named("Sensor Data");
        draft.group = group;
        let topic = store.create_topic(&draft).unwrap();
        assert_eq!(topic.canonical_name, format!("{group}.Sensor Data"));
        assert_eq!(topic.group_name, "Alpha");

        draft.group = group + 1;
        assert_eq!(
            store.update_topic(topic.id, &draft).unwrap_err(),
            StoreError::Invalid(vec![codes::TOPIC_CANNOT_UPDATE_GROUP_ASSOCIATION])
        );
    }

    #[test]
    fn membership_flags_update() {
        let mut store = Store::seeded();
        let user = store
            .users()
            .into_iter()
            .find(|u| u.email == "jgilbert@test.test" && u.group_name == "Alpha")
            .unwrap();
        assert!(!user.is_topic_admin);
        let mut draft = UserDraft::from(&user);
        draft.is_topic_admin = true;
        let updated = store.update_user(user.id, &draft).unwrap();
        assert!(updated.is_topic_admin);
        assert!(store.permissions_of("jgilbert@test.test")[0].is_topic_admin);
    }

    #[test]
    fn principal_lookup_accepts_unique_local_part() {
        let store = Store::seeded();
        assert_eq!(
            store.find_principal("unity-admin").as_deref(),
            Some("unity-admin@test.test")
        );
        assert_eq!(
            store.find_principal("KSTANLEY@test.test").as_deref(),
            Some("kstanley@test.test")
        );
        assert!(store.find_principal("nobody").is_none());
    }

    #[test]
    fn permissions_are_unique_per_application_and_topic() {
        let mut store = Store::seeded();
        let app = store.applications()[0].id;
        let topic = store.topics()[0].id;
        let access = AccessPermissionBody::new(true, false);
        let perm = store.add_permission(app, topic, access.clone()).unwrap();
        assert_eq!(perm.application_id, app);
        assert_eq!(
            store.add_permission(app, topic, access).unwrap_err(),
            StoreError::Invalid(vec![codes::APPLICATION_PERMISSION_ALREADY_EXISTS])
        );
        store.delete_topic(topic).unwrap();
        assert!(store.permissions().is_empty());
    }

    #[test]
    fn partitions_are_trimmed_and_replaced_on_update() {
        let mut store = Store::seeded();
        let app = store.applications()[0].id;
        let topic = store.topics()[0].id;
        let access = AccessPermissionBody {
            read_partitions: [" sensors ", "", "alerts"].map(String::from).into(),
            ..AccessPermissionBody::new(true, false)
        };
        let perm = store.add_permission(app, topic, access).unwrap();
        let names: Vec<&str> = perm.read_partitions.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["alerts", "sensors"]);
        assert!(perm.write_partitions.is_empty());

        let access = AccessPermissionBody {
            write_partitions: ["ops".to_string()].into(),
            ..AccessPermissionBody::new(false, true)
        };
        let perm = store.update_permission(perm.id, access).unwrap();
        assert!(perm.read_partitions.is_empty());
        assert!(perm.write_partitions.contains("ops"));
        assert!(perm.write && !perm.read);
    }
}
