//! Session context: the current profile and what it derives.
//!
//! One `SessionContext` is created at application start and passed down to
//! whatever needs it. Replacing the profile is atomic; every derived view is
//! recomputed from the profile on read, and watchers are notified on change.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::kind::EntityKind;
use crate::models::{GroupPermissions, Profile};

/// Shared handle to the session. Clones observe the same profile.
#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<Profile>>>,
}

impl SessionContext {
    /// Start logged out.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the session, returning the previous profile.
    pub fn set_profile(&self, profile: Option<Profile>) -> Option<Profile> {
        debug!(
            name = profile.as_ref().map(|p| p.name.as_str()),
            "session profile replaced"
        );
        self.tx.send_replace(profile)
    }

    /// Back to the logged-out state.
    pub fn clear(&self) -> Option<Profile> {
        self.set_profile(None)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.tx.borrow().as_ref().is_some_and(Profile::is_admin)
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_profile(self.tx.borrow().as_ref())
    }

    /// Watch derived state changes.
    pub fn subscribe(&self) -> SessionWatcher {
        SessionWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Tear down at application exit: clears the profile so watchers observe
    /// the logged-out state before the handle goes away.
    pub fn dispose(self) {
        self.clear();
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Receives a fresh [`SessionState`] each time the profile is replaced.
#[derive(Debug)]
pub struct SessionWatcher {
    rx: watch::Receiver<Option<Profile>>,
}

impl SessionWatcher {
    pub fn current(&self) -> SessionState {
        SessionState::from_profile(self.rx.borrow().as_ref())
    }

    /// Wait for the next replacement. `None` once every context handle is gone.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(SessionState::from_profile(self.rx.borrow_and_update().as_ref()))
    }
}

/// Read-only view derived from the profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub authenticated: bool,
    pub admin: bool,
    pub name: Option<String>,
    pub permissions_by_group: Vec<GroupPermissions>,
}

/// Which admin-only controls a table should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub add: bool,
    pub edit: bool,
    pub delete: bool,
}

impl Controls {
    const ALL: Controls = Controls {
        add: true,
        edit: true,
        delete: true,
    };
    const NONE: Controls = Controls {
        add: false,
        edit: false,
        delete: false,
    };
}

impl SessionState {
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        match profile {
            None => Self::default(),
            Some(p) => Self {
                authenticated: true,
                admin: p.is_admin(),
                name: Some(p.name.clone()),
                permissions_by_group: p.permissions_by_group.clone(),
            },
        }
    }

    pub fn show_super_user_tab(&self) -> bool {
        self.admin
    }

    /// Controls for `kind`, either within one group or across any group.
    pub fn controls(&self, kind: EntityKind, group: Option<i64>) -> Controls {
        if !self.authenticated {
            return Controls::NONE;
        }
        if self.admin {
            return Controls::ALL;
        }
        let granted = |p: &GroupPermissions| match kind {
            EntityKind::Group | EntityKind::User => p.is_group_admin,
            EntityKind::Topic => p.is_topic_admin,
            EntityKind::Application => p.is_application_admin,
            EntityKind::SuperUser => false,
        };
        let allowed = self
            .permissions_by_group
            .iter()
            .filter(|p| group.is_none_or(|g| g == p.group_id))
            .any(granted);
        match kind {
            // Creating and deleting groups stays with super users.
            EntityKind::Group => Controls {
                add: false,
                edit: allowed,
                delete: false,
            },
            _ if allowed => Controls::ALL,
            _ => Controls::NONE,
        }
    }
}
