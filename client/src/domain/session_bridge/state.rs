//! Observable session state and the loading guard.

use tokio::sync::watch;

use crate::domain::User;

/// Snapshot of the bridge's state as presentation code sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    loading: bool,
}

impl SessionState {
    /// State before bootstrap has run: nobody signed in, still loading.
    pub(super) const fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Whether an operation or bootstrap is in flight.
    pub const fn loading(&self) -> bool {
        self.loading
    }

    /// Whether a user is installed.
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Single writer handle over the published state.
///
/// Every user write replaces the whole value in one assignment; concurrent
/// writers resolve as last-write-wins.
#[derive(Debug)]
pub(super) struct StateCell {
    sender: watch::Sender<SessionState>,
}

impl StateCell {
    pub(super) fn new() -> Self {
        Self {
            sender: watch::Sender::new(SessionState::initial()),
        }
    }

    pub(super) fn snapshot(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    pub(super) fn install(&self, user: User) {
        self.sender.send_modify(|state| state.user = Some(user));
    }

    pub(super) fn clear(&self) {
        self.sender.send_modify(|state| state.user = None);
    }

    pub(super) fn set_loading(&self, loading: bool) {
        self.sender.send_if_modified(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    /// Raise the loading flag until the returned guard drops.
    pub(super) fn loading(&self) -> LoadingGuard<'_> {
        self.set_loading(true);
        LoadingGuard { cell: self }
    }
}

/// Clears the loading flag on every exit path, including early returns.
pub(super) struct LoadingGuard<'a> {
    cell: &'a StateCell,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.cell.set_loading(false);
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{UserId, UserParts};

    fn user(id: &str) -> User {
        User::new(UserParts {
            id: UserId::new(id).expect("valid id"),
            email: format!("{id}@example.com"),
            first_name: None,
            last_name: None,
            role: None,
            status: None,
        })
    }

    #[test]
    fn starts_loading_without_user() {
        let cell = StateCell::new();
        let state = cell.snapshot();
        assert!(state.loading());
        assert!(state.user().is_none());
    }

    #[test]
    fn guard_clears_loading_on_drop() {
        let cell = StateCell::new();
        cell.set_loading(false);
        {
            let _guard = cell.loading();
            assert!(cell.snapshot().loading());
        }
        assert!(!cell.snapshot().loading());
    }

    #[test]
    fn later_install_replaces_earlier_user() {
        let cell = StateCell::new();
        cell.install(user("first"));
        cell.install(user("second"));
        let state = cell.snapshot();
        assert_eq!(state.user().map(|u| u.id().to_string()), Some("second".to_owned()));
    }

    #[test]
    fn subscribers_observe_clear() {
        let cell = StateCell::new();
        cell.install(user("u1"));
        let mut receiver = cell.subscribe();
        receiver.mark_unchanged();
        cell.clear();
        assert!(receiver.has_changed().expect("sender alive"));
        assert!(!receiver.borrow_and_update().is_authenticated());
    }
}
