//! In-memory stand-ins for the hosted auth service and table API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{
    AuthGateway, AuthGatewayError, AuthSubscription, NewUserRecord, NewVendorRecord,
    ProfileRepository, ProfileRepositoryError, SignUpOutcome,
};
use crate::domain::{
    LoginCredentials, OAuthProvider, ProfileUpdate, RawUserRecord, RawVendorRecord, Registration,
    Session, SessionEvent, UserId, VendorJoin,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
struct Account {
    id: UserId,
    password: String,
}

#[derive(Default)]
struct AuthState {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    callbacks: HashMap<String, Session>,
    listeners: Vec<mpsc::UnboundedSender<SessionEvent>>,
    failures: HashMap<&'static str, AuthGatewayError>,
    require_confirmation: bool,
    reset_requests: Vec<String>,
}

/// Auth provider double.
///
/// Accounts live in memory; sign-in and sign-out announce events to
/// subscribers the way the hosted provider does. Any operation can be made
/// to fail once with [`InMemoryAuthGateway::fail_next`].
#[derive(Default)]
pub struct InMemoryAuthGateway {
    state: Mutex<AuthState>,
    calls: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl InMemoryAuthGateway {
    /// Register an account that can sign in.
    pub fn with_account(self, email: &str, password: &str, id: &UserId) -> Self {
        lock(&self.state).accounts.insert(
            email.to_owned(),
            Account {
                id: id.clone(),
                password: password.to_owned(),
            },
        );
        self
    }

    /// Start with `session` already held, as after a page reload.
    pub fn with_session(self, session: Session) -> Self {
        lock(&self.state).session = Some(session);
        self
    }

    /// Accept a redirect carrying `session`'s access token, as the provider
    /// issues after a completed OAuth consent or email link.
    pub fn with_callback(self, session: Session) -> Self {
        lock(&self.state)
            .callbacks
            .insert(session.access_token().to_owned(), session);
        self
    }

    /// Make sign-up answer without a session, as when email confirmation is
    /// enabled.
    pub fn requiring_confirmation(self) -> Self {
        lock(&self.state).require_confirmation = true;
        self
    }

    /// Fail the next call to `operation` (the trait method name) with
    /// `error`.
    pub fn fail_next(&self, operation: &'static str, error: AuthGatewayError) {
        lock(&self.state).failures.insert(operation, error);
    }

    /// Push an event to every subscriber.
    pub fn push(&self, event: SessionEvent) {
        Self::announce(&mut lock(&self.state), &event);
    }

    /// Number of provider calls made, excluding `subscribe`.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of subscriptions released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Session currently held by the provider.
    pub fn session(&self) -> Option<Session> {
        lock(&self.state).session.clone()
    }

    /// Emails a reset was requested for.
    pub fn reset_requests(&self) -> Vec<String> {
        lock(&self.state).reset_requests.clone()
    }

    fn enter(&self, operation: &'static str) -> Result<(), AuthGatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.state).failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn announce(state: &mut AuthState, event: &SessionEvent) {
        state.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[async_trait]
impl AuthGateway for InMemoryAuthGateway {
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, AuthGatewayError> {
        self.enter("sign_in_with_password")?;
        let mut state = lock(&self.state);
        let account = state
            .accounts
            .get(credentials.email())
            .filter(|account| account.password == credentials.password())
            .cloned()
            .ok_or_else(|| AuthGatewayError::rejected("Invalid login credentials"))?;
        let session = Session::new(account.id, format!("token-{}", Uuid::new_v4()))
            .with_email(Some(credentials.email().to_owned()));
        state.session = Some(session.clone());
        Self::announce(&mut state, &SessionEvent::SignedIn(Some(session.clone())));
        Ok(session)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> Result<Url, AuthGatewayError> {
        self.enter("sign_in_with_oauth")?;
        let mut url = Url::parse("https://auth.example.test/authorize")
            .map_err(|error| AuthGatewayError::transport(error.to_string()))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("redirect_to", redirect_to.as_str());
        Ok(url)
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        _redirect_to: &Url,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        self.enter("sign_up")?;
        let email = registration.credentials().email().to_owned();
        let mut state = lock(&self.state);
        if state.accounts.contains_key(&email) {
            return Err(AuthGatewayError::rejected("User already registered"));
        }
        let id = UserId::new(Uuid::new_v4().to_string())
            .map_err(|error| AuthGatewayError::decode(error.to_string()))?;
        state.accounts.insert(
            email.clone(),
            Account {
                id: id.clone(),
                password: registration.credentials().password().to_owned(),
            },
        );
        if state.require_confirmation {
            return Ok(SignUpOutcome {
                user_id: id,
                session: None,
            });
        }
        let session = Session::new(id.clone(), format!("token-{}", Uuid::new_v4()))
            .with_email(Some(email));
        state.session = Some(session.clone());
        Self::announce(&mut state, &SessionEvent::SignedIn(Some(session.clone())));
        Ok(SignUpOutcome {
            user_id: id,
            session: Some(session),
        })
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        self.enter("sign_out")?;
        let mut state = lock(&self.state);
        state.session = None;
        Self::announce(&mut state, &SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        self.enter("current_session")?;
        Ok(self.session())
    }

    async fn current_user_id(&self) -> Result<Option<UserId>, AuthGatewayError> {
        self.enter("current_user_id")?;
        Ok(self.session().map(|session| session.user_id().clone()))
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthGatewayError> {
        self.enter("update_password")?;
        let mut state = lock(&self.state);
        let Some(user_id) = state.session.as_ref().map(|session| session.user_id().clone()) else {
            return Err(AuthGatewayError::rejected("Auth session missing"));
        };
        if let Some(account) = state
            .accounts
            .values_mut()
            .find(|account| account.id == user_id)
        {
            account.password = new_password.to_owned();
        }
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        _redirect_to: &Url,
    ) -> Result<(), AuthGatewayError> {
        self.enter("reset_password_for_email")?;
        lock(&self.state).reset_requests.push(email.to_owned());
        Ok(())
    }

    fn discard_local_session(&self) {
        let mut state = lock(&self.state);
        if state.session.take().is_some() {
            Self::announce(&mut state, &SessionEvent::SignedOut);
        }
    }

    async fn session_from_callback(&self, callback: &Url) -> Result<Session, AuthGatewayError> {
        self.enter("session_from_callback")?;
        let params: HashMap<String, String> = callback
            .fragment()
            .map(|fragment| url::form_urlencoded::parse(fragment.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        if let Some(reason) = params.get("error_description") {
            return Err(AuthGatewayError::rejected(reason.clone()));
        }
        let mut state = lock(&self.state);
        let session = params
            .get("access_token")
            .and_then(|token| state.callbacks.remove(token))
            .ok_or_else(|| AuthGatewayError::rejected("Invalid callback"))?;
        state.session = Some(session.clone());
        Self::announce(&mut state, &SessionEvent::SignedIn(Some(session.clone())));
        Ok(session)
    }

    fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.state).listeners.push(tx);
        let released = Arc::clone(&self.released);
        AuthSubscription::new(rx, move || {
            released.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Pauses `find_user` until released, to stage interleavings.
#[derive(Clone, Default)]
pub struct LookupGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl LookupGate {
    /// Wait until a lookup is parked at the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the parked lookup continue.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct TableState {
    users: HashMap<UserId, RawUserRecord>,
    vendors: HashMap<UserId, RawVendorRecord>,
    failures: HashMap<&'static str, ProfileRepositoryError>,
    gate: Option<LookupGate>,
}

/// `users`/`vendors` table double.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    state: Mutex<TableState>,
    calls: AtomicUsize,
}

impl InMemoryProfileRepository {
    /// Seed a `users` row.
    pub fn with_row(self, row: RawUserRecord) -> Self {
        if let Some(id) = row.id.clone() {
            lock(&self.state).users.insert(id, row);
        }
        self
    }

    /// Fail the next call to `operation` with `error`.
    pub fn fail_next(&self, operation: &'static str, error: ProfileRepositoryError) {
        lock(&self.state).failures.insert(operation, error);
    }

    /// Park the next `find_user` call until the returned gate is released.
    pub fn gate_next_lookup(&self) -> LookupGate {
        let gate = LookupGate::default();
        lock(&self.state).gate = Some(gate.clone());
        gate
    }

    /// Number of table calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stored `users` row for `id`, without the vendor join.
    pub fn user_row(&self, id: &UserId) -> Option<RawUserRecord> {
        lock(&self.state).users.get(id).cloned()
    }

    /// Stored `vendors` row owned by `id`.
    pub fn vendor_row(&self, id: &UserId) -> Option<RawVendorRecord> {
        lock(&self.state).vendors.get(id).cloned()
    }

    fn enter(&self, operation: &'static str) -> Result<(), ProfileRepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match lock(&self.state).failures.remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn joined(state: &TableState, id: &UserId) -> Option<RawUserRecord> {
        let mut row = state.users.get(id)?.clone();
        if let Some(vendor) = state.vendors.get(id) {
            row.vendors = Some(VendorJoin::Many(vec![vendor.clone()]));
        }
        Some(row)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_user(
        &self,
        id: &UserId,
    ) -> Result<Option<RawUserRecord>, ProfileRepositoryError> {
        self.enter("find_user")?;
        let gate = lock(&self.state).gate.take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        Ok(Self::joined(&lock(&self.state), id))
    }

    async fn insert_user(&self, record: &NewUserRecord) -> Result<(), ProfileRepositoryError> {
        self.enter("insert_user")?;
        let mut state = lock(&self.state);
        if state.users.contains_key(&record.id) {
            return Err(ProfileRepositoryError::rejected(
                "duplicate key value violates unique constraint \"users_pkey\"",
            ));
        }
        state.users.insert(
            record.id.clone(),
            RawUserRecord {
                id: Some(record.id.clone()),
                email: Some(record.email.clone()),
                first_name: record.first_name.clone(),
                last_name: record.last_name.clone(),
                role: Some(record.role.as_str().to_owned()),
                status: Some(record.status.clone()),
                phone: record.phone.clone(),
                ..RawUserRecord::default()
            },
        );
        Ok(())
    }

    async fn update_user(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<RawUserRecord>, ProfileRepositoryError> {
        self.enter("update_user")?;
        let mut state = lock(&self.state);
        let Some(row) = state.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(first_name) = &update.first_name {
            row.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            row.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &update.phone {
            row.phone = Some(phone.clone());
        }
        if let Some(avatar) = &update.avatar {
            row.avatar = Some(avatar.clone());
        }
        // The update endpoint returns the bare row without the vendor join.
        Ok(Some(row.clone()))
    }

    async fn insert_vendor(&self, record: &NewVendorRecord) -> Result<(), ProfileRepositoryError> {
        self.enter("insert_vendor")?;
        lock(&self.state).vendors.insert(
            record.user_id.clone(),
            RawVendorRecord {
                id: format!("vendor-{}", record.user_id),
                shopname: Some(record.shopname.clone()),
                status: Some(record.status.clone()),
            },
        );
        Ok(())
    }
}
