//! Session bridge behaviour against the in-memory platform doubles.
//!
//! Tests run on the current-thread runtime, so the listener task only
//! progresses when the test yields. Interleavings are staged with
//! `LookupGate`.

use std::sync::Arc;
use std::time::Duration;

use marketplace_client::domain::ports::AuthGatewayError;
use marketplace_client::domain::{
    Destination, ErrorCode, ProfileUpdate, RawUserRecord, RegistrationForm, Role, Session,
    SessionBridge, SessionBridgePorts, SessionEvent, SessionHandle, SessionState, UserId,
    map_profile,
};
use marketplace_client::test_support::{
    InMemoryAuthGateway, InMemoryProfileRepository, Notification, RecordingNavigator,
    RecordingNotifier,
};
use rstest::rstest;
use tokio::time::timeout;
use url::Url;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    auth: Arc<InMemoryAuthGateway>,
    profiles: Arc<InMemoryProfileRepository>,
    navigator: Arc<RecordingNavigator>,
    notifier: Arc<RecordingNotifier>,
    bridge: SessionBridge,
}

impl Harness {
    fn new(auth: InMemoryAuthGateway, profiles: InMemoryProfileRepository) -> Self {
        let auth = Arc::new(auth);
        let profiles = Arc::new(profiles);
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let bridge = SessionBridge::new(
            SessionBridgePorts {
                auth: auth.clone(),
                profiles: profiles.clone(),
                navigator: navigator.clone(),
                notifier: notifier.clone(),
            },
            Url::parse("http://localhost:3000/auth/callback").expect("valid url"),
        );
        Self {
            auth,
            profiles,
            navigator,
            notifier,
            bridge,
        }
    }

    async fn started(&self) -> SessionHandle {
        let mut handle = self.bridge.start();
        timeout(WAIT, handle.ready())
            .await
            .expect("bootstrap finishes");
        handle
    }

    async fn wait_until(&self, predicate: impl FnMut(&SessionState) -> bool) {
        let mut rx = self.bridge.watch();
        timeout(WAIT, rx.wait_for(predicate))
            .await
            .expect("state reached in time")
            .expect("bridge still alive");
    }
}

fn id(raw: &str) -> UserId {
    UserId::new(raw).expect("valid user id")
}

fn row(raw_id: &str, email: &str, role: &str) -> RawUserRecord {
    RawUserRecord {
        id: Some(id(raw_id)),
        email: Some(email.to_owned()),
        first_name: Some("Ana".to_owned()),
        last_name: Some("Lee".to_owned()),
        role: Some(role.to_owned()),
        status: Some("ACTIVE".to_owned()),
        ..RawUserRecord::default()
    }
}

fn user_id_of(state: &SessionState) -> Option<String> {
    state.user().map(|user| user.id().to_string())
}

#[rstest]
#[case("ADMIN", Destination::Admin)]
#[case("MANAGER", Destination::Manager)]
#[case("VENDOR", Destination::Vendor)]
#[case("CUSTOMER", Destination::Customer)]
#[tokio::test]
async fn login_lands_on_role_dashboard(#[case] role: &str, #[case] expected: Destination) {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", role)),
    );
    let handle = harness.started().await;

    harness
        .bridge
        .login("ana@example.com", "secret1")
        .await
        .expect("login succeeds");

    assert_eq!(harness.navigator.last(), Some(expected));
    handle.shutdown().await;
}

#[tokio::test]
async fn login_publishes_mapped_profile_and_clears_loading() {
    let stored = row("u1", "ana@example.com", "CUSTOMER");
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
        InMemoryProfileRepository::default().with_row(stored.clone()),
    );
    let handle = harness.started().await;

    harness
        .bridge
        .login("ana@example.com", "secret1")
        .await
        .expect("login succeeds");

    let state = harness.bridge.snapshot();
    assert_eq!(state.user(), map_profile(&stored).as_ref());
    assert!(!state.loading());
    assert_eq!(
        harness.notifier.shown().last(),
        Some(&Notification::Success("Logged in successfully".to_owned()))
    );
    handle.shutdown().await;
}

#[tokio::test]
async fn wrong_password_surfaces_provider_message() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", "CUSTOMER")),
    );
    let handle = harness.started().await;

    let err = harness
        .bridge
        .login("ana@example.com", "nope123")
        .await
        .expect_err("login rejected");

    assert_eq!(err.message(), "Invalid login credentials");
    assert_eq!(harness.notifier.errors(), vec!["Invalid login credentials"]);
    assert!(harness.bridge.current_user().is_none());
    assert!(!harness.bridge.is_loading());
    assert!(harness.navigator.visits().is_empty());
    handle.shutdown().await;
}

#[tokio::test]
async fn logout_clears_user_and_returns_to_landing() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", "VENDOR")),
    );
    let handle = harness.started().await;
    harness
        .bridge
        .login("ana@example.com", "secret1")
        .await
        .expect("login succeeds");

    harness.bridge.logout().await.expect("logout succeeds");

    assert!(harness.bridge.current_user().is_none());
    assert!(harness.auth.session().is_none());
    assert_eq!(harness.navigator.last(), Some(Destination::Landing));
    handle.shutdown().await;
}

#[tokio::test]
async fn failed_logout_does_not_let_refresh_restore_the_user() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", "CUSTOMER")),
    );
    let handle = harness.started().await;
    harness
        .bridge
        .login("ana@example.com", "secret1")
        .await
        .expect("login succeeds");

    harness
        .auth
        .fail_next("sign_out", AuthGatewayError::transport("connection reset"));
    let error = harness.bridge.logout().await.expect_err("provider unreachable");
    assert_eq!(error.code(), ErrorCode::Backend);
    assert!(harness.auth.session().is_none());

    harness
        .bridge
        .refresh_token()
        .await
        .expect("refresh finds no session");
    harness.wait_until(|state| state.user().is_none()).await;
    assert!(harness.bridge.current_user().is_none());
    assert_eq!(harness.navigator.last(), Some(Destination::Landing));
    handle.shutdown().await;
}

#[tokio::test]
async fn oauth_callback_adopts_redirect_session_and_creates_customer() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_callback(
            Session::new(id("u7"), "callback-token")
                .with_email(Some("new@example.com".to_owned())),
        ),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;
    let callback = Url::parse(
        "http://localhost:3000/auth/callback#access_token=callback-token&token_type=bearer",
    )
    .expect("valid callback");

    harness
        .bridge
        .complete_oauth_callback(&callback)
        .await
        .expect("callback completes");

    let user = harness.bridge.current_user().expect("user installed");
    assert_eq!(user.id().to_string(), "u7");
    assert_eq!(user.role(), Some(Role::Customer));
    assert!(harness.profiles.user_row(&id("u7")).is_some());
    assert_eq!(
        harness.auth.session().map(|session| session.access_token().to_owned()),
        Some("callback-token".to_owned())
    );
    assert_eq!(harness.navigator.last(), Some(Destination::Customer));
    handle.shutdown().await;
}

#[tokio::test]
async fn unknown_callback_token_is_refused() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;
    let callback = Url::parse("http://localhost:3000/auth/callback#access_token=forged")
        .expect("valid callback");

    let error = harness
        .bridge
        .complete_oauth_callback(&callback)
        .await
        .expect_err("token not issued");
    assert_eq!(error.code(), ErrorCode::Unauthorized);
    assert_eq!(error.message(), "Invalid callback");
    assert!(harness.bridge.current_user().is_none());
    assert_eq!(harness.profiles.calls(), 0);
    handle.shutdown().await;
}

#[tokio::test]
async fn profile_update_without_user_makes_no_backend_call() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;
    let auth_calls = harness.auth.calls();

    let err = harness
        .bridge
        .update_profile(ProfileUpdate {
            first_name: Some("Bo".to_owned()),
            ..ProfileUpdate::default()
        })
        .await
        .expect_err("nobody signed in");

    assert_eq!(err.code(), ErrorCode::Precondition);
    assert_eq!(harness.profiles.calls(), 0);
    assert_eq!(harness.auth.calls(), auth_calls);
    assert_eq!(harness.notifier.errors().len(), 1);
    handle.shutdown().await;
}

#[tokio::test]
async fn profile_update_keeps_vendor_summary() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;
    harness
        .bridge
        .register(RegistrationForm {
            email: "lee@example.com".to_owned(),
            password: "secret1".to_owned(),
            first_name: "Lee".to_owned(),
            last_name: "Chan".to_owned(),
            role: Some(Role::Vendor),
            phone: None,
            shop_name: Some("Lee Co".to_owned()),
        })
        .await
        .expect("registration succeeds");

    harness
        .bridge
        .update_profile(ProfileUpdate {
            phone: Some("555-0100".to_owned()),
            ..ProfileUpdate::default()
        })
        .await
        .expect("update succeeds");

    let user = harness.bridge.current_user().expect("user installed");
    assert_eq!(user.phone(), Some("555-0100"));
    assert_eq!(
        user.vendor().and_then(|vendor| vendor.shopname.as_deref()),
        Some("Lee Co")
    );
    handle.shutdown().await;
}

#[tokio::test]
async fn vendor_registration_end_to_end() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;

    harness
        .bridge
        .register(RegistrationForm {
            email: "lee@example.com".to_owned(),
            password: "secret1".to_owned(),
            first_name: "Lee".to_owned(),
            last_name: "Chan".to_owned(),
            role: Some(Role::Vendor),
            phone: None,
            shop_name: Some("Lee Co".to_owned()),
        })
        .await
        .expect("registration succeeds");

    let user = harness.bridge.current_user().expect("user installed");
    assert_eq!(user.role(), Some(Role::Vendor));
    assert_eq!(user.name(), "Lee Chan");
    assert_eq!(harness.navigator.last(), Some(Destination::Vendor));
    let vendor = harness
        .profiles
        .vendor_row(user.id())
        .expect("vendor row written");
    assert_eq!(vendor.shopname.as_deref(), Some("Lee Co"));
    handle.shutdown().await;
}

#[tokio::test]
async fn confirmation_pending_registration_writes_no_rows() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().requiring_confirmation(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;

    harness
        .bridge
        .register(RegistrationForm {
            email: "kim@example.com".to_owned(),
            password: "secret1".to_owned(),
            first_name: "Kim".to_owned(),
            last_name: "Park".to_owned(),
            role: None,
            phone: None,
            shop_name: None,
        })
        .await
        .expect("sign-up accepted");

    assert_eq!(harness.profiles.calls(), 0);
    assert!(harness.bridge.current_user().is_none());
    assert_eq!(harness.navigator.last(), Some(Destination::Login));
    handle.shutdown().await;
}

#[tokio::test]
async fn snake_and_camel_rows_publish_the_same_user() {
    let snake = row("u1", "ana@example.com", "CUSTOMER");
    let camel = RawUserRecord {
        first_name: None,
        last_name: None,
        first_name_camel: Some("Ana".to_owned()),
        last_name_camel: Some("Lee".to_owned()),
        ..snake.clone()
    };

    let mut published = Vec::new();
    for stored in [snake, camel] {
        let harness = Harness::new(
            InMemoryAuthGateway::default().with_account("ana@example.com", "secret1", &id("u1")),
            InMemoryProfileRepository::default().with_row(stored),
        );
        let handle = harness.started().await;
        harness
            .bridge
            .login("ana@example.com", "secret1")
            .await
            .expect("login succeeds");
        published.push(harness.bridge.current_user());
        handle.shutdown().await;
    }

    assert_eq!(published.first(), published.last());
    assert_eq!(
        published
            .first()
            .and_then(Option::as_ref)
            .map(|user| user.name().to_owned()),
        Some("Ana Lee".to_owned())
    );
}

#[tokio::test]
async fn bootstrap_restores_existing_session() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_session(Session::new(id("u1"), "token")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", "MANAGER")),
    );
    assert!(harness.bridge.is_loading());

    let handle = harness.started().await;

    let state = harness.bridge.snapshot();
    assert_eq!(user_id_of(&state), Some("u1".to_owned()));
    assert!(!state.loading());
    assert!(harness.navigator.visits().is_empty());
    handle.shutdown().await;
}

#[tokio::test]
async fn late_bootstrap_write_overrides_earlier_event() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_session(Session::new(id("u1"), "token-1")),
        InMemoryProfileRepository::default()
            .with_row(row("u1", "ana@example.com", "VENDOR"))
            .with_row(row("u2", "bo@example.com", "CUSTOMER")),
    );
    let gate = harness.profiles.gate_next_lookup();
    let mut handle = harness.bridge.start();
    timeout(WAIT, gate.entered())
        .await
        .expect("bootstrap parked");

    harness
        .auth
        .push(SessionEvent::SignedIn(Some(Session::new(id("u2"), "token-2"))));
    harness
        .wait_until(|state| user_id_of(state).as_deref() == Some("u2"))
        .await;

    gate.release();
    timeout(WAIT, handle.ready())
        .await
        .expect("bootstrap finishes");

    assert_eq!(
        user_id_of(&harness.bridge.snapshot()),
        Some("u1".to_owned())
    );
    handle.shutdown().await;
}

#[tokio::test]
async fn late_event_write_overrides_bootstrap() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_session(Session::new(id("u1"), "token-1")),
        InMemoryProfileRepository::default()
            .with_row(row("u1", "ana@example.com", "VENDOR"))
            .with_row(row("u2", "bo@example.com", "CUSTOMER")),
    );
    let handle = harness.started().await;
    assert_eq!(
        user_id_of(&harness.bridge.snapshot()),
        Some("u1".to_owned())
    );

    harness
        .auth
        .push(SessionEvent::SignedIn(Some(Session::new(id("u2"), "token-2"))));
    harness
        .wait_until(|state| user_id_of(state).as_deref() == Some("u2"))
        .await;

    assert!(!harness.bridge.is_loading());
    handle.shutdown().await;
}

#[tokio::test]
async fn signed_out_event_during_bootstrap_is_overwritten_by_bootstrap() {
    let harness = Harness::new(
        InMemoryAuthGateway::default().with_session(Session::new(id("u1"), "token-1")),
        InMemoryProfileRepository::default().with_row(row("u1", "ana@example.com", "ADMIN")),
    );
    let gate = harness.profiles.gate_next_lookup();
    let mut handle = harness.bridge.start();
    timeout(WAIT, gate.entered())
        .await
        .expect("bootstrap parked");

    harness.auth.push(SessionEvent::SignedOut);
    harness.wait_until(|state| !state.loading()).await;
    assert!(harness.bridge.current_user().is_none());

    gate.release();
    timeout(WAIT, handle.ready())
        .await
        .expect("bootstrap finishes");

    assert_eq!(
        user_id_of(&harness.bridge.snapshot()),
        Some("u1".to_owned())
    );
    handle.shutdown().await;
}

#[tokio::test]
async fn shutdown_releases_subscription_once() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;
    assert_eq!(harness.auth.released(), 0);

    handle.shutdown().await;

    assert_eq!(harness.auth.released(), 1);
}

#[tokio::test]
async fn password_reset_is_requested_for_trimmed_email() {
    let harness = Harness::new(
        InMemoryAuthGateway::default(),
        InMemoryProfileRepository::default(),
    );
    let handle = harness.started().await;

    harness
        .bridge
        .reset_password("  ana@example.com ")
        .await
        .expect("reset requested");

    assert_eq!(harness.auth.reset_requests(), vec!["ana@example.com"]);
    assert_eq!(
        harness.notifier.shown(),
        vec![Notification::Success("Password reset email sent".to_owned())]
    );
    handle.shutdown().await;
}
