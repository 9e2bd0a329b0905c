//! Reqwest-backed auth service adapter.
//!
//! Owns the provider session: sign-in, sign-up and refresh store it, sign-out
//! clears it, and every change is announced to subscribers with the same
//! event names the platform's own clients use. OAuth and email-link
//! redirects hand their tokens back in the callback URL; those are verified
//! against the user endpoint before being adopted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use reqwest::{Method, StatusCode, Url, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use super::HostedHttp;
use super::dto::{
    AuthUserDto, PasswordGrantDto, RecoverRequestDto, RefreshGrantDto, SignUpRequestDto,
    SignUpResponseDto, TokenResponseDto, UpdatePasswordDto,
};
use super::error_mapping::{HttpFailure, decode, map_status_error, map_transport_error};
use super::event_hub::EventHub;
use super::session_store::SessionStore;
use crate::domain::ports::{AuthGateway, AuthGatewayError, AuthSubscription, SignUpOutcome};
use crate::domain::{LoginCredentials, OAuthProvider, Registration, Session, SessionEvent, UserId};

const TOKEN_PATH: &str = "auth/v1/token";
const SIGNUP_PATH: &str = "auth/v1/signup";
const LOGOUT_PATH: &str = "auth/v1/logout";
const USER_PATH: &str = "auth/v1/user";
const RECOVER_PATH: &str = "auth/v1/recover";
const AUTHORIZE_PATH: &str = "auth/v1/authorize";
const NO_ACTIVE_SESSION: &str = "Auth session missing";
const CALLBACK_WITHOUT_SESSION: &str = "Callback URL carries no session";

/// Auth service adapter.
pub struct HostedAuthGateway {
    http: HostedHttp,
    store: Arc<SessionStore>,
    events: EventHub,
    clock: Arc<dyn Clock>,
}

impl HostedAuthGateway {
    pub(super) fn new(
        http: HostedHttp,
        store: Arc<SessionStore>,
        events: EventHub,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            store,
            events,
            clock,
        }
    }

    async fn send_json<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<(StatusCode, Vec<u8>), HttpFailure> {
        let mut request = self
            .http
            .request(method, url, bearer)
            .header(header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        Ok((status, bytes.to_vec()))
    }

    async fn call<B, T>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        bearer: Option<&str>,
        what: &str,
    ) -> Result<T, HttpFailure>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let (status, bytes) = self.send_json(method, url, body, bearer).await?;
        if !status.is_success() {
            return Err(map_status_error(status, &bytes));
        }
        decode(&bytes, what)
    }

    async fn call_unit<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<(), HttpFailure> {
        let (status, bytes) = self.send_json(method, url, body, bearer).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(map_status_error(status, &bytes))
        }
    }

    fn grant_url(&self, grant_type: &str) -> Result<Url, HttpFailure> {
        let mut url = self.http.endpoint(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        Ok(url)
    }

    fn with_redirect(&self, path: &str, redirect_to: &Url) -> Result<Url, HttpFailure> {
        let mut url = self.http.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("redirect_to", redirect_to.as_str());
        Ok(url)
    }

    /// Store `session` and announce it.
    fn adopt(&self, session: Session, event: fn(Option<Session>) -> SessionEvent) {
        self.store.replace(Some(session.clone()));
        self.events.emit(&event(Some(session)));
    }

    fn forget(&self) {
        if self.store.replace(None).is_some() {
            self.events.emit(&SessionEvent::SignedOut);
        }
    }

    /// Exchange the refresh token for a new session. A refused refresh ends
    /// the session rather than failing the caller.
    async fn refresh(&self, session: &Session) -> Result<Option<Session>, AuthGatewayError> {
        let Some(refresh_token) = session.refresh_token() else {
            debug!(user_id = %session.user_id(), "expired session has no refresh token");
            self.forget();
            return Ok(None);
        };
        let url = self.grant_url("refresh_token")?;
        let grant = RefreshGrantDto { refresh_token };
        match self
            .call::<_, TokenResponseDto>(Method::POST, url, Some(&grant), None, "token")
            .await
        {
            Ok(token) => {
                let refreshed = token.into_session(self.clock.utc());
                self.adopt(refreshed.clone(), SessionEvent::TokenRefreshed);
                Ok(Some(refreshed))
            }
            Err(HttpFailure::Rejected(message)) => {
                warn!(reason = %message, "session refresh refused; signing out locally");
                self.forget();
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }
}

#[async_trait]
impl AuthGateway for HostedAuthGateway {
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, AuthGatewayError> {
        let url = self.grant_url("password")?;
        let grant = PasswordGrantDto {
            email: credentials.email(),
            password: credentials.password(),
        };
        let token: TokenResponseDto = self
            .call(Method::POST, url, Some(&grant), None, "token")
            .await?;
        let session = token.into_session(self.clock.utc());
        info!(user_id = %session.user_id(), "password sign-in accepted");
        self.adopt(session.clone(), SessionEvent::SignedIn);
        Ok(session)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> Result<Url, AuthGatewayError> {
        let mut url = self.with_redirect(AUTHORIZE_PATH, redirect_to)?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str());
        Ok(url)
    }

    async fn sign_up(
        &self,
        registration: &Registration,
        redirect_to: &Url,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        let url = self.with_redirect(SIGNUP_PATH, redirect_to)?;
        let request = SignUpRequestDto {
            email: registration.credentials().email(),
            password: registration.credentials().password(),
            data: registration.metadata(),
        };
        let response: SignUpResponseDto = self
            .call(Method::POST, url, Some(&request), None, "sign-up")
            .await?;
        match response {
            SignUpResponseDto::Session(token) => {
                let session = token.into_session(self.clock.utc());
                let user_id = session.user_id().clone();
                self.adopt(session.clone(), SessionEvent::SignedIn);
                Ok(SignUpOutcome {
                    user_id,
                    session: Some(session),
                })
            }
            SignUpResponseDto::User(AuthUserDto { id, .. }) => Ok(SignUpOutcome {
                user_id: id,
                session: None,
            }),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        let Some(token) = self.store.access_token() else {
            return Ok(());
        };
        let url = self.http.endpoint(LOGOUT_PATH)?;
        self.call_unit::<()>(Method::POST, url, None, Some(token.as_str()))
            .await?;
        self.forget();
        Ok(())
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        let Some(session) = self.store.get() else {
            return Ok(None);
        };
        if is_expired(&session, self.clock.utc()) {
            return self.refresh(&session).await;
        }
        Ok(Some(session))
    }

    async fn current_user_id(&self) -> Result<Option<UserId>, AuthGatewayError> {
        let Some(session) = self.current_session().await? else {
            return Ok(None);
        };
        let url = self.http.endpoint(USER_PATH)?;
        match self
            .call::<(), AuthUserDto>(Method::GET, url, None, Some(session.access_token()), "user")
            .await
        {
            Ok(user) => Ok(Some(user.id)),
            Err(HttpFailure::Rejected(message)) => {
                debug!(reason = %message, "provider no longer recognises the session");
                self.forget();
                Ok(None)
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn update_password(&self, new_password: &str) -> Result<(), AuthGatewayError> {
        let Some(token) = self.store.access_token() else {
            return Err(AuthGatewayError::rejected(NO_ACTIVE_SESSION));
        };
        let url = self.http.endpoint(USER_PATH)?;
        let body = UpdatePasswordDto {
            password: new_password,
        };
        self.call_unit(Method::PUT, url, Some(&body), Some(token.as_str()))
            .await?;
        self.events
            .emit(&SessionEvent::from_wire("USER_UPDATED", self.store.get()));
        Ok(())
    }

    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &Url,
    ) -> Result<(), AuthGatewayError> {
        let url = self.with_redirect(RECOVER_PATH, redirect_to)?;
        let body = RecoverRequestDto { email };
        self.call_unit(Method::POST, url, Some(&body), None).await?;
        Ok(())
    }

    fn discard_local_session(&self) {
        self.forget();
    }

    async fn session_from_callback(&self, callback: &Url) -> Result<Session, AuthGatewayError> {
        let params = callback_params(callback);
        if let Some(reason) = param(&params, "error_description").or_else(|| param(&params, "error"))
        {
            return Err(AuthGatewayError::rejected(reason));
        }
        let Some(access_token) = param(&params, "access_token") else {
            return Err(AuthGatewayError::rejected(CALLBACK_WITHOUT_SESSION));
        };
        let url = self.http.endpoint(USER_PATH)?;
        let user: AuthUserDto = self
            .call::<(), _>(Method::GET, url, None, Some(access_token), "user")
            .await?;
        let token = TokenResponseDto {
            access_token: access_token.to_owned(),
            refresh_token: param(&params, "refresh_token").map(str::to_owned),
            expires_in: param(&params, "expires_in").and_then(|raw| raw.parse().ok()),
            expires_at: param(&params, "expires_at").and_then(|raw| raw.parse().ok()),
            user,
        };
        let session = token.into_session(self.clock.utc());
        info!(user_id = %session.user_id(), "callback session adopted");
        self.adopt(session.clone(), SessionEvent::SignedIn);
        Ok(session)
    }

    fn subscribe(&self) -> AuthSubscription {
        self.events.subscribe()
    }
}

/// Query and fragment parameters of a redirect; the fragment wins.
fn callback_params(callback: &Url) -> HashMap<String, String> {
    let mut params: HashMap<String, String> = callback.query_pairs().into_owned().collect();
    if let Some(fragment) = callback.fragment() {
        params.extend(form_urlencoded::parse(fragment.as_bytes()).into_owned());
    }
    params
}

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|value| value.as_str().trim())
        .filter(|value| !value.is_empty())
}

fn is_expired(session: &Session, now: DateTime<Utc>) -> bool {
    session.expires_at().is_some_and(|expires_at| expires_at <= now)
}
