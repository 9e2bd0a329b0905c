//! Hosted backend-as-a-service adapters.
//!
//! Thin reqwest implementations of the `AuthGateway` and
//! `ProfileRepository` ports against the platform's REST surfaces:
//! `/auth/v1/*` for authentication and `/rest/v1/*` for the `users` and
//! `vendors` tables. Both adapters share one HTTP client and one session
//! store so table requests carry the signed-in user's token. The store can
//! be backed by a file so the session carries over between runs.

mod auth_http;
mod dto;
mod error_mapping;
mod event_hub;
mod rest_http;
mod session_store;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mockable::Clock;
use reqwest::{Client, Method, RequestBuilder, Url};

pub use auth_http::HostedAuthGateway;
pub use rest_http::HostedProfileRepository;

use self::error_mapping::HttpFailure;
use self::event_hub::EventHub;
use self::session_store::SessionStore;
use crate::config::BackendSettings;

const USER_AGENT: &str = concat!("marketplace-session/", env!("CARGO_PKG_VERSION"));

/// Failure to wire the hosted adapters.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// The reqwest client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The session file could not be opened or read.
    #[error("failed to open session file {}: {source}", path.display())]
    SessionFile {
        /// Configured session file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Both hosted adapters, wired to shared state.
pub struct HostedAdapters {
    /// Auth service adapter.
    pub auth: HostedAuthGateway,
    /// Table API adapter.
    pub profiles: HostedProfileRepository,
}

impl HostedAdapters {
    /// Build both adapters from validated settings.
    ///
    /// With `session_file` the session is restored from and written back to
    /// that file; without it the session ends with the process.
    ///
    /// # Errors
    ///
    /// [`ConnectError`] when the reqwest client cannot be constructed or the
    /// session file cannot be opened.
    pub fn connect(
        settings: &BackendSettings,
        clock: Arc<dyn Clock>,
        session_file: Option<&Path>,
    ) -> Result<Self, ConnectError> {
        let http = HostedHttp::new(settings)?;
        let store = session_file.map_or_else(
            || Ok(SessionStore::default()),
            |path| {
                SessionStore::persistent(path).map_err(|source| ConnectError::SessionFile {
                    path: path.to_path_buf(),
                    source,
                })
            },
        )?;
        let shared = Arc::new(store);
        Ok(Self {
            auth: HostedAuthGateway::new(
                http.clone(),
                Arc::clone(&shared),
                EventHub::default(),
                clock,
            ),
            profiles: HostedProfileRepository::new(http, shared),
        })
    }
}

/// Shared request plumbing: base URL, public key header and bearer tokens.
#[derive(Clone)]
struct HostedHttp {
    client: Client,
    base: Url,
    anon_key: String,
}

impl HostedHttp {
    fn new(settings: &BackendSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base: with_trailing_slash(settings.url.clone()),
            anon_key: settings.anon_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, HttpFailure> {
        self.base
            .join(path)
            .map_err(|error| HttpFailure::Transport(format!("invalid endpoint {path}: {error}")))
    }

    /// Request authorised with `bearer`, or with the public key when no
    /// user is signed in.
    fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let token = bearer.unwrap_or(self.anon_key.as_str());
        self.client
            .request(method, url)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(token)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use cap_std::{ambient_authority, fs::Dir};
    use mockable::DefaultClock;

    fn settings(url: &str) -> BackendSettings {
        BackendSettings {
            url: Url::parse(url).expect("valid url"),
            anon_key: "anon".to_owned(),
            oauth_redirect: Url::parse("http://localhost:3000/auth/callback")
                .expect("valid url"),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn endpoints_resolve_under_project_path() {
        let http = HostedHttp::new(&settings("https://abc.supabase.co/proxy"))
            .expect("client builds");
        let url = http.endpoint("auth/v1/token").expect("endpoint joins");
        assert_eq!(url.as_str(), "https://abc.supabase.co/proxy/auth/v1/token");
    }

    #[test]
    fn root_urls_are_left_alone() {
        let url = with_trailing_slash(Url::parse("https://abc.supabase.co").expect("valid url"));
        assert_eq!(url.as_str(), "https://abc.supabase.co/");
    }

    #[test]
    fn unusable_session_file_fails_to_connect() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        dir.write("blocker", b"a file, not a directory")
            .expect("write blocker");
        let path = temp.path().join("blocker").join("session.json");

        let result = HostedAdapters::connect(
            &settings("https://abc.supabase.co"),
            Arc::new(DefaultClock),
            Some(&path),
        );
        assert!(matches!(result, Err(ConnectError::SessionFile { .. })));
    }
}
