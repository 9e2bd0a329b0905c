//! Copy of the provider session shared by the hosted adapters.
//!
//! Shared by the auth and table adapters: the table API authorises rows with
//! the signed-in user's access token. A persistent store mirrors every change
//! into one JSON file so the session outlives the process; the file is
//! removed when the session ends.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use cap_std::{ambient_authority, fs::Dir};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::dto::StoredSessionDto;
use crate::domain::Session;

#[derive(Debug, Default)]
pub(super) struct SessionStore {
    current: RwLock<Option<Session>>,
    file: Option<SessionFile>,
}

impl SessionStore {
    /// Store backed by the JSON file at `path`, seeded from it when present.
    ///
    /// A file that no longer decodes is treated as no session.
    pub(super) fn persistent(path: &Path) -> io::Result<Self> {
        let file = SessionFile::new(path)?;
        let restored = file.load()?;
        Ok(Self {
            current: RwLock::new(restored),
            file: Some(file),
        })
    }

    pub(super) fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in `session`, returning the previous value.
    pub(super) fn replace(&self, session: Option<Session>) -> Option<Session> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(file) = &self.file {
            if let Err(error) = file.save(session.as_ref()) {
                warn!(path = %file.path.display(), error = %error, "failed to persist session");
            }
        }
        std::mem::replace(&mut *guard, session)
    }

    pub(super) fn access_token(&self) -> Option<Zeroizing<String>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|session| Zeroizing::new(session.access_token().to_owned()))
    }
}

#[derive(Debug)]
struct SessionFile {
    path: PathBuf,
    parent: PathBuf,
    name: OsString,
}

impl SessionFile {
    fn new(path: &Path) -> io::Result<Self> {
        let name = path.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "session path must name a file")
        })?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        Dir::create_ambient_dir_all(parent, ambient_authority())?;
        Ok(Self {
            path: path.to_path_buf(),
            parent: parent.to_path_buf(),
            name: name.to_os_string(),
        })
    }

    fn dir(&self) -> io::Result<Dir> {
        Dir::open_ambient_dir(&self.parent, ambient_authority())
    }

    fn load(&self) -> io::Result<Option<Session>> {
        let contents = match self.dir()?.read_to_string(Path::new(&self.name)) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error),
        };
        match serde_json::from_str::<StoredSessionDto>(&contents) {
            Ok(stored) => {
                let session = stored.into_session();
                debug!(user_id = %session.user_id(), "restored stored session");
                Ok(Some(session))
            }
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn save(&self, session: Option<&Session>) -> io::Result<()> {
        let dir = self.dir()?;
        let Some(session) = session else {
            return match dir.remove_file(Path::new(&self.name)) {
                Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
                other => other,
            };
        };
        let payload = serde_json::to_vec(&StoredSessionDto::from(session))
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
        dir.write(Path::new(&self.name), payload)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::UserId;

    fn session(token: &str) -> Session {
        Session::new(UserId::new("u1").expect("valid id"), token)
            .with_email(Some("a@b.com".to_owned()))
            .with_refresh_token(Some("rt".to_owned()))
            .with_expires_at(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single())
    }

    #[test]
    fn replace_returns_previous_session() {
        let store = SessionStore::default();
        assert!(store.access_token().is_none());

        let first = Session::new(UserId::new("u1").expect("valid id"), "t1");
        assert!(store.replace(Some(first.clone())).is_none());
        assert_eq!(store.access_token().as_deref().map(String::as_str), Some("t1"));

        let previous = store.replace(None);
        assert_eq!(previous, Some(first));
        assert!(store.get().is_none());
    }

    #[test]
    fn persistent_store_survives_a_restart() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("nested").join("session.json");

        let store = SessionStore::persistent(&path).expect("open store");
        assert!(store.get().is_none());
        store.replace(Some(session("t1")));

        let reopened = SessionStore::persistent(&path).expect("reopen store");
        assert_eq!(reopened.get(), Some(session("t1")));
    }

    #[test]
    fn clearing_the_session_removes_the_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("session.json");

        let store = SessionStore::persistent(&path).expect("open store");
        store.replace(Some(session("t1")));
        assert!(path.exists());
        store.replace(None);
        assert!(!path.exists());

        let reopened = SessionStore::persistent(&path).expect("reopen store");
        assert!(reopened.get().is_none());
    }

    #[test]
    fn unreadable_file_is_treated_as_signed_out() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("session.json");
        let dir = Dir::open_ambient_dir(temp.path(), ambient_authority()).expect("open dir");
        dir.write("session.json", b"not json").expect("write file");

        let store = SessionStore::persistent(&path).expect("open store");
        assert!(store.get().is_none());
    }
}
