//! Tracing-backed presentation surfaces.
//!
//! Without a UI, navigation and notifications become structured log
//! events; the last destination is kept so callers can report where a
//! command ended up.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};
use url::Url;

use crate::domain::Destination;
use crate::domain::ports::{Navigator, Notifier};

/// Navigator that logs every move.
#[derive(Debug, Default)]
pub struct LoggingNavigator {
    last: Mutex<Option<String>>,
}

impl LoggingNavigator {
    /// Path or URL of the most recent navigation.
    pub fn last_location(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, location: String) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(location);
    }
}

impl Navigator for LoggingNavigator {
    fn navigate(&self, destination: Destination) {
        info!(path = destination.path(), "navigate");
        self.record(destination.path().to_owned());
    }

    fn redirect_external(&self, url: &Url) {
        info!(url = %url, "open external page to continue");
        self.record(url.to_string());
    }
}

/// Notifier that logs toasts at info (success) or warn (error) level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn success(&self, message: &str) {
        info!(notification = message, "success");
    }

    fn error(&self, message: &str) {
        warn!(notification = message, "error");
    }
}
