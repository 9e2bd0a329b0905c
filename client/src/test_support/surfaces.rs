//! Recording navigator and notifier.

use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::domain::Destination;
use crate::domain::ports::{Navigator, Notifier};

/// Notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Success toast.
    Success(String),
    /// Error toast.
    Error(String),
}

/// Navigator that records every move.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Destination>>,
    external: Mutex<Vec<Url>>,
}

impl RecordingNavigator {
    /// In-app destinations in visiting order.
    pub fn visits(&self) -> Vec<Destination> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent in-app destination.
    pub fn last(&self) -> Option<Destination> {
        self.visits().last().copied()
    }

    /// External hand-offs in order.
    pub fn external(&self) -> Vec<Url> {
        self.external
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(destination);
    }

    fn redirect_external(&self, url: &Url) {
        self.external
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());
    }
}

/// Notifier that records every toast.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    /// Notifications in display order.
    pub fn shown(&self) -> Vec<Notification> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Error messages only.
    pub fn errors(&self) -> Vec<String> {
        self.shown()
            .into_iter()
            .filter_map(|notification| match notification {
                Notification::Error(message) => Some(message),
                Notification::Success(_) => None,
            })
            .collect()
    }

    fn record(&self, notification: Notification) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.record(Notification::Success(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.record(Notification::Error(message.to_owned()));
    }
}
