//! Port for transient user-facing notifications (toasts).

/// Shows short-lived messages; never blocks.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Confirm a completed action.
    fn success(&self, message: &str);

    /// Report a failed action before the error is raised to the caller.
    fn error(&self, message: &str);
}
