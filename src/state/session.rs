//! Application context shared by every controller.
//!
//! DESIGN
//! ======
//! Session and theme are explicit values passed to controllers rather than
//! an ambient store. Each is a `watch` channel: readers call the getters,
//! views subscribe for changes. The session is overwritten wholesale on
//! sign-in and cleared on sign-out, never merged.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tokio::sync::watch;

use super::ui::Theme;
use crate::net::types::SessionUser;

/// Cloneable handle to the shared session and theme.
#[derive(Clone, Debug)]
pub struct AppContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    session: watch::Sender<Option<SessionUser>>,
    theme: watch::Sender<Theme>,
}

impl AppContext {
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        let (session, _) = watch::channel(None);
        let (theme, _) = watch::channel(theme);
        Self { inner: Arc::new(Inner { session, theme }) }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<SessionUser> {
        self.inner.session.borrow().clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.inner.session.borrow().is_some()
    }

    #[must_use]
    pub fn subscribe_user(&self) -> watch::Receiver<Option<SessionUser>> {
        self.inner.session.subscribe()
    }

    /// Replace the session with `user`.
    pub fn sign_in_success(&self, user: SessionUser) {
        tracing::info!(user_id = %user.id, username = %user.username, "session started");
        self.inner.session.send_replace(Some(user));
    }

    /// Clear the session.
    pub fn sign_out_success(&self) {
        if self.inner.session.send_replace(None).is_some() {
            tracing::info!("session cleared");
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        *self.inner.theme.borrow()
    }

    #[must_use]
    pub fn subscribe_theme(&self) -> watch::Receiver<Theme> {
        self.inner.theme.subscribe()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.inner.theme.send_replace(theme);
    }

    /// Flip between light and dark, returning the new theme.
    pub fn toggle_theme(&self) -> Theme {
        let mut next = Theme::default();
        self.inner.theme.send_modify(|theme| {
            *theme = theme.toggled();
            next = *theme;
        });
        next
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}
