//! Site header: search box, nav links, user menu, theme toggle, sign-out.

#[cfg(test)]
#[path = "header_test.rs"]
mod header_test;

use std::sync::Arc;

use super::{FlowError, GENERIC_FAILURE, response_message};
use crate::net::api::BlogApi;
use crate::routes::{Navigator, Route, SEARCH_TERM_PARAM, query_param, set_query_param, split_location};
use crate::state::session::AppContext;
use crate::state::ui::Theme;

/// Top-level links, in display order.
const NAV_LINKS: [(&str, Route); 3] = [("Home", Route::Home), ("About", Route::About), ("Projects", Route::Projects)];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: String,
    pub active: bool,
}

/// What the header shows on the right-hand side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserMenu {
    SignedIn {
        /// `@username`
        handle: String,
        email: String,
        avatar_url: String,
        profile_path: String,
    },
    SignedOut {
        sign_in_path: String,
    },
}

pub struct HeaderController {
    api: Arc<dyn BlogApi>,
    ctx: AppContext,
    search_term: String,
}

impl HeaderController {
    #[must_use]
    pub fn new(api: Arc<dyn BlogApi>, ctx: AppContext) -> Self {
        Self { api, ctx, search_term: String::new() }
    }

    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: &str) {
        term.clone_into(&mut self.search_term);
    }

    /// Mirror `searchTerm` from the location into the search box; a location
    /// without it empties the box.
    pub fn sync_from_location(&mut self, location: &str) {
        let (_, query) = split_location(location);
        self.search_term = query_param(query, SEARCH_TERM_PARAM).unwrap_or_default();
    }

    /// Navigate to the search page, keeping the current query's other
    /// parameters. Returns the target.
    pub fn submit_search(&self, nav: &dyn Navigator) -> String {
        let location = nav.location();
        let (_, query) = split_location(&location);
        let target = format!("/search?{}", set_query_param(query, SEARCH_TERM_PARAM, &self.search_term));
        tracing::debug!(term = %self.search_term, "search submitted");
        nav.navigate(&target);
        target
    }

    #[must_use]
    pub fn user_menu(&self) -> UserMenu {
        match self.ctx.current_user() {
            Some(user) => UserMenu::SignedIn {
                handle: format!("@{}", user.username),
                avatar_url: user.avatar_or_default().to_owned(),
                email: user.email,
                profile_path: Route::profile().path(),
            },
            None => UserMenu::SignedOut { sign_in_path: Route::SignIn.path() },
        }
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.ctx.theme()
    }

    pub fn toggle_theme(&self) -> Theme {
        self.ctx.toggle_theme()
    }

    /// End the session on the server, then locally, then go home.
    ///
    /// # Errors
    ///
    /// `SignOut` when the request fails or is rejected. The session and
    /// location are left as they were, and the failure is logged.
    pub async fn sign_out(&self, nav: &dyn Navigator) -> Result<(), FlowError> {
        let message = match self.api.sign_out().await {
            Ok(response) if response.is_success() => {
                self.ctx.sign_out_success();
                nav.navigate(&Route::Home.path());
                return Ok(());
            }
            Ok(response) => response_message(&response, GENERIC_FAILURE),
            Err(e) => e.to_string(),
        };
        tracing::error!(error = %message, "sign-out failed");
        Err(FlowError::SignOut(message))
    }
}

/// Header links with the one matching `location`'s path marked active.
#[must_use]
pub fn nav_links(location: &str) -> Vec<NavLink> {
    let (path, _) = split_location(location);
    NAV_LINKS
        .iter()
        .map(|(label, route)| {
            let link = route.path();
            NavLink { label: *label, active: link == path, path: link }
        })
        .collect()
}
