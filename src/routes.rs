//! Client route surface and navigation seam.
//!
//! DESIGN
//! ======
//! Controllers never touch a router directly; they receive a `Navigator`
//! and hand it a path string. `MemoryHistory` is the in-process history
//! used by the CLI and by tests.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use std::sync::{Mutex, PoisonError};

use url::form_urlencoded;

/// Query parameter carrying the search term on `/search`.
pub const SEARCH_TERM_PARAM: &str = "searchTerm";

/// Known client routes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    About,
    Projects,
    SignIn,
    SignUp,
    Search { term: String },
    Dashboard { tab: String },
    Post { slug: String },
}

impl Route {
    /// Path (with query, when the route has one) for this route.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::About => "/about".to_owned(),
            Self::Projects => "/projects".to_owned(),
            Self::SignIn => "/sign-in".to_owned(),
            Self::SignUp => "/sign-up".to_owned(),
            Self::Search { term } => format!("/search?{}", encode_pairs([(SEARCH_TERM_PARAM, term.as_str())])),
            Self::Dashboard { tab } => format!("/dashboard?{}", encode_pairs([("tab", tab.as_str())])),
            Self::Post { slug } => format!("/post/{slug}"),
        }
    }

    /// The profile tab of the dashboard.
    #[must_use]
    pub fn profile() -> Self {
        Self::Dashboard { tab: "profile".to_owned() }
    }

    /// Parse a location (`/path?query#fragment`) into a known route.
    #[must_use]
    pub fn parse(location: &str) -> Option<Self> {
        let (path, query) = split_location(location);
        match path.trim_end_matches('/') {
            "" => Some(Self::Home),
            "/about" => Some(Self::About),
            "/projects" => Some(Self::Projects),
            "/sign-in" => Some(Self::SignIn),
            "/sign-up" => Some(Self::SignUp),
            "/search" => Some(Self::Search { term: query_param(query, SEARCH_TERM_PARAM).unwrap_or_default() }),
            "/dashboard" => Some(Self::Dashboard { tab: query_param(query, "tab").unwrap_or_default() }),
            other => {
                let slug = other.strip_prefix("/post/")?;
                if slug.is_empty() || slug.contains('/') {
                    return None;
                }
                Some(Self::Post { slug: slug.to_owned() })
            }
        }
    }
}

// =============================================================================
// QUERY HELPERS
// =============================================================================

/// Split a location into `(path, query)`, dropping any fragment.
#[must_use]
pub fn split_location(location: &str) -> (&str, &str) {
    let without_fragment = location.split_once('#').map_or(location, |(head, _)| head);
    match without_fragment.split_once('?') {
        Some((path, query)) => (if path.is_empty() { "/" } else { path }, query),
        None => (if without_fragment.is_empty() { "/" } else { without_fragment }, ""),
    }
}

/// First value of `key` in a URL query string.
#[must_use]
pub fn query_param(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Set `key` to `value` in a query string.
///
/// The first existing occurrence is replaced in place and later duplicates
/// are dropped; an absent key is appended. Other parameters keep their order.
#[must_use]
pub fn set_query_param(query: &str, key: &str, value: &str) -> String {
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = Vec::new();
    for (k, v) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        if k == key {
            if !replaced {
                pairs.push((k.into_owned(), value.to_owned()));
                replaced = true;
            }
        } else {
            pairs.push((k.into_owned(), v.into_owned()));
        }
    }
    if !replaced {
        pairs.push((key.to_owned(), value.to_owned()));
    }
    encode_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Client-side navigation seam.
pub trait Navigator: Send + Sync {
    /// Current location, path plus query.
    fn location(&self) -> String;

    /// Push a new location.
    fn navigate(&self, to: &str);
}

/// In-memory navigation history.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Vec<String>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new(initial: &str) -> Self {
        Self { entries: Mutex::new(vec![initial.to_owned()]) }
    }

    /// Every location visited, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Number of navigations since construction.
    #[must_use]
    pub fn navigation_count(&self) -> usize {
        self.entries().len().saturating_sub(1)
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| "/".to_owned())
    }

    fn navigate(&self, to: &str) {
        tracing::debug!(to, "navigate");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(to.to_owned());
    }
}
