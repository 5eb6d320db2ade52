//! # blog-client
//!
//! Client-side core for the blog: credential sign-up, Google sign-in,
//! the navigation/session header, theming, and post creation with a
//! resumable image upload.
//!
//! SYSTEM CONTEXT
//! ==============
//! Controllers in `controllers` drive each user flow. They talk to the
//! outside world only through the trait seams in `net` (REST backend,
//! object storage, identity provider) and `routes::Navigator`, and share
//! session/theme through the explicit `state::session::AppContext`.
//! The `blog` binary wires the real `reqwest` adapters into the same
//! controllers.

pub mod config;
pub mod controllers;
pub mod net;
pub mod routes;
pub mod state;
