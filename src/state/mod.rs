//! Client-side state models.
//!
//! DESIGN
//! ======
//! `session` holds the cross-controller context (user + theme); `draft`
//! and `upload` are owned by the post editor; `ui` has presentation
//! preferences.

pub mod draft;
pub mod session;
pub mod ui;
pub mod upload;
