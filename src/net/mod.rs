//! Networking seams and their HTTP implementations.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` talks to the blog backend, `storage` to the object store that
//! holds post images, `identity` to the federated sign-in provider, and
//! `types` defines the backend wire schema.

pub mod api;
pub mod identity;
pub mod storage;
pub mod types;
