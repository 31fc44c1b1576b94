//! Session-scoped models for the storefront.
//!
//! The storefront holds no state of its own; everything here is a transient
//! mirror of what the identity provider or the showroom API reported, scoped
//! to one session.

pub mod session;

pub use session::{SessionUser, load_membership, session_keys, store_membership};
