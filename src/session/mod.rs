//! Local session cache
//!
//! [`SessionStore`] keeps exactly one [`SessionRecord`] -- the identity of
//! whoever logged in last -- and [`SessionManager`] drives it from the login
//! and logout flows so the cache and the identity provider change together.

pub mod manager;
pub mod record;
pub mod store;

pub use manager::SessionManager;
pub use record::SessionRecord;
pub use store::{SessionStore, SESSION_KEY};
