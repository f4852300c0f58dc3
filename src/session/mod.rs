//! Session persistence for the two execution contexts.
//!
//! [`SessionStore`] is the capability set (`save`, `get`, `clear`, device id).
//! [`ClientSessionStore`] backs it with browser-style key/value storage; the
//! cookie-backed server variant lives in [`crate::server`].

mod client;
mod storage;
mod traits;

pub use client::{ClientSessionStore, DEVICE_ID_KEY, SESSION_KEY};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use traits::SessionStore;
