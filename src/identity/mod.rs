//! Installation identity and the storage it is persisted in.

mod provider;
mod store;

pub use provider::{device_fingerprint, generate_identity, IdentityProvider};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
