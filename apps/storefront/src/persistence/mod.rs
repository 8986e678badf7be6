// apps/storefront/src/persistence/mod.rs

//! Device-local key-value storage and the JSON mirror built on it.

pub mod kv;
pub mod mirror;

pub use kv::{FileKv, KeyValueStore, MemoryKv, MirrorError};
pub use mirror::{LocalMirror, CART_KEY, CHECKOUT_KEY};
