//! # greenmatch Storage
//!
//! Durable job stores: an LMDB-backed [`LmdbStore`], a compressed
//! [`DumpFile`] for the in-memory store, and the [`StorageManager`] that
//! picks a backend and runs background saves.

pub mod dump;
pub mod lmdb_store;
pub mod manager;

pub use dump::{DumpFile, DumpInfo};
pub use lmdb_store::LmdbStore;
pub use manager::{StorageBackend, StorageConfig, StorageManager, DEFAULT_SAVE_INTERVAL};
