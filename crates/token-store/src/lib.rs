//! Persistent key/value storage for the client session.
//!
//! This crate provides:
//! - A pluggable [`KeyValueStorage`] capability (`get`/`set`/`delete`)
//! - [`MemoryStorage`] for tests and non-persistent contexts
//! - [`FileStorage`], a JSON-file backend playing the role browser local storage plays on the web
//! - [`TokenStore`], the tolerant facade the session pipeline reads and writes through

mod file;
mod keys;
mod memory;
mod models;
mod store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use models::{SessionUser, TokenPair};
pub use store::TokenStore;
pub use traits::KeyValueStorage;

use thiserror::Error;

/// Error type for storage backends.
///
/// These never reach session code: [`TokenStore`] logs them and treats the
/// operation as a cache miss.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend is unavailable or refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create a token store backed by a JSON file at `path`.
pub fn create_file_token_store(path: impl Into<std::path::PathBuf>) -> TokenStore {
    TokenStore::new(Box::new(FileStorage::new(path)))
}

/// Create a token store that lives only as long as the process.
pub fn create_memory_token_store() -> TokenStore {
    TokenStore::new(Box::new(MemoryStorage::new()))
}
