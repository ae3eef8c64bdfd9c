//! Flat-file backend for the loopguard history store.
//!
//! The store is a newline-delimited text file guarded by an advisory
//! exclusive lock. Every operation runs its whole read-modify-write on a
//! blocking thread while holding the lock, so concurrent hook processes
//! serialise on the file.

mod lock;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use lock::{LockedFile, with_exclusive_access};
pub use store::FileStore;
