//! ldaviz Store - Storage ports and adapters
//!
//! This crate defines the storage ports the pipeline reads and writes
//! through, the text codec for persisted matrices, and adapter
//! implementations backed by memory, flat files and SQLite.

pub mod codec;
pub mod files;
pub mod memory;
pub mod ports;
pub mod sqlite;
pub mod storage;

pub use ports::{MatrixStore, TopicStore};
pub use storage::Storage;
