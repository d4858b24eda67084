//! Storage area adapters
//!
//! Two implementations of the core [`StorageArea`](stopllms_core::StorageArea)
//! port: a SQLite-backed durable area for profile-wide state and an
//! in-memory area for browser-session-scoped state (dropped on restart).

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
