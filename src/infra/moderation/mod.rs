// Implementations of the memorial store.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryMemorialStore;
pub use sqlite_store::SqliteMemorialStore;
