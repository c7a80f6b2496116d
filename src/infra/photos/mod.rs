pub mod file_store;
pub mod in_memory;

pub use file_store::FilePhotoStore;
pub use in_memory::InMemoryPhotoStore;
