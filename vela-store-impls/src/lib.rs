pub mod memory_db;
#[cfg(feature = "rocksdb")]
pub mod rocks_db;
