pub mod config_service;
pub mod file_kv_store;
pub mod kv_session_archive;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::file_kv_store::FileKvStore;
pub use crate::kv_session_archive::{KvSessionArchive, STORAGE_KEY};
pub use crate::paths::AtelierPaths;
