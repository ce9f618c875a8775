//! Infrastructure layer: environment configuration and local file storage.

pub mod config;
mod fs_util;
pub mod snapshot;
pub mod token_file;

pub use config::AppConfig;
pub use snapshot::SnapshotFile;
pub use token_file::FileTokenStore;
