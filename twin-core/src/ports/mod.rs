// twin-core/src/ports/mod.rs

pub mod storage_api;

pub use storage_api::{ProjectInfo, ProjectOwner, StorageApi};
