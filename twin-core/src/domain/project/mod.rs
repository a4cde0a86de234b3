// twin-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{ApiConfig, SecurityConfig, TwinConfig};
