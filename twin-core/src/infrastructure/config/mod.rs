pub mod project;

pub use crate::domain::project::TwinConfig;
pub use project::{load_twin_config, normalize_host};
