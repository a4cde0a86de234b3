pub mod error;
pub mod jobs;
pub mod lineage;
pub mod ports;
pub mod project;
pub mod samples;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
