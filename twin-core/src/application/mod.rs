// twin-core/src/application/mod.rs

pub mod clean;
pub mod fetch;
pub mod generate;
pub mod lineage;
pub mod ports;
pub mod twin;

// --- RE-EXPORTS (FACADE PATTERN) ---
// `use twin_core::application::{generate_twin, clean_output, LineageReport};`

pub use clean::clean_output;
pub use fetch::{RemoteData, fetch_remote};
pub use generate::{GenerationSummary, generate_twin};
pub use lineage::LineageReport;
pub use twin::{TwinGenerator, TwinInput};
