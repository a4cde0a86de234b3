// src/domain/ports/mod.rs

pub mod transformation_source;

pub use transformation_source::{ScanFailure, ScanOutput, TransformationSource};
