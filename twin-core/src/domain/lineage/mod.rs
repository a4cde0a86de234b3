// twin-core/src/domain/lineage/mod.rs

pub mod classify;
pub mod index;
pub mod reference;
pub mod registry;

pub use classify::{Platform, SourceKind};
pub use index::TwinIndex;
pub use reference::TableRef;
pub use registry::{
    Code, CodeBlock, EdgeType, GraphEdge, LineageRegistry, Table, Transformation,
    TransformationMeta, TransformationRecord,
};
