// Data model shared by every component

pub mod artifact;
pub mod documents;
pub mod graph;
pub mod idea;

pub use artifact::{Artifact, ArtifactType, ExportTarget, ProjectRecord};
pub use documents::{
    ApiEndpoint, BackendSpec, Cardinality, ColorToken, DataEntity, DocumentKind, EntityField,
    EntityRelation, Feature, FrontendSpec, GeneratedBundle, Page, RequirementsDoc, Screen, UiSpec,
};
pub use graph::{
    ModuleCategory, ModuleEdge, ModuleNode, ModuleStatus, Position, ProjectGraph, MAX_LAYER,
    MIN_LAYER,
};
pub use idea::{Idea, Platform};
