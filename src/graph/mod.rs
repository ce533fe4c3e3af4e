//! Knowledge graph: entities, relations and the contradiction view.

pub mod contradiction;
pub mod entity;
pub mod extract;
pub mod resolve;
pub mod store;

pub use contradiction::Contradiction;
pub use entity::{Entity, EntityId};
pub use extract::{build_graph, build_graph_with_config, ExtractionStats};
pub use resolve::{resolver_for, EntityResolver, FuzzyResolver, SubstringResolver};
pub use store::{ExportEdge, ExportNode, GraphExport, GraphStats, KnowledgeGraph, OutEdge};
