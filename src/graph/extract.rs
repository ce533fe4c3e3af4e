//! Entity/relation extraction: turns a document annotation into a
//! request-scoped [`KnowledgeGraph`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::entity::EntityId;
use super::resolve::{resolver_for, EntityResolver};
use super::store::KnowledgeGraph;
use crate::config::ResolverConfig;
use crate::models::DocumentAnnotation;

/// Counters from one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub entities_added: usize,
    pub relations_added: usize,
    /// Candidates whose subject or object did not resolve to an entity
    pub relations_dropped: usize,
}

/// Populate a fresh graph from one annotation.
///
/// Entities go in first (deduplicated by identity, mentions appended), then
/// relation candidates are resolved with `resolver`. A candidate with an
/// unresolvable endpoint is dropped.
pub fn build_graph(
    annotation: &DocumentAnnotation,
    resolver: &dyn EntityResolver,
) -> (KnowledgeGraph, ExtractionStats) {
    let (mut graph, mut stats) = add_entities(annotation);
    add_relations(&mut graph, annotation, resolver, &mut stats);
    (graph, stats)
}

/// [`build_graph`] with the configured resolver from [`resolver_for`], built
/// over the document's own entities.
pub fn build_graph_with_config(
    annotation: &DocumentAnnotation,
    config: &ResolverConfig,
) -> (KnowledgeGraph, ExtractionStats) {
    let (mut graph, mut stats) = add_entities(annotation);
    let resolver = resolver_for(config, &graph);
    add_relations(&mut graph, annotation, resolver.as_ref(), &mut stats);
    (graph, stats)
}

fn add_entities(annotation: &DocumentAnnotation) -> (KnowledgeGraph, ExtractionStats) {
    let mut graph = KnowledgeGraph::new();
    let mut stats = ExtractionStats::default();

    for entity in &annotation.entities {
        let id = EntityId::new(&entity.label, &entity.text);
        let mut mentions = entity.mentions.iter().cloned();
        if graph.add_entity(id.clone(), &entity.label, &entity.text, mentions.next()) {
            stats.entities_added += 1;
        }
        for mention in mentions {
            graph.add_entity(id.clone(), &entity.label, &entity.text, Some(mention));
        }
    }

    (graph, stats)
}

fn add_relations(
    graph: &mut KnowledgeGraph,
    annotation: &DocumentAnnotation,
    resolver: &dyn EntityResolver,
    stats: &mut ExtractionStats,
) {
    for candidate in &annotation.relations {
        let subject = resolver.resolve(&candidate.subject);
        let object = resolver.resolve(&candidate.object);
        let (Some(subject), Some(object)) = (subject, object) else {
            debug!(
                subject = %candidate.subject,
                object = %candidate.object,
                predicate = %candidate.predicate,
                "Dropping unresolved relation"
            );
            stats.relations_dropped += 1;
            continue;
        };

        match graph.add_relation(&subject, &candidate.predicate, &object, &candidate.sentence) {
            Ok(()) => stats.relations_added += 1,
            Err(e) => {
                debug!("Dropping relation: {}", e);
                stats.relations_dropped += 1;
            }
        }
    }

    debug!(
        entities = stats.entities_added,
        relations = stats.relations_added,
        dropped = stats.relations_dropped,
        "Knowledge graph built"
    );
}
