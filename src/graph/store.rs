//! Request-scoped knowledge graph.
//!
//! A directed multigraph: nodes are entities keyed by identity, each node owns
//! an ordered list of outgoing `(target, predicate, sentence)` edges. Edges are
//! never deduplicated; repeated facts are kept as separate edges.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::contradiction::{group_contradictions, Contradiction};
use super::entity::{Entity, EntityId};
use crate::models::Mention;
use crate::ProseError;

/// An outgoing edge stored in a node's adjacency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutEdge {
    pub target: EntityId,
    /// Verb lemma
    pub predicate: String,
    /// Source sentence the relation was extracted from
    pub sentence: String,
}

/// Node record in a graph export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: EntityId,
    pub label: String,
    pub text: String,
}

/// Edge record in a graph export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEdge {
    pub source: EntityId,
    pub target: EntityId,
    pub predicate: String,
    pub sentence: String,
}

/// Serializable node/edge view for visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub edges: Vec<ExportEdge>,
}

/// Size counters for a graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub num_entities: usize,
    pub num_relationships: usize,
    pub num_mentions: usize,
}

/// Knowledge graph for a single document.
///
/// Invariant: every edge's source and target is a node in `nodes`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    /// Nodes in insertion order
    nodes: Vec<Entity>,
    /// Outgoing edges, aligned with `nodes`
    adjacency: Vec<Vec<OutEdge>>,
    index: HashMap<EntityId, usize>,
    edge_count: usize,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, or append the mention if the identity already exists.
    ///
    /// Returns `true` when a new node was created.
    pub fn add_entity(
        &mut self,
        id: EntityId,
        label: &str,
        text: &str,
        mention: Option<Mention>,
    ) -> bool {
        if let Some(&i) = self.index.get(&id) {
            if let Some(m) = mention {
                self.nodes[i].mentions.push(m);
            }
            return false;
        }

        let mut entity = Entity::new(id.clone(), label, text);
        if let Some(m) = mention {
            entity.mentions.push(m);
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(entity);
        self.adjacency.push(Vec::new());
        true
    }

    /// Add a directed edge. Both endpoints must already be nodes.
    ///
    /// A new edge is created even if an identical one exists.
    pub fn add_relation(
        &mut self,
        subject: &EntityId,
        predicate: &str,
        object: &EntityId,
        sentence: &str,
    ) -> Result<(), ProseError> {
        if !self.index.contains_key(object) {
            return Err(ProseError::UnknownEntity(object.to_string()));
        }
        let source = *self
            .index
            .get(subject)
            .ok_or_else(|| ProseError::UnknownEntity(subject.to_string()))?;

        self.adjacency[source].push(OutEdge {
            target: object.clone(),
            predicate: predicate.to_string(),
            sentence: sentence.to_string(),
        });
        self.edge_count += 1;
        Ok(())
    }

    pub fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.nodes.iter()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn out_edges(&self, id: &EntityId) -> &[OutEdge] {
        self.index
            .get(id)
            .map(|&i| self.adjacency[i].as_slice())
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            num_entities: self.nodes.len(),
            num_relationships: self.edge_count,
            num_mentions: self.nodes.iter().map(|n| n.mentions.len()).sum(),
        }
    }

    /// Contradictions: (subject, predicate) pairs reaching more than one
    /// distinct object. Read-only; severity is always medium.
    pub fn detect_contradictions(&self) -> Vec<Contradiction> {
        self.nodes
            .iter()
            .zip(self.adjacency.iter())
            .flat_map(|(node, edges)| group_contradictions(&node.id, edges))
            .collect()
    }

    /// Node/edge view. Multiplicities are preserved: N entities and M
    /// relations export as exactly N nodes and M edges.
    pub fn export(&self) -> GraphExport {
        let nodes = self
            .nodes
            .iter()
            .map(|n| ExportNode {
                id: n.id.clone(),
                label: n.label.clone(),
                text: n.text.clone(),
            })
            .collect();

        let edges = self
            .nodes
            .iter()
            .zip(self.adjacency.iter())
            .flat_map(|(node, out)| {
                out.iter().map(move |e| ExportEdge {
                    source: node.id.clone(),
                    target: e.target.clone(),
                    predicate: e.predicate.clone(),
                    sentence: e.sentence.clone(),
                })
            })
            .collect();

        GraphExport { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::suggestion::Severity;

    fn person(name: &str) -> EntityId {
        EntityId::new("PERSON", name)
    }

    fn place(name: &str) -> EntityId {
        EntityId::new("GPE", name)
    }

    fn mention(sentence: &str, start: usize, end: usize) -> Mention {
        Mention {
            sentence: sentence.to_string(),
            start,
            end,
        }
    }

    fn graph_with(ids: &[EntityId]) -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        for id in ids {
            let (label, text) = id.as_str().split_once(':').expect("label:text");
            g.add_entity(id.clone(), label, text, None);
        }
        g
    }

    #[test]
    fn test_add_entity_is_idempotent_and_appends_mentions() {
        let mut g = KnowledgeGraph::new();
        let id = person("John");
        assert!(g.add_entity(id.clone(), "PERSON", "John", Some(mention("John ran.", 0, 4))));
        assert!(!g.add_entity(id.clone(), "PERSON", "John", Some(mention("John sat.", 10, 14))));

        assert_eq!(g.node_count(), 1);
        let entity = g.get(&id).expect("entity present");
        assert_eq!(entity.mentions.len(), 2);
        assert_eq!(entity.mentions[1].sentence, "John sat.");
    }

    #[test]
    fn test_add_relation_requires_endpoints() {
        let mut g = graph_with(&[person("A")]);
        let err = g
            .add_relation(&person("A"), "visit", &place("Nowhere"), "A visited Nowhere.")
            .expect_err("missing object");
        assert!(matches!(err, ProseError::UnknownEntity(ref id) if id == "GPE:Nowhere"));

        let err = g
            .add_relation(&person("Ghost"), "visit", &person("A"), "Ghost visited A.")
            .expect_err("missing subject");
        assert!(matches!(err, ProseError::UnknownEntity(_)));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_distinct_objects_produce_one_contradiction() {
        let (a, b, c) = (person("A"), place("B"), place("C"));
        let mut g = graph_with(&[a.clone(), b.clone(), c.clone()]);
        g.add_relation(&a, "visit", &b, "A visited B.").unwrap();
        g.add_relation(&a, "visit", &c, "A visited C.").unwrap();

        let contradictions = g.detect_contradictions();
        assert_eq!(contradictions.len(), 1);
        let found = &contradictions[0];
        assert_eq!(found.entity, a);
        assert_eq!(found.predicate, "visit");
        assert_eq!(found.objects, vec![b, c]);
        assert_eq!(found.sentences, vec!["A visited B.", "A visited C."]);
        assert_eq!(found.severity, Severity::Medium);
    }

    #[test]
    fn test_duplicate_edges_do_not_contradict() {
        let (a, b) = (person("A"), place("B"));
        let mut g = graph_with(&[a.clone(), b.clone()]);
        g.add_relation(&a, "visit", &b, "A visited B.").unwrap();
        g.add_relation(&a, "visit", &b, "A visited B again.").unwrap();

        assert_eq!(g.edge_count(), 2);
        assert!(g.detect_contradictions().is_empty());
    }

    #[test]
    fn test_different_predicates_do_not_contradict() {
        let (a, b, c) = (person("A"), place("B"), place("C"));
        let mut g = graph_with(&[a.clone(), b.clone(), c.clone()]);
        g.add_relation(&a, "visit", &b, "A visited B.").unwrap();
        g.add_relation(&a, "leave", &c, "A left C.").unwrap();
        assert!(g.detect_contradictions().is_empty());
    }

    #[test]
    fn test_export_preserves_multiplicities() {
        let (a, b, c) = (person("A"), place("B"), place("C"));
        let mut g = graph_with(&[a.clone(), b.clone(), c.clone()]);
        g.add_relation(&a, "visit", &b, "s1").unwrap();
        g.add_relation(&a, "visit", &b, "s2").unwrap();
        g.add_relation(&b, "border", &c, "s3").unwrap();

        let export = g.export();
        assert_eq!(export.nodes.len(), 3);
        assert_eq!(export.edges.len(), 3);
        assert_eq!(export.nodes[0].id, a);
        assert_eq!(export.nodes[0].label, "PERSON");
        assert_eq!(export.edges[2].source, b);
        assert_eq!(export.edges[2].predicate, "border");
    }

    #[test]
    fn test_export_is_side_effect_free() {
        let (a, b) = (person("A"), place("B"));
        let mut g = graph_with(&[a.clone(), b.clone()]);
        g.add_relation(&a, "visit", &b, "s").unwrap();
        assert_eq!(g.export(), g.export());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_export_serializes_flat_ids() {
        let g = graph_with(&[person("John Smith")]);
        let json = serde_json::to_value(g.export()).expect("serialize");
        assert_eq!(json["nodes"][0]["id"], "PERSON:John Smith");
        assert_eq!(json["edges"].as_array().map(|e| e.len()), Some(0));
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_export_counts_match_additions(
                names in proptest::collection::vec("[A-E]", 1..8),
                rels in proptest::collection::vec((0usize..8, "[a-c]", 0usize..8), 0..20),
            ) {
                let mut g = KnowledgeGraph::new();
                let ids: Vec<EntityId> = names.iter().map(|n| person(n)).collect();
                for id in &ids {
                    g.add_entity(id.clone(), "PERSON", id.as_str(), None);
                }
                let distinct = g.node_count();

                let mut added = 0;
                for (s, p, o) in &rels {
                    let (s, o) = (&ids[s % ids.len()], &ids[o % ids.len()]);
                    g.add_relation(s, p, o, "sentence").unwrap();
                    added += 1;
                }

                let export = g.export();
                prop_assert_eq!(export.nodes.len(), distinct);
                prop_assert_eq!(export.edges.len(), added);
            }

            #[test]
            fn prop_every_contradiction_has_multiple_objects(
                rels in proptest::collection::vec((0usize..4, "[a-b]", 0usize..4), 0..20),
            ) {
                let ids: Vec<EntityId> = ["A", "B", "C", "D"].iter().map(|n| person(n)).collect();
                let mut g = graph_with(&ids);
                for (s, p, o) in &rels {
                    g.add_relation(&ids[*s], p, &ids[*o], "sentence").unwrap();
                }
                for c in g.detect_contradictions() {
                    prop_assert!(c.objects.len() > 1);
                    let mut sorted = c.objects.clone();
                    sorted.sort();
                    sorted.dedup();
                    prop_assert_eq!(sorted.len(), c.objects.len());
                }
            }
        }
    }
}
