//! Sentence structure analysis: passive voice detection and rewriting,
//! sentence length statistics and dependency-depth complexity.

use serde::{Deserialize, Serialize};

use crate::models::annotation::{DEP_AGENT, DEP_AUXPASS, DEP_NSUBJPASS, DEP_POBJ};
use crate::models::{DocumentAnnotation, SentenceAnnotation};
use crate::utils::text::capitalize;

/// Fixed confidence for dependency-pattern passive detection.
const PASSIVE_CONFIDENCE: f32 = 0.85;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveSentence {
    pub sentence: String,
    pub start: usize,
    pub end: usize,
    pub passive_verb: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveConversion {
    pub original: String,
    /// Active rewrite, or the original sentence when no rewrite was possible
    pub converted: String,
    pub conversion_made: bool,
    /// Character offset of the sentence in the document
    pub start: usize,
    #[serde(default)]
    pub explanation: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureAnalysis {
    pub num_sentences: usize,
    pub avg_sentence_length: f64,
    pub min_sentence_length: usize,
    pub max_sentence_length: usize,
    pub passive_voice_count: usize,
    /// Mean token depth in the dependency tree
    pub complexity_score: f64,
}

/// Index of the passive verb: head of an `auxpass` token that also has an
/// `nsubjpass` child. Head indices outside the sentence are ignored.
fn passive_verb(sentence: &SentenceAnnotation) -> Option<usize> {
    sentence
        .tokens
        .iter()
        .filter(|t| t.dep == DEP_AUXPASS)
        .filter_map(|t| t.head)
        .filter(|&head| head < sentence.tokens.len())
        .find(|&head| sentence.child_with_dep(head, DEP_NSUBJPASS).is_some())
}

pub fn detect_passive(annotation: &DocumentAnnotation) -> Vec<PassiveSentence> {
    annotation
        .sentences
        .iter()
        .filter_map(|sentence| {
            let verb = passive_verb(sentence)?;
            Some(PassiveSentence {
                sentence: sentence.text.clone(),
                start: sentence.start,
                end: sentence.end,
                passive_verb: sentence.tokens[verb].text.clone(),
                confidence: PASSIVE_CONFIDENCE,
            })
        })
        .collect()
}

/// Text of the noun phrase headed by `head`: the head plus its `det` and
/// `compound` children, in sentence order. A leading determiner is
/// lowercased.
fn phrase(sentence: &SentenceAnnotation, head: usize) -> String {
    let mut indices: Vec<usize> = sentence
        .children(head)
        .filter(|(_, t)| t.dep == "det" || t.dep == "compound")
        .map(|(i, _)| i)
        .collect();
    indices.push(head);
    indices.sort_unstable();

    indices
        .iter()
        .enumerate()
        .map(|(n, &i)| {
            let t = &sentence.tokens[i];
            if n == 0 && t.dep == "det" {
                t.text.to_lowercase()
            } else {
                t.text.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite a passive sentence as `agent verb subject`.
///
/// Only sentences with an explicit `by` agent can be rewritten; anything
/// else comes back unchanged with `conversion_made = false`.
pub fn convert_passive(sentence: &SentenceAnnotation) -> PassiveConversion {
    let unchanged = || PassiveConversion {
        original: sentence.text.clone(),
        converted: sentence.text.clone(),
        conversion_made: false,
        start: sentence.start,
        explanation: Vec::new(),
    };

    let Some(verb) = passive_verb(sentence) else {
        return unchanged();
    };
    let Some((subject, _)) = sentence.child_with_dep(verb, DEP_NSUBJPASS) else {
        return unchanged();
    };
    let Some((agent, _)) = sentence
        .child_with_dep(verb, DEP_AGENT)
        .and_then(|(by, _)| sentence.child_with_dep(by, DEP_POBJ))
    else {
        return unchanged();
    };

    let agent_text = phrase(sentence, agent);
    let terminal = sentence
        .text
        .trim_end()
        .chars()
        .last()
        .filter(|c| matches!(c, '.' | '!' | '?'))
        .map(String::from)
        .unwrap_or_default();
    let converted = format!(
        "{} {} {}{}",
        capitalize(&agent_text),
        sentence.tokens[verb].lemma,
        phrase(sentence, subject),
        terminal
    );

    PassiveConversion {
        original: sentence.text.clone(),
        converted,
        conversion_made: true,
        start: sentence.start,
        explanation: vec![format!(
            "Converted passive '{}' to active by moving agent '{}' to subject position",
            sentence.text, agent_text
        )],
    }
}

/// Convert the first `limit` passive sentences.
pub fn passive_conversions(annotation: &DocumentAnnotation, limit: usize) -> Vec<PassiveConversion> {
    annotation
        .sentences
        .iter()
        .filter(|s| passive_verb(s).is_some())
        .take(limit)
        .map(convert_passive)
        .collect()
}

/// Depth of a token: number of head links to the root. Cycles in malformed
/// input stop at the sentence length.
fn depth(sentence: &SentenceAnnotation, index: usize) -> usize {
    let mut depth = 0;
    let mut current = index;
    while let Some(head) = sentence.tokens[current].head {
        if head == current || head >= sentence.tokens.len() || depth >= sentence.tokens.len() {
            break;
        }
        depth += 1;
        current = head;
    }
    depth
}

pub fn analyze_structure(annotation: &DocumentAnnotation) -> StructureAnalysis {
    let lengths: Vec<usize> = annotation.sentences.iter().map(|s| s.len()).collect();
    let total_tokens: usize = lengths.iter().sum();
    let total_depth: usize = annotation
        .sentences
        .iter()
        .map(|s| (0..s.tokens.len()).map(|i| depth(s, i)).sum::<usize>())
        .sum();

    StructureAnalysis {
        num_sentences: lengths.len(),
        avg_sentence_length: if lengths.is_empty() {
            0.0
        } else {
            total_tokens as f64 / lengths.len() as f64
        },
        min_sentence_length: lengths.iter().copied().min().unwrap_or(0),
        max_sentence_length: lengths.iter().copied().max().unwrap_or(0),
        passive_voice_count: detect_passive(annotation).len(),
        complexity_score: if total_tokens == 0 {
            0.0
        } else {
            total_depth as f64 / total_tokens as f64
        },
    }
}
