//! Lexical substitution service for style transformation.

use async_trait::async_trait;

use crate::models::{StyleTransformation, Substitution, TargetTone};
use crate::utils::text::capitalize;
use crate::ProseError;

/// Service trait for tone-directed lexical substitution.
#[async_trait]
pub trait SubstitutionService: Send + Sync {
    /// Rewrite `text` toward `target`, reporting every substitution made.
    async fn transform(
        &self,
        text: &str,
        target: TargetTone,
    ) -> Result<StyleTransformation, ProseError>;

    /// Whether the substitution backend is available.
    fn is_available(&self) -> bool;
}

/// Informal phrase, formal phrase, part of speech.
const FORMALITY_MAP: &[(&str, &str, &str)] = &[
    ("gonna", "going to", "VERB"),
    ("wanna", "want to", "VERB"),
    ("gotta", "have to", "VERB"),
    ("kinda", "kind of", "ADV"),
    ("sorta", "sort of", "ADV"),
    ("yeah", "yes", "INTJ"),
    ("nah", "no", "INTJ"),
    ("dunno", "don't know", "VERB"),
    ("cool", "excellent", "ADJ"),
    ("awesome", "excellent", "ADJ"),
    ("stuff", "items", "NOUN"),
    ("things", "matters", "NOUN"),
    ("basically", "essentially", "ADV"),
    ("a lot of", "numerous", "ADJ"),
    ("big", "substantial", "ADJ"),
    ("get", "obtain", "VERB"),
    ("show", "demonstrate", "VERB"),
    ("use", "utilize", "VERB"),
    ("help", "assist", "VERB"),
    ("buy", "purchase", "VERB"),
    ("start", "commence", "VERB"),
    ("end", "conclude", "VERB"),
    ("kid", "child", "NOUN"),
    ("kids", "children", "NOUN"),
];

#[derive(Debug, Clone)]
struct Rule {
    pattern: Vec<String>,
    replacement: String,
    part_of_speech: String,
}

/// A word with its character span.
#[derive(Debug, Clone)]
struct Word {
    lower: String,
    start: usize,
    end: usize,
}

fn words(chars: &[char]) -> Vec<Word> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_alphanumeric() {
            i += 1;
            continue;
        }
        let start = i;
        while i < chars.len()
            && (chars[i].is_alphanumeric()
                || (matches!(chars[i], '\'' | '’')
                    && chars.get(i + 1).is_some_and(|c| c.is_alphanumeric())))
        {
            i += 1;
        }
        out.push(Word {
            lower: chars[start..i].iter().collect::<String>().to_lowercase(),
            start,
            end: i,
        });
    }
    out
}

/// Phrase-map substituter. Longest match wins; case of the first letter is
/// preserved.
#[derive(Debug, Clone)]
pub struct LexiconSubstituter {
    to_formal: Vec<Rule>,
    to_informal: Vec<Rule>,
}

impl LexiconSubstituter {
    pub fn new() -> Self {
        let rule = |from: &str, to: &str, pos: &str| Rule {
            pattern: from.split_whitespace().map(String::from).collect(),
            replacement: to.to_string(),
            part_of_speech: pos.to_string(),
        };

        let to_formal = FORMALITY_MAP
            .iter()
            .map(|(informal, formal, pos)| rule(informal, formal, pos))
            .collect();

        // Reverse direction: when two informal words share a formal form,
        // the later entry wins.
        let mut to_informal: Vec<Rule> = Vec::new();
        for (informal, formal, pos) in FORMALITY_MAP {
            let reversed = rule(formal, informal, pos);
            match to_informal.iter_mut().find(|r| r.pattern == reversed.pattern) {
                Some(existing) => *existing = reversed,
                None => to_informal.push(reversed),
            }
        }

        Self {
            to_formal,
            to_informal,
        }
    }

    pub fn transform_text(&self, text: &str, target: TargetTone) -> StyleTransformation {
        let rules = match target {
            TargetTone::Formal => &self.to_formal,
            TargetTone::Informal => &self.to_informal,
        };
        let chars: Vec<char> = text.chars().collect();
        let words = words(&chars);

        let mut output = String::with_capacity(text.len());
        let mut changes = Vec::new();
        let mut copied_to = 0;
        let mut i = 0;

        while i < words.len() {
            let matched = rules
                .iter()
                .filter(|r| {
                    let n = r.pattern.len();
                    i + n <= words.len()
                        && r.pattern.iter().zip(&words[i..i + n]).all(|(p, w)| *p == w.lower)
                })
                .max_by_key(|r| r.pattern.len());

            let Some(rule) = matched else {
                i += 1;
                continue;
            };

            let n = rule.pattern.len();
            let (start, end) = (words[i].start, words[i + n - 1].end);
            let original: String = chars[start..end].iter().collect();
            let replacement = if chars[start].is_uppercase() {
                capitalize(&rule.replacement)
            } else {
                rule.replacement.clone()
            };

            output.extend(&chars[copied_to..start]);
            output.push_str(&replacement);
            copied_to = end;

            changes.push(Substitution {
                original,
                replacement,
                position: start,
                reason: format!("Lexical substitution for {} tone", target),
                part_of_speech: Some(rule.part_of_speech.clone()),
            });
            i += n;
        }
        output.extend(&chars[copied_to..]);

        StyleTransformation {
            original_text: text.to_string(),
            transformed_text: output,
            target_tone: target,
            num_changes: changes.len(),
            changes,
        }
    }
}

impl Default for LexiconSubstituter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubstitutionService for LexiconSubstituter {
    async fn transform(
        &self,
        text: &str,
        target: TargetTone,
    ) -> Result<StyleTransformation, ProseError> {
        Ok(self.transform_text(text, target))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// No-op substitution service for degraded mode and tests.
pub struct NoopSubstitutionService;

impl Default for NoopSubstitutionService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopSubstitutionService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SubstitutionService for NoopSubstitutionService {
    async fn transform(
        &self,
        _text: &str,
        _target: TargetTone,
    ) -> Result<StyleTransformation, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Substitution service is not available (noop)".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
