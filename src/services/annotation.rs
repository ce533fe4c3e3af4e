//! Linguistic annotation service.
//!
//! [`HeuristicAnnotator`] is a dependency-free stand-in for a statistical
//! parser: rule-based sentence splitting and tokenization with character
//! offsets, capitalized-span entity recognition, a small lemmatizer,
//! subject-verb-object candidates, and the passive-voice dependency labels
//! the structure analysis reads.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tracing::debug;

use crate::models::annotation::{DEP_AGENT, DEP_AUXPASS, DEP_NSUBJPASS, DEP_POBJ};
use crate::models::{
    DocumentAnnotation, EntityAnnotation, Mention, RelationCandidate, SentenceAnnotation,
    TokenAnnotation,
};
use crate::ProseError;

/// Service trait for document annotation.
#[async_trait]
pub trait AnnotationService: Send + Sync {
    /// Annotate a whole document: sentences, tokens, entities, relation
    /// candidates and dependency labels.
    async fn annotate(&self, text: &str) -> Result<DocumentAnnotation, ProseError>;

    /// Whether the annotator is loaded and available.
    fn is_available(&self) -> bool;
}

// ============================================================================
// Lexicons
// ============================================================================

const BE_FORMS: &[&str] = &["am", "is", "are", "was", "were", "be", "been", "being"];

const AUXILIARIES: &[&str] = &[
    "has", "have", "had", "having", "do", "does", "did", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must",
];

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "his", "her", "its", "their", "our", "my",
    "your",
];

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "him", "them", "us", "me", "who", "whom",
    "which", "what",
];

/// Prepositions, conjunctions and adverbs that never head a predicate.
const FUNCTION_WORDS: &[&str] = &[
    "and", "or", "but", "nor", "so", "yet", "of", "in", "on", "at", "to", "from", "by", "with",
    "for", "about", "into", "onto", "over", "under", "after", "before", "during", "near",
    "across", "through", "between", "among", "against", "without", "within", "also", "never",
    "not", "always", "often", "later", "then", "now", "there", "here", "very", "just", "only",
    "still", "even", "too", "again", "once", "soon", "as", "than", "if", "when", "while",
    "because", "although", "though", "since", "until", "unless", "where", "some", "any", "all",
    "each", "every", "no", "many", "much", "more", "most", "other", "another", "such", "own",
    "same", "both", "either", "neither", "however", "meanwhile", "finally", "first", "yeah",
    "well", "pretty", "super", "really", "quite", "basically", "today", "yesterday", "tomorrow",
];

/// A capitalized span after one of these is a place.
const PLACE_PREPOSITIONS: &[&str] = &["in", "at", "to", "from", "near", "across", "into"];

const CALENDAR_WORDS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday",
];

const IRREGULAR_LEMMAS: &[(&str, &str)] = &[
    ("went", "go"),
    ("gone", "go"),
    ("going", "go"),
    ("goes", "go"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("did", "do"),
    ("does", "do"),
    ("done", "do"),
    ("saw", "see"),
    ("seen", "see"),
    ("made", "make"),
    ("making", "make"),
    ("took", "take"),
    ("taken", "take"),
    ("taking", "take"),
    ("came", "come"),
    ("coming", "come"),
    ("left", "leave"),
    ("met", "meet"),
    ("told", "tell"),
    ("said", "say"),
    ("found", "find"),
    ("gave", "give"),
    ("given", "give"),
    ("wrote", "write"),
    ("written", "write"),
    ("knew", "know"),
    ("known", "know"),
    ("thought", "think"),
    ("bought", "buy"),
    ("brought", "bring"),
    ("built", "build"),
    ("ran", "run"),
    ("began", "begin"),
    ("begun", "begin"),
    ("became", "become"),
    ("held", "hold"),
    ("kept", "keep"),
    ("lost", "lose"),
    ("sent", "send"),
    ("spent", "spend"),
    ("won", "win"),
    ("chose", "choose"),
    ("chosen", "choose"),
    ("drove", "drive"),
    ("driven", "drive"),
    ("ate", "eat"),
    ("eaten", "eat"),
    ("fell", "fall"),
    ("fallen", "fall"),
    ("forgot", "forget"),
    ("forgotten", "forget"),
    ("got", "get"),
    ("gotten", "get"),
    ("hid", "hide"),
    ("hidden", "hide"),
    ("paid", "pay"),
    ("showed", "show"),
    ("shown", "show"),
    ("spoke", "speak"),
    ("spoken", "speak"),
    ("stole", "steal"),
    ("stolen", "steal"),
    ("broke", "break"),
    ("broken", "break"),
    ("born", "bear"),
    ("led", "lead"),
    ("felt", "feel"),
    ("heard", "hear"),
    ("loved", "love"),
    ("lived", "live"),
    ("moved", "move"),
    ("used", "use"),
];

/// Past participles that do not end in `-ed`.
const IRREGULAR_PARTICIPLES: &[&str] = &[
    "done", "made", "taken", "given", "written", "seen", "known", "built", "sent", "kept",
    "held", "found", "told", "said", "bought", "brought", "thought", "left", "lost", "won",
    "begun", "become", "chosen", "driven", "eaten", "fallen", "forgotten", "gotten", "hidden",
    "paid", "put", "read", "set", "shown", "spoken", "stolen", "torn", "worn", "broken", "born",
    "led", "felt", "heard", "met",
];

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Undo the spelling changes of `-ed` / `-ing` inflection.
fn restore_stem(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    let (prev, last) = (chars[n - 2], chars[n - 1]);

    if last == prev && !is_vowel(last) && !matches!(last, 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    if matches!(last, 'v' | 'c' | 'g' | 'u' | 'z') || (last == 's' && is_vowel(prev)) {
        return format!("{}e", stem);
    }
    if stem.ends_with("at") && n > 3 && !is_vowel(chars[n - 3]) {
        return format!("{}e", stem);
    }
    stem.to_string()
}

/// Lemma of a lowercase word.
pub(crate) fn lemmatize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some((_, lemma)) = IRREGULAR_LEMMAS.iter().find(|(w, _)| *w == lower) {
        return (*lemma).to_string();
    }
    if BE_FORMS.contains(&lower.as_str()) {
        return "be".to_string();
    }
    if !lower.chars().all(|c| c.is_alphabetic()) {
        return lower;
    }

    fn long_enough(stem: &str) -> bool {
        stem.chars().count() >= 3
    }
    if let Some(stem) = lower.strip_suffix("ied").filter(|s| s.chars().count() >= 2) {
        return format!("{}y", stem);
    }
    if let Some(stem) = lower.strip_suffix("ed").filter(|s| long_enough(s)) {
        return restore_stem(stem);
    }
    if let Some(stem) = lower.strip_suffix("ing").filter(|s| long_enough(s)) {
        return restore_stem(stem);
    }
    if let Some(stem) = lower.strip_suffix("ies").filter(|s| s.chars().count() >= 2) {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            if let Some(stem) = lower.strip_suffix("es") {
                return stem.to_string();
            }
        }
    }
    if lower.chars().count() > 3
        && lower.ends_with('s')
        && !["ss", "us", "is"].iter().any(|s| lower.ends_with(s))
    {
        if let Some(stem) = lower.strip_suffix('s') {
            return stem.to_string();
        }
    }
    lower
}

fn is_participle(lower: &str) -> bool {
    IRREGULAR_PARTICIPLES.contains(&lower)
        || (lower.ends_with("ed") && lower.chars().count() > 3)
}

// ============================================================================
// Tokenization
// ============================================================================

#[derive(Debug, Clone)]
struct RawToken {
    text: String,
    lower: String,
    /// Character offset within the document
    idx: usize,
    is_word: bool,
}

impl RawToken {
    fn new(text: String, idx: usize, is_word: bool) -> Self {
        let lower = text.to_lowercase();
        Self {
            text,
            lower,
            idx,
            is_word,
        }
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    fn is_capitalized(&self) -> bool {
        self.is_word && self.text.chars().next().is_some_and(|c| c.is_uppercase())
    }

    fn is_year(&self) -> bool {
        self.text.len() == 4
            && self.text.chars().all(|c| c.is_ascii_digit())
            && matches!(self.text.as_bytes()[0], b'1' | b'2')
    }

    fn is_function(&self) -> bool {
        let w = self.lower.as_str();
        FUNCTION_WORDS.contains(&w) || DETERMINERS.contains(&w) || PRONOUNS.contains(&w)
    }

    fn is_adverb(&self) -> bool {
        self.lower.ends_with("ly") || matches!(self.lower.as_str(), "not" | "also" | "never")
    }
}

/// Sentence spans as `[start, end)` character ranges.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text,
/// or at a blank line.
fn split_sentences(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut last_visible = 0;

    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            let blank_line = chars[i + 1..]
                .iter()
                .take_while(|n| n.is_whitespace())
                .any(|&n| n == '\n');
            if blank_line {
                if let Some(s) = start.take() {
                    spans.push((s, last_visible + 1));
                }
                continue;
            }
        }
        if c.is_whitespace() {
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        last_visible = i;

        let terminal = matches!(c, '.' | '!' | '?');
        let at_boundary = chars.get(i + 1).map_or(true, |n| n.is_whitespace());
        if terminal && at_boundary {
            if let Some(s) = start.take() {
                spans.push((s, i + 1));
            }
        }
    }
    if let Some(s) = start {
        spans.push((s, last_visible + 1));
    }
    spans
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Words (alphanumeric runs with internal apostrophes or hyphens) and
/// single-character punctuation. A possessive `'s` is split off.
fn tokenize(chars: &[char], start: usize, end: usize) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut i = start;

    while i < end {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if !is_word_char(c) {
            tokens.push(RawToken::new(c.to_string(), i, false));
            i += 1;
            continue;
        }

        let word_start = i;
        while i < end {
            let c = chars[i];
            let joiner = matches!(c, '\'' | '’' | '-')
                && i + 1 < end
                && is_word_char(chars[i + 1])
                && i > word_start;
            if is_word_char(c) || joiner {
                i += 1;
            } else {
                break;
            }
        }

        let word: String = chars[word_start..i].iter().collect();
        let possessive = word
            .strip_suffix("'s")
            .or_else(|| word.strip_suffix("’s"))
            .filter(|base| !base.is_empty());
        match possessive {
            Some(base) => {
                let base_len = base.chars().count();
                tokens.push(RawToken::new(base.to_string(), word_start, true));
                let suffix: String = chars[word_start + base_len..i].iter().collect();
                tokens.push(RawToken::new(suffix, word_start + base_len, true));
            }
            None => tokens.push(RawToken::new(word, word_start, true)),
        }
    }
    tokens
}

// ============================================================================
// Sentence analysis
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanKind {
    Date,
    Place,
    Person,
}

#[derive(Debug, Clone)]
struct EntitySpan {
    first: usize,
    last: usize,
    text: String,
    kind: SpanKind,
}

/// Per-token dependency assignment.
#[derive(Debug, Clone, Default)]
struct Parse {
    deps: Vec<String>,
    heads: Vec<Option<usize>>,
}

impl Parse {
    fn new(len: usize) -> Self {
        Self {
            deps: vec![String::new(); len],
            heads: vec![None; len],
        }
    }

    fn attach(&mut self, token: usize, dep: &str, head: usize) {
        self.deps[token] = dep.to_string();
        self.heads[token] = Some(head);
    }
}

/// A capitalized word opens an entity span unless it is a function word, or
/// it opens the sentence and the same word also occurs in lowercase.
fn opens_span(tokens: &[RawToken], i: usize, lowercase_words: &HashSet<String>) -> bool {
    let t = &tokens[i];
    if !t.is_capitalized() || t.is_function() || t.text == "I" {
        return false;
    }
    if BE_FORMS.contains(&t.lower.as_str()) || AUXILIARIES.contains(&t.lower.as_str()) {
        return false;
    }
    let sentence_initial = tokens[..i].iter().all(|p| !p.is_word);
    if sentence_initial && (lowercase_words.contains(&t.lower) || t.lower.ends_with("ly")) {
        return false;
    }
    true
}

fn find_spans(tokens: &[RawToken], lowercase_words: &HashSet<String>) -> Vec<EntitySpan> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let t = &tokens[i];
        let calendar = t.is_capitalized() && CALENDAR_WORDS.contains(&t.lower.as_str());
        if t.is_year() || calendar {
            spans.push(EntitySpan {
                first: i,
                last: i,
                text: t.text.clone(),
                kind: SpanKind::Date,
            });
            i += 1;
            continue;
        }
        if !opens_span(tokens, i, lowercase_words) {
            i += 1;
            continue;
        }

        let mut last = i;
        while last + 1 < tokens.len()
            && tokens[last + 1].is_capitalized()
            && !tokens[last + 1].is_function()
            && !CALENDAR_WORDS.contains(&tokens[last + 1].lower.as_str())
        {
            last += 1;
        }

        let after_place_prep = i > 0 && PLACE_PREPOSITIONS.contains(&tokens[i - 1].lower.as_str());
        let text = tokens[i..=last]
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        spans.push(EntitySpan {
            first: i,
            last,
            text,
            kind: if after_place_prep {
                SpanKind::Place
            } else {
                SpanKind::Person
            },
        });
        i = last + 1;
    }
    spans
}

/// Passive construction "X be [adv] VERBed [by Y]": returns (aux, participle).
fn find_passive(tokens: &[RawToken]) -> Option<(usize, usize)> {
    for (b, t) in tokens.iter().enumerate() {
        if !t.is_word || !BE_FORMS.contains(&t.lower.as_str()) || b == 0 {
            continue;
        }
        let mut p = b + 1;
        while p < tokens.len() && tokens[p].is_word && tokens[p].is_adverb() {
            p += 1;
        }
        if p < tokens.len() && tokens[p].is_word && is_participle(&tokens[p].lower) {
            return Some((b, p));
        }
    }
    None
}

/// Attach a noun phrase ending at `head`: preceding determiners and content
/// words become `det` / `compound` children.
fn attach_phrase_backward(tokens: &[RawToken], parse: &mut Parse, head: usize, floor: usize) {
    let mut j = head;
    while j > floor {
        j -= 1;
        let t = &tokens[j];
        if !t.is_word {
            break;
        }
        if DETERMINERS.contains(&t.lower.as_str()) {
            parse.attach(j, "det", head);
            break;
        }
        if t.is_function() || BE_FORMS.contains(&t.lower.as_str()) {
            break;
        }
        parse.attach(j, "compound", head);
    }
}

fn parse_sentence(tokens: &[RawToken]) -> Parse {
    let mut parse = Parse::new(tokens.len());

    let root = if let Some((aux, verb)) = find_passive(tokens) {
        parse.deps[verb] = "ROOT".to_string();
        parse.attach(aux, DEP_AUXPASS, verb);

        let subject = aux - 1;
        let s = &tokens[subject];
        let subject_ok = s.is_word
            && !FUNCTION_WORDS.contains(&s.lower.as_str())
            && !DETERMINERS.contains(&s.lower.as_str());
        if subject_ok {
            parse.attach(subject, DEP_NSUBJPASS, verb);
            attach_phrase_backward(tokens, &mut parse, subject, 0);
        }

        let by = verb + 1;
        if by < tokens.len() && tokens[by].lower == "by" {
            parse.attach(by, DEP_AGENT, verb);
            let mut end = by + 1;
            while end < tokens.len()
                && tokens[end].is_word
                && (!tokens[end].is_function() || DETERMINERS.contains(&tokens[end].lower.as_str()))
            {
                end += 1;
            }
            if end > by + 1 {
                let object = end - 1;
                parse.attach(object, DEP_POBJ, by);
                attach_phrase_backward(tokens, &mut parse, object, by + 1);
            }
        }
        Some(verb)
    } else {
        let root = tokens.iter().enumerate().skip(1).find_map(|(i, t)| {
            let candidate = t.is_word
                && !t.is_capitalized()
                && !t.is_function()
                && !t.is_adverb()
                && !t.text.chars().all(|c| c.is_ascii_digit());
            candidate.then_some(i)
        });
        if let Some(r) = root {
            parse.deps[r] = "ROOT".to_string();
        }
        root
    };

    if let Some(r) = root {
        for i in 0..tokens.len() {
            if i != r && parse.heads[i].is_none() {
                let dep = if tokens[i].is_word { "dep" } else { "punct" };
                parse.attach(i, dep, r);
            }
        }
    }
    parse
}

/// First predicate between two entity spans: (lemma, passive).
fn find_predicate(tokens: &[RawToken], from: usize, to: usize) -> Option<(String, bool)> {
    let mut fallback: Option<String> = None;

    let mut i = from;
    while i < to {
        let t = &tokens[i];
        if !t.is_word {
            if matches!(t.text.as_str(), ";" | ":" | "(" | ")") {
                return None;
            }
            i += 1;
            continue;
        }
        if BE_FORMS.contains(&t.lower.as_str()) {
            let mut p = i + 1;
            while p < to && tokens[p].is_word && tokens[p].is_adverb() {
                p += 1;
            }
            if p < to && is_participle(&tokens[p].lower) {
                let passive = tokens[p + 1..to].iter().any(|t| t.lower == "by");
                return Some((lemmatize(&tokens[p].lower), passive));
            }
            fallback.get_or_insert_with(|| "be".to_string());
        } else if AUXILIARIES.contains(&t.lower.as_str()) {
            fallback.get_or_insert_with(|| lemmatize(&t.lower));
        } else if !t.is_function()
            && !t.is_adverb()
            && !t.is_capitalized()
            && t.lower != "'s"
            && t.lower != "’s"
            && !t.text.chars().all(|c| c.is_ascii_digit())
        {
            return Some((lemmatize(&t.lower), false));
        }
        i += 1;
    }
    fallback.map(|lemma| (lemma, false))
}

// ============================================================================
// Document annotation
// ============================================================================

/// Annotate a document synchronously.
pub fn annotate_text(text: &str) -> DocumentAnnotation {
    let chars: Vec<char> = text.chars().collect();
    let spans = split_sentences(&chars);

    let tokenized: Vec<(usize, usize, Vec<RawToken>)> = spans
        .into_iter()
        .map(|(s, e)| (s, e, tokenize(&chars, s, e)))
        .collect();

    let lowercase_words: HashSet<String> = tokenized
        .iter()
        .flat_map(|(_, _, tokens)| tokens.iter())
        .filter(|t| t.is_word && t.text.chars().next().is_some_and(|c| c.is_lowercase()))
        .map(|t| t.lower.clone())
        .collect();

    let mut sentences = Vec::with_capacity(tokenized.len());
    let mut relations = Vec::new();
    let mut found: Vec<(EntitySpan, Mention)> = Vec::new();

    for (start, end, tokens) in &tokenized {
        let sentence_text: String = chars[*start..*end].iter().collect();
        let parse = parse_sentence(tokens);
        let entity_spans = find_spans(tokens, &lowercase_words);

        for pair in entity_spans.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if let Some((predicate, passive)) = find_predicate(tokens, a.last + 1, b.first) {
                let (subject, object) = if passive { (b, a) } else { (a, b) };
                relations.push(RelationCandidate {
                    subject: subject.text.clone(),
                    predicate,
                    object: object.text.clone(),
                    sentence: sentence_text.clone(),
                });
            }
        }

        for span in entity_spans {
            let first = &tokens[span.first];
            let last = &tokens[span.last];
            let mention = Mention {
                sentence: sentence_text.clone(),
                start: first.idx,
                end: last.idx + last.char_len(),
            };
            found.push((span, mention));
        }

        sentences.push(SentenceAnnotation {
            text: sentence_text,
            start: *start,
            end: *end,
            tokens: tokens
                .iter()
                .enumerate()
                .map(|(i, t)| TokenAnnotation {
                    text: t.text.clone(),
                    lemma: if t.is_capitalized() {
                        t.text.clone()
                    } else {
                        lemmatize(&t.text)
                    },
                    idx: t.idx,
                    dep: parse.deps[i].clone(),
                    head: parse.heads[i],
                })
                .collect(),
        });
    }

    let entities = collect_entities(found);
    debug!(
        sentences = sentences.len(),
        entities = entities.len(),
        relations = relations.len(),
        "Annotated document"
    );

    DocumentAnnotation {
        sentences,
        entities,
        relations,
    }
}

/// Label every span consistently (a text seen once as a place is a place
/// everywhere) and group mentions per (label, text) in first-seen order.
fn collect_entities(found: Vec<(EntitySpan, Mention)>) -> Vec<EntityAnnotation> {
    let mut kinds: HashMap<String, SpanKind> = HashMap::new();
    for (span, _) in &found {
        let kind = kinds.entry(span.text.clone()).or_insert(span.kind);
        if span.kind == SpanKind::Place && *kind == SpanKind::Person {
            *kind = SpanKind::Place;
        }
    }

    let mut entities: Vec<EntityAnnotation> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for (span, mention) in found {
        let label = match kinds.get(&span.text).copied().unwrap_or(span.kind) {
            SpanKind::Date => "DATE",
            SpanKind::Place => "GPE",
            SpanKind::Person => "PERSON",
        };
        let key = (label.to_string(), span.text.clone());
        let slot = *index.entry(key).or_insert_with(|| {
            entities.push(EntityAnnotation {
                label: label.to_string(),
                text: span.text.clone(),
                mentions: Vec::new(),
            });
            entities.len() - 1
        });
        entities[slot].mentions.push(mention);
    }
    entities
}

// ============================================================================
// Service implementations
// ============================================================================

/// Rule-based annotator. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnnotator;

impl HeuristicAnnotator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnnotationService for HeuristicAnnotator {
    async fn annotate(&self, text: &str) -> Result<DocumentAnnotation, ProseError> {
        if text.trim().is_empty() {
            return Err(ProseError::Input("Cannot annotate empty text".to_string()));
        }
        Ok(annotate_text(text))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// No-op annotator for degraded mode and tests.
pub struct NoopAnnotationService;

impl Default for NoopAnnotationService {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopAnnotationService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnnotationService for NoopAnnotationService {
    async fn annotate(&self, _text: &str) -> Result<DocumentAnnotation, ProseError> {
        Err(ProseError::ServiceUnavailable(
            "Annotation service is not available (noop)".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
