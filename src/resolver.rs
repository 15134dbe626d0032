// resolver.rs
//
// Extraction of explicit speaker names embedded in segment text.
//
// Three matchers are tried in strict priority order, first match wins:
//   1. a leading "Name: message" prefix
//   2. a bracketed label like [Alice] or [Speaker 2] anywhere in the text
//   3. a generic split on the first colon, gated by a name-shaped prefix
// Nothing is applied cumulatively; a segment yields at most one name.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static LEADING_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Za-z.\- ]{1,30}):\s+(.*)$").unwrap());

static BRACKET_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:Speaker\s+)?([A-Z][A-Za-z.\- ]{1,30}|Speaker\s+\d+)\]").unwrap());

static NAME_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Za-z.\- ]+$").unwrap());

static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// An explicit speaker name pulled out of a segment's text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedName {
    pub name: String,
    /// The segment text with the speaker marker removed.
    pub remainder: String,
}

/// Try the matchers in priority order against (already trimmed) text.
pub fn extract_speaker_name(text: &str) -> Option<ExtractedName> {
    if let Some(caps) = LEADING_NAME.captures(text) {
        let name = MULTI_SPACE
            .replace_all(caps.get(1).map_or("", |m| m.as_str()).trim(), " ")
            .into_owned();
        let remainder = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
        return Some(ExtractedName { name, remainder });
    }

    if let Some(caps) = BRACKET_LABEL.captures(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let name = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let mut remainder = String::with_capacity(text.len());
        remainder.push_str(&text[..whole.start]);
        remainder.push_str(&text[whole.end..]);
        return Some(ExtractedName {
            name,
            remainder: remainder.trim().to_string(),
        });
    }

    if let Some(colon) = text.find(':') {
        let candidate = text[..colon].trim();
        if candidate.len() > 2 && candidate.len() < 40 && NAME_SHAPE.is_match(candidate) {
            return Some(ExtractedName {
                name: candidate.to_string(),
                remainder: text[colon + 1..].trim().to_string(),
            });
        }
    }

    None
}

/// Registry of textual speaker names discovered in one diarization call.
///
/// The first occurrence of a name fixes its canonical spelling; the exact
/// string is the identity key (no fuzzy matching). Entries are never removed.
#[derive(Debug, Default)]
pub struct SpeakerRegistry {
    names: HashMap<String, String>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a name on first sight; return the canonical identity.
    pub fn canonical(&mut self, name: &str) -> String {
        self.names
            .entry(name.to_string())
            .or_insert_with(|| name.to_string())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_name_pattern() {
        let hit = extract_speaker_name("Alice: Let's start.").unwrap();
        assert_eq!(hit.name, "Alice");
        assert_eq!(hit.remainder, "Let's start.");
    }

    #[test]
    fn test_leading_name_with_dots_and_hyphens() {
        let hit = extract_speaker_name("Dr. Smith-Jones: Agreed.").unwrap();
        assert_eq!(hit.name, "Dr. Smith-Jones");
        assert_eq!(hit.remainder, "Agreed.");
    }

    #[test]
    fn test_leading_name_whitespace_normalized() {
        let hit = extract_speaker_name("Mary   Ann: Hello there.").unwrap();
        assert_eq!(hit.name, "Mary Ann");
    }

    #[test]
    fn test_leading_name_requires_space_after_colon() {
        // "12:30" style timestamps and lowercase prefixes must not match
        assert!(extract_speaker_name("lowercase: nope").is_none());
        let hit = extract_speaker_name("Meeting at 12:30 today");
        assert!(hit.is_none());
    }

    #[test]
    fn test_bracket_label_plain_name() {
        let hit = extract_speaker_name("So [Alice] will take notes").unwrap();
        assert_eq!(hit.name, "Alice");
        assert_eq!(hit.remainder, "So  will take notes");
    }

    #[test]
    fn test_bracket_label_speaker_number() {
        let hit = extract_speaker_name("[Speaker 2] I disagree").unwrap();
        assert_eq!(hit.name, "Speaker 2");
        assert_eq!(hit.remainder, "I disagree");
    }

    #[test]
    fn test_bracket_speaker_prefix_stripped() {
        let hit = extract_speaker_name("[Speaker Bob] fine by me").unwrap();
        assert_eq!(hit.name, "Bob");
        assert_eq!(hit.remainder, "fine by me");
    }

    #[test]
    fn test_generic_colon_split() {
        // No space after the colon, so pattern 1 misses and pattern 3 fires
        let hit = extract_speaker_name("Bob Smith:sounds good").unwrap();
        assert_eq!(hit.name, "Bob Smith");
        assert_eq!(hit.remainder, "sounds good");
    }

    #[test]
    fn test_generic_colon_rejects_short_and_long_names() {
        assert!(extract_speaker_name("Ab:too short").is_none());
        let long = format!("{}:message", "A".repeat(45));
        assert!(extract_speaker_name(&long).is_none());
    }

    #[test]
    fn test_priority_leading_beats_bracket() {
        let hit = extract_speaker_name("Carol: see [Dave] about that").unwrap();
        assert_eq!(hit.name, "Carol");
        assert_eq!(hit.remainder, "see [Dave] about that");
    }

    #[test]
    fn test_no_match_yields_none() {
        assert!(extract_speaker_name("just a plain sentence").is_none());
        assert!(extract_speaker_name("").is_none());
    }

    #[test]
    fn test_registry_first_occurrence_wins() {
        let mut registry = SpeakerRegistry::new();
        assert_eq!(registry.canonical("Alice"), "Alice");
        assert_eq!(registry.canonical("Alice"), "Alice");
        assert_eq!(registry.len(), 1);

        registry.canonical("Bob");
        assert_eq!(registry.len(), 2);
    }
}
