// reconcile.rs
//
// Merges acoustic default labels with explicit textual names into the final
// per-segment speaker attribution.
//
// One forward pass over the segments. When a segment announces its speaker
// in text, that name claims the segment's acoustic cluster for every later
// segment in the same cluster; segments already emitted are never revisited.

use log::debug;
use std::collections::HashMap;

use crate::clustering::AcousticLabels;
use crate::config::DEFAULT_SPEAKER;
use crate::resolver::{self, SpeakerRegistry};
use crate::types::{AttributedSegment, Segment};

/// Attribute a speaker to every segment.
///
/// Output is the same length and order as the input; every speaker label is
/// non-empty. When a name is extracted from a segment's text, the attributed
/// text is the resolver's remainder (the marker is stripped).
pub fn reconcile(segments: &[Segment], acoustic: &AcousticLabels) -> Vec<AttributedSegment> {
    let mut alias: HashMap<String, String> = HashMap::new();
    let mut registry = SpeakerRegistry::new();
    let mut last_speaker: Option<String> = None;
    let mut attributed = Vec::with_capacity(segments.len());

    for (i, seg) in segments.iter().enumerate() {
        let mut text = seg.text.trim().to_string();
        let default_label = acoustic.label_for(i).map(str::to_string);

        // Provisional identity from the acoustic skeleton
        let provisional = default_label
            .as_ref()
            .map(|label| alias.get(label).cloned().unwrap_or_else(|| label.clone()));

        let speaker = match resolver::extract_speaker_name(&text) {
            Some(hit) => {
                let name = registry.canonical(&hit.name);
                text = hit.remainder;
                if let Some(label) = &default_label {
                    if alias.insert(label.clone(), name.clone()).is_none() {
                        debug!("Cluster '{}' claimed by '{}'", label, name);
                    }
                }
                name
            }
            None => provisional
                .or_else(|| last_speaker.clone())
                .unwrap_or_else(|| DEFAULT_SPEAKER.to_string()),
        };

        last_speaker = Some(speaker.clone());
        attributed.push(AttributedSegment {
            speaker,
            start: seg.start,
            end: seg.end,
            text,
        });
    }

    attributed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clustered(labels: &[&str]) -> AcousticLabels {
        AcousticLabels::Clustered(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_continuity_without_acoustic_labels() {
        // Scenario A: clustering unavailable, first segment names its speaker
        let segments = vec![
            Segment::new(0.0, 2.0, "Alice: Let's start."),
            Segment::new(2.0, 4.0, "Sure, sounds good."),
        ];
        let out = reconcile(&segments, &AcousticLabels::Unavailable);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].speaker, "Alice");
        assert_eq!(out[0].text, "Let's start.");
        assert_eq!(out[1].speaker, "Alice");
        assert_eq!(out[1].text, "Sure, sounds good.");
    }

    #[test]
    fn test_alias_learned_late_does_not_relabel_earlier() {
        // Scenario B: same cluster, only the second segment carries a name
        let segments = vec![
            Segment::new(0.0, 2.0, "Let me check."),
            Segment::new(2.0, 4.0, "Bob: Agreed."),
        ];
        let out = reconcile(&segments, &clustered(&["Speaker 1", "Speaker 1"]));

        assert_eq!(out[0].speaker, "Speaker 1");
        assert_eq!(out[1].speaker, "Bob");
        assert_eq!(out[1].text, "Agreed.");
    }

    #[test]
    fn test_alias_applies_to_later_cluster_members() {
        let segments = vec![
            Segment::new(0.0, 1.0, "Carol: Morning all."),
            Segment::new(1.0, 2.0, "Second thought on that."),
            Segment::new(2.0, 3.0, "I will send the notes."),
        ];
        let out = reconcile(
            &segments,
            &clustered(&["Speaker 1", "Speaker 2", "Speaker 1"]),
        );

        assert_eq!(out[0].speaker, "Carol");
        // Different cluster, no alias for it yet
        assert_eq!(out[1].speaker, "Speaker 2");
        // Same cluster as the first segment: the alias applies
        assert_eq!(out[2].speaker, "Carol");
    }

    #[test]
    fn test_alias_overwrite_is_forward_only() {
        let segments = vec![
            Segment::new(0.0, 1.0, "Dan: First."),
            Segment::new(1.0, 2.0, "unattributed"),
            Segment::new(2.0, 3.0, "Erin: Actually me."),
            Segment::new(3.0, 4.0, "unattributed again"),
        ];
        let out = reconcile(
            &segments,
            &clustered(&["Speaker 1", "Speaker 1", "Speaker 1", "Speaker 1"]),
        );

        assert_eq!(out[0].speaker, "Dan");
        assert_eq!(out[1].speaker, "Dan");
        assert_eq!(out[2].speaker, "Erin");
        // Overwritten alias affects only segments after the overwrite
        assert_eq!(out[3].speaker, "Erin");
    }

    #[test]
    fn test_all_default_when_nothing_known() {
        // Scenario C: no clustering, no names anywhere
        let segments = vec![
            Segment::new(0.0, 1.0, "first"),
            Segment::new(1.0, 2.0, "second"),
        ];
        let out = reconcile(&segments, &AcousticLabels::Unavailable);

        assert!(out.iter().all(|s| s.speaker == "Speaker 1"));
    }

    #[test]
    fn test_acoustic_default_used_without_names() {
        let segments = vec![
            Segment::new(0.0, 1.0, "one"),
            Segment::new(1.0, 2.0, "two"),
        ];
        let out = reconcile(&segments, &clustered(&["Speaker 1", "Speaker 2"]));

        assert_eq!(out[0].speaker, "Speaker 1");
        assert_eq!(out[1].speaker, "Speaker 2");
    }

    #[test]
    fn test_output_preserves_order_and_times() {
        let segments = vec![
            Segment::new(0.5, 1.5, "a"),
            Segment::new(1.5, 2.5, "b"),
            Segment::new(2.5, 3.5, "c"),
        ];
        let out = reconcile(&segments, &AcousticLabels::Unavailable);

        assert_eq!(out.len(), 3);
        for (seg, attr) in segments.iter().zip(out.iter()) {
            assert_eq!(seg.start, attr.start);
            assert_eq!(seg.end, attr.end);
            assert!(!attr.speaker.is_empty());
        }
    }

    #[test]
    fn test_text_trimmed_even_without_match() {
        let segments = vec![Segment::new(0.0, 1.0, "  padded text  ")];
        let out = reconcile(&segments, &AcousticLabels::Unavailable);
        assert_eq!(out[0].text, "padded text");
    }
}
