// types.rs
//
// Transcript data types shared across the diarization pipeline.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A transcript segment as produced by the transcription engine.
///
/// Times are seconds from the start of the recording. Segments arrive in
/// temporal order; `end >= start` is expected but not enforced here (the
/// feature extractor clamps degenerate spans before using them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Temporal midpoint, used to align segments against speaker turns.
    pub fn midpoint(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// A transcript segment with a resolved speaker label.
///
/// Output unit of the diarization service: one per input segment, same
/// order, and `speaker` is always non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedSegment {
    pub speaker: String,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// A speaker turn reported by a primary (neural) diarizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    pub speaker: String,
}

impl SpeakerTurn {
    /// Whether the given instant falls inside this turn (inclusive bounds).
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Write attributed segments as a UTF-8, 2-space-indented JSON array.
///
/// Parent directories are created if missing. This is the diagnostic
/// snapshot artifact; callers treat the write as best-effort.
pub fn write_snapshot(segments: &[AttributedSegment], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot directory: {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(segments).context("Failed to serialize segments")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let seg = Segment::new(1.0, 2.0, "hello");
        assert!((seg.midpoint() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_turn_contains_inclusive() {
        let turn = SpeakerTurn {
            start: 0.0,
            end: 3.0,
            speaker: "A".to_string(),
        };
        assert!(turn.contains(0.0));
        assert!(turn.contains(1.5));
        assert!(turn.contains(3.0));
        assert!(!turn.contains(3.1));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("diarized.json");

        let segments = vec![
            AttributedSegment {
                speaker: "Alice".to_string(),
                start: 0.0,
                end: 2.0,
                text: "Let's start.".to_string(),
            },
            AttributedSegment {
                speaker: "Speaker 1".to_string(),
                start: 2.0,
                end: 4.0,
                text: "Sure.".to_string(),
            },
        ];

        write_snapshot(&segments, &path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        // 2-space indentation
        assert!(raw.contains("\n  {"));

        let parsed: Vec<AttributedSegment> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, segments);
    }
}
