// service.rs
//
// Diarization orchestration: try the primary (neural) strategy first, fall
// back to the engineered pipeline (MFCC clustering + textual resolution),
// and optionally write the attributed transcript as a JSON snapshot.

use anyhow::Result;
use log::{info, warn};
use std::path::Path;

use crate::audio;
use crate::clustering::{self, AcousticLabels};
use crate::config::{DiarizationConfig, DEFAULT_SPEAKER};
use crate::reconcile;
use crate::types::{AttributedSegment, Segment, SpeakerTurn};

/// External neural diarization strategy.
///
/// Implementations run a full diarization model over the recording and
/// report speaker turns. Any error makes the service fall back to the
/// engineered pipeline; the fallback never consults the primary again
/// within the same call.
pub trait PrimaryDiarizer: Send + Sync {
    fn diarize(&self, audio_path: &Path) -> Result<Vec<SpeakerTurn>>;
}

/// Speaker attribution service for one recording at a time.
///
/// Fully synchronous and CPU-bound; callers should run it off any
/// interactive thread. All state is local to a single `diarize` call.
pub struct DiarizationService {
    config: DiarizationConfig,
    primary: Option<Box<dyn PrimaryDiarizer>>,
}

impl DiarizationService {
    pub fn new(config: DiarizationConfig) -> Self {
        Self {
            config,
            primary: None,
        }
    }

    /// Install a primary diarization strategy (consulted only when
    /// `use_primary_diarizer` is set).
    pub fn with_primary(mut self, primary: Box<dyn PrimaryDiarizer>) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Attribute a speaker to every transcript segment.
    ///
    /// Never fails for input-level problems: an unreadable recording, empty
    /// transcript, or degenerate clustering all degrade toward a uniform
    /// single-speaker labeling.
    pub fn diarize(&self, audio_path: &Path, segments: &[Segment]) -> Vec<AttributedSegment> {
        if self.config.use_primary_diarizer {
            if let Some(primary) = &self.primary {
                match primary.diarize(audio_path) {
                    Ok(turns) => {
                        info!("Primary diarizer produced {} turns", turns.len());
                        return align_to_turns(segments, &turns);
                    }
                    Err(e) => {
                        warn!("Primary diarizer failed, using fallback: {:#}", e);
                    }
                }
            }
        }

        self.fallback(audio_path, segments)
    }

    /// `diarize` plus a best-effort JSON snapshot of the result.
    ///
    /// Only the snapshot write can surface an error; the attribution itself
    /// follows the same degradation rules as `diarize`.
    pub fn diarize_to_json(
        &self,
        audio_path: &Path,
        segments: &[Segment],
        out_json: &Path,
    ) -> Result<Vec<AttributedSegment>> {
        let attributed = self.diarize(audio_path, segments);
        crate::types::write_snapshot(&attributed, out_json)?;
        Ok(attributed)
    }

    fn fallback(&self, audio_path: &Path, segments: &[Segment]) -> Vec<AttributedSegment> {
        let acoustic = match audio::load_wav(audio_path) {
            Ok((signal, sample_rate)) => clustering::cluster_segments_by_voice(
                &signal,
                sample_rate,
                segments,
                self.config.effective_max_speakers(),
            ),
            Err(e) => {
                warn!("Audio decode failed, acoustic clustering disabled: {:#}", e);
                AcousticLabels::Unavailable
            }
        };

        reconcile::reconcile(segments, &acoustic)
    }
}

/// Align transcript segments to primary speaker turns by temporal midpoint.
///
/// The first turn (in given order) containing a segment's midpoint wins;
/// uncovered segments get the default label. Segment text passes through
/// untouched on this path.
fn align_to_turns(segments: &[Segment], turns: &[SpeakerTurn]) -> Vec<AttributedSegment> {
    segments
        .iter()
        .map(|seg| {
            let mid = seg.midpoint();
            let speaker = turns
                .iter()
                .find(|turn| turn.contains(mid))
                .map(|turn| turn.speaker.clone())
                .unwrap_or_else(|| DEFAULT_SPEAKER.to_string());

            AttributedSegment {
                speaker,
                start: seg.start,
                end: seg.end,
                text: seg.text.clone(),
            }
        })
        .collect()
}
