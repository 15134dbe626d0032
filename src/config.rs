//! Diarization Configuration and Constants

use serde::{Deserialize, Serialize};

// Feature extraction constants
pub const N_FFT: usize = 512;
pub const WIN_LENGTH: usize = 400;
pub const HOP_LENGTH: usize = 160;
pub const N_MELS: usize = 40;
pub const N_MFCC: usize = 20;
pub const FMIN: f32 = 0.0;
pub const LOG_ZERO_GUARD: f32 = 5.960464478e-8;

/// Minimum segment duration eligible for feature extraction (seconds)
pub const MIN_SEGMENT_DURATION: f64 = 0.2;
/// Degenerate spans (end <= start) are extended to this duration before clamping
pub const MIN_SPAN_EXTENSION: f64 = 0.05;

// Cluster selection constants
pub const KMEANS_SEED: u64 = 0;
pub const KMEANS_RESTARTS: usize = 10;
pub const KMEANS_MAX_ITERS: usize = 100;
/// A candidate cluster count must beat the running best silhouette by this
/// margin to be accepted; keeps the sweep biased toward fewer speakers.
pub const SILHOUETTE_MARGIN: f32 = 0.05;

/// Label used whenever no better attribution is available
pub const DEFAULT_SPEAKER: &str = "Speaker 1";

/// Configuration for the diarization service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiarizationConfig {
    /// Maximum number of speakers the fallback clustering may produce (min 2)
    pub max_speakers: usize,
    /// Attempt the primary (neural) diarizer before the engineered fallback
    pub use_primary_diarizer: bool,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            max_speakers: 4,
            use_primary_diarizer: true,
        }
    }
}

impl DiarizationConfig {
    /// `max_speakers` with the documented lower bound of 2 applied.
    pub fn effective_max_speakers(&self) -> usize {
        self.max_speakers.max(2)
    }
}
