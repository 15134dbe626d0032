// Meeting Diarization - speaker attribution for transcribed recordings
//
// Attributes a consistent speaker identity to each time-stamped transcript
// segment of a meeting recording. A primary (neural) diarizer can be plugged
// in; when it is disabled or fails, an engineered fallback takes over:
//
// - MFCC descriptors per transcript segment (features)
// - silhouette-gated k-means to pick a speaker count (clustering)
// - forward/backward gap filling for unfeaturizable segments
// - explicit "Name:" / "[Name]" markers extracted from text (resolver)
// - a single-pass alias reconciliation merging both signals (reconcile)
//
// Every step degrades gracefully; the worst case is a uniform "Speaker 1"
// labeling, never an error.

pub mod audio;
pub mod clustering;
pub mod config;
pub mod features;
pub mod reconcile;
pub mod resolver;
pub mod service;
pub mod types;

pub use clustering::AcousticLabels;
pub use config::DiarizationConfig;
pub use service::{DiarizationService, PrimaryDiarizer};
pub use types::{AttributedSegment, Segment, SpeakerTurn};
