//! Diarize CLI
//!
//! Attributes speakers to a transcript against its recording:
//!
//!     diarize <recording.wav> <segments.json> [out.json]
//!
//! `segments.json` is an array of `{start, end, text}` objects as produced
//! by the transcription stage. The attributed transcript is written to
//! `out.json` when given, otherwise printed to stdout.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use meeting_diarization::{DiarizationConfig, DiarizationService, Segment};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 || args.len() > 3 {
        bail!("usage: diarize <recording.wav> <segments.json> [out.json]");
    }

    let audio_path = Path::new(&args[0]);
    let segments_path = Path::new(&args[1]);
    let out_path: Option<PathBuf> = args.get(2).map(PathBuf::from);

    let raw = std::fs::read_to_string(segments_path)
        .with_context(|| format!("Failed to read segments: {}", segments_path.display()))?;
    let segments: Vec<Segment> =
        serde_json::from_str(&raw).context("Segments file is not a valid segment array")?;

    // No primary diarizer is wired into the CLI; run the fallback pipeline
    let config = DiarizationConfig {
        use_primary_diarizer: false,
        ..Default::default()
    };
    let service = DiarizationService::new(config);

    match out_path {
        Some(path) => {
            let attributed = service.diarize_to_json(audio_path, &segments, &path)?;
            log::info!(
                "Wrote {} attributed segments to {}",
                attributed.len(),
                path.display()
            );
        }
        None => {
            let attributed = service.diarize(audio_path, &segments);
            println!("{}", serde_json::to_string_pretty(&attributed)?);
        }
    }

    Ok(())
}
