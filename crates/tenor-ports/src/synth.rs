use crate::types::*;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum SynthError {
    #[error("invalid voice parameters: {0}")]
    InvalidParams(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Read-only tap on the master output, for waveform and spectrum drawing.
pub trait AnalyserTap: Send + Sync {
    /// Copies the most recent samples into `out` (oldest first); returns how many were written.
    fn time_domain(&self, out: &mut [f32]) -> usize;

    /// Fills `out` with magnitudes of `out.len()` evenly spaced bins up to Nyquist.
    fn frequency_magnitudes(&self, out: &mut [f32]);

    fn window_len(&self) -> usize;
}

/// Thread model:
/// - note_on / note_off / set_volume are called from the coordinator thread
/// - render is called from the audio thread
/// Both sides lock the same state, so note changes are atomic relative to a render block.
pub trait SynthPort: Send + Sync {
    fn set_sample_rate(&self, sample_rate_hz: u32);

    fn note_on(&self, note: Note, velocity: Velocity);
    fn note_off(&self, note: Note);
    fn all_notes_off(&self);

    fn set_volume(&self, volume: Volume01);
    fn volume(&self) -> Volume01;

    /// True iff at least one voice is live (held, not yet released).
    fn is_playing(&self) -> bool;

    fn analyser(&self) -> Arc<dyn AnalyserTap>;

    /// Called by audio thread: render frames to out_l/out_r
    fn render(&self, frames: usize, out_l: &mut [f32], out_r: &mut [f32]);
}
