use std::path::Path;
use std::sync::Arc;

use log::{info, warn};

use vslice_media::{Frame, FrameStore};
use vslice_state::resolve::TimeRange;
use vslice_state::sampler::{SamplerState, SliceMode, WarpMode};
use vslice_state::slice::SliceId;

use crate::constants::DEFAULT_BUDGET_BYTES;
use crate::workers::load_worker::{self, LoadRequest, LoadResult, LoadWorkerChannels};

/// The single playback voice. `trigger_id` is bumped on every accepted
/// trigger so asynchronous completions can detect they've been superseded.
#[derive(Debug, Default)]
struct Voice {
    trigger_id: u64,
    slice_start_seconds: f64,
    slice_end_seconds: f64,
    elapsed_seconds: f64,
    current: Option<usize>,
    playing: bool,
}

/// Mono-voice slice playback engine.
///
/// Everything here runs on one control context: the runner's tick loop
/// serializes triggers, `advance`, and model mutations, so no internal
/// locking is needed. Decoding happens once per open on a worker thread
/// and publishes a frozen store; `load_generation` discards results that a
/// later open has superseded.
pub struct SamplerEngine {
    sampler: SamplerState,
    store: Option<Arc<FrameStore>>,
    voice: Voice,
    load: LoadWorkerChannels,
    load_generation: u64,
    budget_bytes: usize,
    status: String,
}

impl Default for SamplerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplerEngine {
    pub fn new() -> Self {
        Self {
            sampler: SamplerState::default(),
            store: None,
            voice: Voice::default(),
            load: load_worker::spawn_load_worker(),
            load_generation: 0,
            budget_bytes: DEFAULT_BUDGET_BYTES,
            status: "no media".to_string(),
        }
    }

    pub fn set_budget_bytes(&mut self, budget_bytes: usize) {
        self.budget_bytes = budget_bytes;
    }

    /// Begins loading a new source. The old store is discarded immediately
    /// (triggers no-op until the decode finishes) and any in-flight decode
    /// result for a previous open becomes stale.
    pub fn open_video(&mut self, path: &Path) {
        self.stop();
        self.store = None;
        self.voice = Voice::default();
        self.load_generation += 1;
        self.status = format!("loading {}", path.display());
        let _ = self.load.req_tx.send(LoadRequest {
            generation: self.load_generation,
            path: path.to_path_buf(),
            budget_bytes: self.budget_bytes,
        });
    }

    /// Drains decode results; called once per tick by the runner.
    pub fn poll_load(&mut self) {
        while let Ok(result) = self.load.result_rx.try_recv() {
            self.apply_load_result(result);
        }
    }

    fn apply_load_result(&mut self, result: LoadResult) {
        if result.generation != self.load_generation {
            // A newer open superseded this decode.
            return;
        }
        match result.outcome {
            Ok(store) => {
                self.status = format!(
                    "ready: {} frames, {:.2}s",
                    store.len(),
                    store.duration_seconds()
                );
                info!("{} loaded: {}", result.path.display(), self.status);
                self.store = Some(Arc::new(store));
            }
            Err(e) => {
                warn!("load failed: {e}");
                self.status = e;
                self.store = None;
            }
        }
    }

    /// Resolves and starts a new playback episode. Always legal; no-ops
    /// without media or when the resolved range is degenerate. A new
    /// trigger always preempts the current voice (mono).
    pub fn trigger(&mut self, note: i32, i: f64, o: f64) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let Some(range) = self
            .sampler
            .resolve(note, i, o, store.duration_seconds())
        else {
            return;
        };
        self.start_voice(&store, range);
    }

    fn start_voice(&mut self, store: &FrameStore, range: TimeRange) {
        self.voice.trigger_id += 1;
        self.voice.slice_start_seconds = range.start_seconds;
        self.voice.slice_end_seconds = range.end_seconds;
        self.voice.elapsed_seconds = 0.0;
        self.voice.current = Some(store.frame_at_or_after(range.start_seconds));
        self.voice.playing = true;
    }

    /// Advances the voice by `dt` seconds of wall time. Driven at the
    /// display tick rate; the only other mutator of playback state is
    /// `trigger`.
    pub fn advance(&mut self, dt: f64) {
        if !self.voice.playing {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };

        let effective_rate = match self.sampler.warp {
            WarpMode::Rate => self.sampler.playback_rate(),
            // Curve is a reserved identity hook.
            WarpMode::Linear | WarpMode::Curve => 1.0,
        };
        self.voice.elapsed_seconds += dt * effective_rate;
        let now = self.voice.slice_start_seconds + self.voice.elapsed_seconds;

        if now >= self.voice.slice_end_seconds {
            // Slice exhausted: stop advancing, keep the last frame visible.
            self.voice.playing = false;
            return;
        }

        let Some(mut index) = self.voice.current else {
            return;
        };
        while index + 1 < store.len() && store.frame(index + 1).pts_seconds <= now {
            index += 1;
        }
        self.voice.current = Some(index);
    }

    /// Global stop: the mono voice has no per-note tracking, so a note-off
    /// for any note chokes whatever is playing.
    pub fn stop_if_needed(&mut self, _note: i32) {
        self.stop();
    }

    pub fn stop(&mut self) {
        self.voice.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.voice.playing
    }

    /// Frame the display collaborator should paint, if any has been
    /// selected by a trigger yet.
    pub fn current_frame(&self) -> Option<&Frame> {
        let store = self.store.as_deref()?;
        let index = self.voice.current?;
        Some(store.frame(index.min(store.len().saturating_sub(1))))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn has_media(&self) -> bool {
        self.store.is_some()
    }

    pub fn sampler(&self) -> &SamplerState {
        &self.sampler
    }

    // Model mutators, forwarded for editing collaborators. These touch
    // only the addressing model, never the frame store.

    pub fn set_window(&mut self, start_norm: f64, end_norm: f64) {
        self.sampler.set_window(start_norm, end_norm);
    }

    pub fn add_slice(&mut self, center_norm: f64, half_width_norm: f64) -> SliceId {
        self.sampler.add_slice(center_norm, half_width_norm)
    }

    pub fn move_slice(&mut self, id: SliceId, center_norm: f64) {
        self.sampler.move_slice(id, center_norm);
    }

    pub fn resize_slice(&mut self, id: SliceId, half_width_norm: f64) {
        self.sampler.resize_slice(id, half_width_norm);
    }

    pub fn remove_slice(&mut self, id: SliceId) {
        self.sampler.remove_slice(id);
    }

    pub fn assign_note(&mut self, id: SliceId, note: i32) {
        self.sampler.assign_note(id, note);
    }

    pub fn unassign_note(&mut self, id: SliceId, note: i32) {
        self.sampler.unassign_note(id, note);
    }

    pub fn set_mode(&mut self, mode: SliceMode) {
        self.sampler.set_mode(mode);
    }

    pub fn set_base_note(&mut self, note: i32) {
        self.sampler.set_base_note(note);
    }

    pub fn set_base_octave(&mut self, octave: i32) {
        self.sampler.set_base_octave(octave);
    }

    pub fn set_random_range(&mut self, lo_note: i32, hi_note: i32) {
        self.sampler.set_random_range(lo_note, hi_note);
    }

    pub fn reshuffle(&mut self) {
        self.sampler.reshuffle();
    }

    pub fn set_warp_mode(&mut self, warp: WarpMode) {
        self.sampler.set_warp_mode(warp);
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.sampler.set_playback_rate(rate);
    }

    pub fn set_latency_offset(&mut self, seconds: f64) {
        self.sampler.set_latency_offset(seconds);
    }
}
