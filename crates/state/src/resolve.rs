//! Trigger resolution: maps a `(note, i, o)` control event to an absolute
//! time range under the active slice mode. Every slice-driven mode funnels
//! through the same virtual-slice resolver so the window transform and the
//! trim-to-window clamp are applied identically.

use crate::sampler::{SamplerState, SliceMode};

/// Notes in the chromatic bank.
pub const CHROMATIC_BANK_LEN: i32 = 24;

/// Half-width of a virtual slice, window-normalized.
pub const VIRTUAL_SLICE_HALF_WIDTH: f64 = 0.05;

/// Absolute playback range in seconds, half-open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl SamplerState {
    /// Resolves a trigger to an absolute time range, or `None` for a no-op.
    ///
    /// A `None` is not an error: zero-length slices, ranges collapsed by
    /// the trim clamp, and reversed `i`/`o` pairs are all dropped silently.
    pub fn resolve(&self, note: i32, i: f64, o: f64, duration_seconds: f64) -> Option<TimeRange> {
        match self.mode {
            SliceMode::Auto => self.resolve_auto(i, o, duration_seconds),
            SliceMode::Manual => self.resolve_manual(note, i, o, duration_seconds),
            SliceMode::Chromatic => {
                let bank_start = (self.base_octave + 2) * 12;
                let index = note - bank_start;
                if (0..CHROMATIC_BANK_LEN).contains(&index) {
                    self.resolve_virtual_slot(index as usize, CHROMATIC_BANK_LEN as usize, duration_seconds)
                } else {
                    self.resolve_auto(i, o, duration_seconds)
                }
            }
            SliceMode::Random => match self.random_mapping().slot(note) {
                Some(slot) => {
                    self.resolve_virtual_slot(slot, self.random_mapping().len(), duration_seconds)
                }
                None => self.resolve_auto(i, o, duration_seconds),
            },
        }
    }

    /// Direct-range addressing: `i`/`o` are window-relative positions and
    /// the window's offset/span is applied exactly once, here.
    fn resolve_auto(&self, i: f64, o: f64, duration_seconds: f64) -> Option<TimeRange> {
        let start = self.window.to_global_norm(i) * duration_seconds + self.latency_offset;
        let end = self.window.to_global_norm(o) * duration_seconds + self.latency_offset;
        non_empty(start, end)
    }

    fn resolve_manual(&self, note: i32, i: f64, o: f64, duration_seconds: f64) -> Option<TimeRange> {
        if self.slices().is_empty() {
            return self.resolve_auto(i, o, duration_seconds);
        }
        let slice = match self.slices().iter().find(|s| s.responds_to(note)) {
            Some(s) => s,
            None => {
                let idx = (note - self.base_note).clamp(0, self.slices().len() as i32 - 1);
                &self.slices()[idx as usize]
            }
        };
        self.resolve_windowed(slice.start_norm(), slice.end_norm(), duration_seconds)
    }

    /// Equal-width virtual slice `slot` of `count`, centered on
    /// `(slot + 0.5) / count` of the window.
    fn resolve_virtual_slot(
        &self,
        slot: usize,
        count: usize,
        duration_seconds: f64,
    ) -> Option<TimeRange> {
        if count == 0 {
            return None;
        }
        let center = (slot as f64 + 0.5) / count as f64;
        self.resolve_windowed(
            center - VIRTUAL_SLICE_HALF_WIDTH,
            center + VIRTUAL_SLICE_HALF_WIDTH,
            duration_seconds,
        )
    }

    /// Window-relative range to absolute seconds, clamped so a slice never
    /// plays outside the active window even if it was defined before the
    /// window moved.
    fn resolve_windowed(
        &self,
        start_window_norm: f64,
        end_window_norm: f64,
        duration_seconds: f64,
    ) -> Option<TimeRange> {
        let trim_start = self.window.offset() * duration_seconds;
        let trim_end = (self.window.offset() + self.window.span()).min(1.0) * duration_seconds;

        let start = (self.window.to_global_norm(start_window_norm) * duration_seconds)
            .clamp(trim_start, trim_end)
            + self.latency_offset;
        let end = (self.window.to_global_norm(end_window_norm) * duration_seconds)
            .clamp(trim_start, trim_end)
            + self.latency_offset;
        non_empty(start, end)
    }
}

fn non_empty(start_seconds: f64, end_seconds: f64) -> Option<TimeRange> {
    if end_seconds > start_seconds {
        Some(TimeRange {
            start_seconds,
            end_seconds,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auto_state(window_start: f64, window_end: f64) -> SamplerState {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Auto);
        state.set_window(window_start, window_end);
        state
    }

    #[test]
    fn auto_full_window_maps_directly() {
        let state = auto_state(0.0, 1.0);
        let range = state.resolve(60, 0.25, 0.75, 2.0).unwrap();
        assert!((range.start_seconds - 0.5).abs() < 1e-9);
        assert!((range.end_seconds - 1.5).abs() < 1e-9);
    }

    #[test]
    fn auto_stays_inside_duration_for_any_window() {
        let duration = 7.0;
        for wi in 0..=10 {
            for wo in wi..=10 {
                let state = auto_state(wi as f64 / 10.0, wo as f64 / 10.0);
                for i in 0..=4 {
                    for o in 0..=4 {
                        if let Some(r) =
                            state.resolve(60, i as f64 / 4.0, o as f64 / 4.0, duration)
                        {
                            assert!(r.start_seconds >= 0.0);
                            assert!(r.end_seconds <= duration + 1e-9);
                            assert!(r.end_seconds > r.start_seconds);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn auto_reversed_range_is_a_noop() {
        let state = auto_state(0.0, 1.0);
        assert_eq!(state.resolve(60, 0.8, 0.2, 2.0), None);
        assert_eq!(state.resolve(60, 0.5, 0.5, 2.0), None);
    }

    #[test]
    fn auto_applies_latency_offset_to_both_ends() {
        let mut state = auto_state(0.0, 1.0);
        state.set_latency_offset(0.1);
        let range = state.resolve(60, 0.0, 0.5, 2.0).unwrap();
        assert!((range.start_seconds - 0.1).abs() < 1e-9);
        assert!((range.end_seconds - 1.1).abs() < 1e-9);
    }

    #[test]
    fn manual_assigned_note_maps_through_window() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Manual);
        state.set_window(0.2, 0.8);
        let id = state.add_slice(0.5, 0.1);
        state.assign_note(id, 60);

        let range = state.resolve(60, 0.0, 0.0, 10.0).unwrap();
        assert!((range.start_seconds - 4.4).abs() < 1e-9);
        assert!((range.end_seconds - 5.6).abs() < 1e-9);
    }

    #[test]
    fn manual_unassigned_note_uses_index_fallback() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Manual);
        state.set_base_note(60);
        state.add_slice(0.25, 0.05);
        state.add_slice(0.75, 0.05);

        // Note 61 -> index 1; notes below the base clamp to index 0.
        let second = state.resolve(61, 0.0, 0.0, 10.0).unwrap();
        assert!((second.start_seconds - 7.0).abs() < 1e-9);
        let first = state.resolve(40, 0.0, 0.0, 10.0).unwrap();
        assert!((first.start_seconds - 2.0).abs() < 1e-9);
        // Above the last slice clamps to the last index.
        let last = state.resolve(90, 0.0, 0.0, 10.0).unwrap();
        assert_eq!(last, second);
    }

    #[test]
    fn manual_with_no_slices_falls_back_to_auto() {
        let mut state = auto_state(0.0, 1.0);
        state.set_mode(SliceMode::Manual);
        let range = state.resolve(60, 0.25, 0.75, 2.0).unwrap();
        assert!((range.start_seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn manual_slice_is_trimmed_to_the_window() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Manual);
        let id = state.add_slice(0.5, 0.1);
        state.assign_note(id, 60);
        // Window moved after the slice was defined: clamping to the trim
        // bounds can collapse the range entirely, which drops the trigger.
        state.set_window(0.2, 0.8);
        let inside = state.resolve(60, 0.0, 0.0, 10.0).unwrap();
        assert!(inside.start_seconds >= 2.0 - 1e-9);
        assert!(inside.end_seconds <= 8.0 + 1e-9);
    }

    #[test]
    fn fully_collapsed_window_drops_slice_triggers() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Manual);
        let id = state.add_slice(0.5, 0.1);
        state.assign_note(id, 60);
        state.set_window(1.0, 1.0);
        assert_eq!(state.resolve(60, 0.0, 0.0, 10.0), None);
    }

    #[test]
    fn chromatic_bank_covers_24_notes() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Chromatic);
        state.set_base_octave(3);
        let bank_start = (3 + 2) * 12;

        // First bank note: center 0.5/24, half-width 0.05, so the start
        // clamps to the window edge.
        let first = state.resolve(bank_start, 0.0, 0.0, 24.0).unwrap();
        assert!((first.start_seconds - 0.0).abs() < 1e-6);
        assert!((first.end_seconds - (0.5 / 24.0 + 0.05) * 24.0).abs() < 1e-6);

        let last = state.resolve(bank_start + 23, 0.0, 0.0, 24.0).unwrap();
        assert!((last.end_seconds - 24.0).abs() < 1e-6);
        assert!(last.start_seconds > first.start_seconds);
    }

    #[test]
    fn chromatic_out_of_bank_falls_back_to_auto() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Chromatic);
        state.set_base_octave(3);
        let below = (3 + 2) * 12 - 1;
        let range = state.resolve(below, 0.25, 0.75, 2.0).unwrap();
        assert!((range.start_seconds - 0.5).abs() < 1e-9);
    }

    #[test]
    fn random_mapped_notes_hit_their_slot() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Random);
        state.set_random_range(48, 72);
        state.reshuffle_with_seed(11);

        let count = state.random_mapping().len() as f64;
        for note in 48..=72 {
            let slot = state.random_mapping().slot(note).unwrap() as f64;
            let range = state.resolve(note, 0.0, 0.0, 10.0).unwrap();
            let center = (slot + 0.5) / count * 10.0;
            assert!((range.start_seconds - (center - 0.5).clamp(0.0, 10.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn random_out_of_range_falls_back_to_auto() {
        let mut state = SamplerState::default();
        state.set_mode(SliceMode::Random);
        state.set_random_range(48, 72);
        let range = state.resolve(90, 0.25, 0.75, 2.0).unwrap();
        assert!((range.start_seconds - 0.5).abs() < 1e-9);
    }
}
