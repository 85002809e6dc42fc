use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::slice::{Slice, SliceId};
use crate::window::Window;

pub const MIN_PLAYBACK_RATE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceMode {
    #[default]
    Auto,
    Manual,
    Chromatic,
    Random,
}

/// Time-mapping policy applied during playback advancement.
///
/// `Curve` is a reserved hook for a future nonlinear time-warp; it behaves
/// as identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarpMode {
    #[default]
    Linear,
    Rate,
    Curve,
}

/// Note-to-slot assignment for random mode, derived from a contiguous note
/// range by shuffling `[0, range_len)`. Regenerated wholesale, never
/// partially updated.
#[derive(Debug, Clone, Default)]
pub struct RandomMapping {
    slots: HashMap<i32, usize>,
}

impl RandomMapping {
    pub fn generate(lo_note: i32, hi_note: i32, seed: u64) -> Self {
        let (lo, hi) = if lo_note <= hi_note {
            (lo_note, hi_note)
        } else {
            (hi_note, lo_note)
        };
        let count = (hi - lo + 1) as usize;
        let mut order: Vec<usize> = (0..count).collect();

        // Fisher-Yates with an LCG; musical shuffling needs no more.
        let mut rng = seed | 1;
        for i in (1..count).rev() {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            let j = (rng >> 33) as usize % (i + 1);
            order.swap(i, j);
        }

        let slots = order
            .into_iter()
            .enumerate()
            .map(|(i, slot)| (lo + i as i32, slot))
            .collect();
        Self { slots }
    }

    pub fn slot(&self, note: i32) -> Option<usize> {
        self.slots.get(&note).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Aggregate addressing state read on every trigger and mutated only by
/// editing collaborators, all on the engine's control context.
#[derive(Debug, Clone)]
pub struct SamplerState {
    pub window: Window,
    slices: Vec<Slice>,
    pub mode: SliceMode,
    pub base_note: i32,
    pub base_octave: i32,
    random_lo: i32,
    random_hi: i32,
    random_mapping: RandomMapping,
    pub warp: WarpMode,
    playback_rate: f64,
    pub latency_offset: f64,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            window: Window::default(),
            slices: Vec::new(),
            mode: SliceMode::default(),
            base_note: 60,
            base_octave: 3,
            random_lo: 48,
            random_hi: 72,
            random_mapping: RandomMapping::generate(48, 72, time_seed()),
            warp: WarpMode::default(),
            playback_rate: 1.0,
            latency_offset: 0.0,
        }
    }
}

impl SamplerState {
    pub fn set_window(&mut self, start_norm: f64, end_norm: f64) {
        self.window.set_bounds(start_norm, end_norm);
    }

    pub fn add_slice(&mut self, center_norm: f64, half_width_norm: f64) -> SliceId {
        let slice = Slice::new(center_norm, half_width_norm);
        let id = slice.id;
        self.slices.push(slice);
        id
    }

    pub fn move_slice(&mut self, id: SliceId, center_norm: f64) {
        if let Some(slice) = self.slice_mut(id) {
            slice.set_center(center_norm);
        }
    }

    pub fn resize_slice(&mut self, id: SliceId, half_width_norm: f64) {
        if let Some(slice) = self.slice_mut(id) {
            slice.set_half_width(half_width_norm);
        }
    }

    pub fn remove_slice(&mut self, id: SliceId) {
        self.slices.retain(|s| s.id != id);
    }

    pub fn assign_note(&mut self, id: SliceId, note: i32) {
        if let Some(slice) = self.slice_mut(id) {
            slice.assign_note(note);
        }
    }

    pub fn unassign_note(&mut self, id: SliceId, note: i32) {
        if let Some(slice) = self.slice_mut(id) {
            slice.unassign_note(note);
        }
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn set_mode(&mut self, mode: SliceMode) {
        self.mode = mode;
    }

    pub fn set_base_note(&mut self, note: i32) {
        self.base_note = note;
    }

    pub fn set_base_octave(&mut self, octave: i32) {
        self.base_octave = octave;
    }

    pub fn set_random_range(&mut self, lo_note: i32, hi_note: i32) {
        self.random_lo = lo_note.min(hi_note);
        self.random_hi = lo_note.max(hi_note);
        self.reshuffle();
    }

    pub fn random_range(&self) -> (i32, i32) {
        (self.random_lo, self.random_hi)
    }

    pub fn reshuffle(&mut self) {
        self.reshuffle_with_seed(time_seed());
    }

    pub fn reshuffle_with_seed(&mut self, seed: u64) {
        self.random_mapping = RandomMapping::generate(self.random_lo, self.random_hi, seed);
    }

    pub fn random_mapping(&self) -> &RandomMapping {
        &self.random_mapping
    }

    pub fn set_warp_mode(&mut self, warp: WarpMode) {
        self.warp = warp;
    }

    pub fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate.max(MIN_PLAYBACK_RATE);
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn set_latency_offset(&mut self, seconds: f64) {
        self.latency_offset = seconds;
    }

    fn slice_mut(&mut self, id: SliceId) -> Option<&mut Slice> {
        self.slices.iter_mut().find(|s| s.id == id)
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x5eed)
}
