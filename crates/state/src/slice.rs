use std::collections::HashSet;

use uuid::Uuid;

pub const MIN_HALF_WIDTH: f64 = 1e-3;
pub const MAX_HALF_WIDTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliceId(Uuid);

impl SliceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SliceId {
    fn default() -> Self {
        Self::new()
    }
}

/// A user-defined sub-range within the window, optionally bound to notes.
///
/// Geometry is window-relative: `center_norm ± half_width_norm` must stay
/// inside [0, 1]. Every mutator re-clamps, so the invariant holds after
/// construction, drags, and window-driven reclamps alike.
#[derive(Debug, Clone)]
pub struct Slice {
    pub id: SliceId,
    center_norm: f64,
    half_width_norm: f64,
    notes: HashSet<i32>,
}

impl Slice {
    pub fn new(center_norm: f64, half_width_norm: f64) -> Self {
        let mut s = Self {
            id: SliceId::new(),
            center_norm,
            half_width_norm,
            notes: HashSet::new(),
        };
        s.clamp_geometry();
        s
    }

    pub fn center_norm(&self) -> f64 {
        self.center_norm
    }

    pub fn half_width_norm(&self) -> f64 {
        self.half_width_norm
    }

    pub fn start_norm(&self) -> f64 {
        self.center_norm - self.half_width_norm
    }

    pub fn end_norm(&self) -> f64 {
        self.center_norm + self.half_width_norm
    }

    pub fn set_center(&mut self, center_norm: f64) {
        self.center_norm = center_norm;
        self.clamp_geometry();
    }

    pub fn set_half_width(&mut self, half_width_norm: f64) {
        self.half_width_norm = half_width_norm;
        self.clamp_geometry();
    }

    pub fn assign_note(&mut self, note: i32) {
        self.notes.insert(note);
    }

    pub fn unassign_note(&mut self, note: i32) {
        self.notes.remove(&note);
    }

    pub fn responds_to(&self, note: i32) -> bool {
        self.notes.contains(&note)
    }

    pub fn assigned_notes(&self) -> impl Iterator<Item = i32> + '_ {
        self.notes.iter().copied()
    }

    fn clamp_geometry(&mut self) {
        self.half_width_norm = self.half_width_norm.clamp(MIN_HALF_WIDTH, MAX_HALF_WIDTH);
        self.center_norm = self
            .center_norm
            .clamp(self.half_width_norm, 1.0 - self.half_width_norm);
    }
}
