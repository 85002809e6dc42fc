/// Smallest span the window can collapse to. Keeps offset/span math away
/// from division-by-zero when both handles are dragged onto each other.
pub const MIN_SPAN: f64 = 1e-4;

/// Normalized sub-range of the full video timeline that all slice
/// addressing is relative to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub start_norm: f64,
    pub end_norm: f64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            start_norm: 0.0,
            end_norm: 1.0,
        }
    }
}

impl Window {
    pub fn new(start_norm: f64, end_norm: f64) -> Self {
        let mut w = Self::default();
        w.set_bounds(start_norm, end_norm);
        w
    }

    pub fn set_bounds(&mut self, start_norm: f64, end_norm: f64) {
        let start = start_norm.clamp(0.0, 1.0);
        let end = end_norm.clamp(0.0, 1.0);
        if start <= end {
            self.start_norm = start;
            self.end_norm = end;
        } else {
            self.start_norm = end;
            self.end_norm = start;
        }
    }

    pub fn offset(&self) -> f64 {
        self.start_norm
    }

    pub fn span(&self) -> f64 {
        (self.end_norm - self.start_norm).max(MIN_SPAN)
    }

    /// Maps a window-relative normalized position to a global one.
    pub fn to_global_norm(&self, window_norm: f64) -> f64 {
        (self.offset() + window_norm * self.span()).clamp(0.0, 1.0)
    }
}
