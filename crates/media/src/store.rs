use std::path::Path;

use log::{info, warn};

use crate::decoder::SequentialDecoder;
use crate::metadata;

/// Floor on the sampling rate so even very long sources keep enough
/// temporal resolution to feel like video.
pub const MIN_SAMPLE_FPS: f64 = 5.0;

/// Assumed source rate when the container does not report one.
pub const DEFAULT_NOMINAL_FPS: f64 = 30.0;

const FALLBACK_RESOLUTION: (u32, u32) = (640, 360);

/// A single decoded, upright BGRA frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pts_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub bgra: Vec<u8>,
}

/// Time-indexed, memory-bounded frame sequence for one source video.
///
/// Populated once by `load` on a worker thread and frozen afterwards;
/// readers only ever see a complete store. Timestamps are strictly
/// increasing, enforced by temporal thinning during decode.
pub struct FrameStore {
    frames: Vec<Frame>,
    duration_seconds: f64,
}

impl FrameStore {
    /// Decodes `path` into a store whose retained frames fit inside
    /// `budget_bytes`.
    ///
    /// The budget bounds the sampling rate, not the image size: frames are
    /// kept at source resolution and dropped in time instead. A mid-stream
    /// decode failure after at least one retained frame still yields a
    /// usable (truncated) store; only a zero-frame result is an error.
    pub fn load(path: &Path, budget_bytes: usize) -> Result<FrameStore, String> {
        let meta = metadata::probe(path);
        if !meta.has_video {
            return Err(format!("no video track in {}", path.display()));
        }

        let (width, height) = meta.resolution.unwrap_or(FALLBACK_RESOLUTION);
        let bytes_per_frame = (width as usize) * (height as usize) * 4;
        let max_frames = (budget_bytes / bytes_per_frame.max(1)).max(1);
        let nominal_fps = meta.fps.unwrap_or(DEFAULT_NOMINAL_FPS);
        let container_duration = meta.duration.unwrap_or(0.0);

        let rate = target_sample_rate(nominal_fps, container_duration, max_frames);
        let min_gap = 1.0 / rate;
        info!(
            "loading {}: {}x{} nominal {:.2} fps, sampling at {:.2} fps (cap {} frames)",
            path.display(),
            width,
            height,
            nominal_fps,
            rate,
            max_frames
        );

        let mut decoder = SequentialDecoder::open(path)?;
        let mut frames: Vec<Frame> = Vec::new();
        let mut last_kept: Option<f64> = None;

        while let Some(frame) = decoder.next_frame() {
            if !keep_frame(last_kept, frame.pts_seconds, min_gap) {
                continue;
            }
            last_kept = Some(frame.pts_seconds);
            frames.push(frame);
            // Safety valve; the rate computation should keep this from
            // ever firing.
            if frames.len() > max_frames {
                frames.remove(0);
            }
        }

        if frames.is_empty() {
            return Err(format!("decoded zero frames from {}", path.display()));
        }

        let last_pts = frames.last().map(|f| f.pts_seconds).unwrap_or(0.0);
        let duration_seconds = container_duration.max(last_pts);
        if last_pts + min_gap < container_duration {
            warn!(
                "{}: decode stopped at {:.2}s of {:.2}s, keeping partial result",
                path.display(),
                last_pts,
                container_duration
            );
        }
        info!(
            "loaded {} frames from {} ({:.2}s)",
            frames.len(),
            path.display(),
            duration_seconds
        );

        Ok(FrameStore::from_frames(frames, duration_seconds))
    }

    /// Wraps an already-decoded frame sequence. Timestamps must be
    /// strictly increasing.
    pub fn from_frames(frames: Vec<Frame>, duration_seconds: f64) -> Self {
        debug_assert!(frames
            .windows(2)
            .all(|w| w[0].pts_seconds < w[1].pts_seconds));
        let last_pts = frames.last().map(|f| f.pts_seconds).unwrap_or(0.0);
        Self {
            frames,
            duration_seconds: duration_seconds.max(last_pts),
        }
    }

    /// Index of the first frame at or after `time_seconds`, falling back
    /// to the last frame past end of media.
    pub fn frame_at_or_after(&self, time_seconds: f64) -> usize {
        let idx = self
            .frames
            .partition_point(|f| f.pts_seconds < time_seconds);
        idx.min(self.frames.len().saturating_sub(1))
    }

    pub fn frame(&self, index: usize) -> &Frame {
        &self.frames[index]
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// Sampling rate bounded below by `MIN_SAMPLE_FPS` and above by the
/// source's nominal rate, such that the estimated retained frame count
/// stays within `max_frames`.
fn target_sample_rate(nominal_fps: f64, duration_seconds: f64, max_frames: usize) -> f64 {
    let nominal = nominal_fps.max(1.0);
    if duration_seconds <= 0.0 {
        return nominal;
    }
    let budget_rate = max_frames as f64 / duration_seconds;
    budget_rate.clamp(MIN_SAMPLE_FPS.min(nominal), nominal)
}

/// Temporal thinning: retain only frames at least `min_gap` after the last
/// kept one. Irregular if the source drops frames, but monotonic.
fn keep_frame(last_kept: Option<f64>, pts_seconds: f64, min_gap: f64) -> bool {
    match last_kept {
        None => true,
        Some(last) => pts_seconds >= last + min_gap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts: f64) -> Frame {
        Frame {
            pts_seconds: pts,
            width: 2,
            height: 2,
            bgra: vec![0; 16],
        }
    }

    #[test]
    fn thinning_keeps_monotonic_spacing() {
        let min_gap = 0.1;
        let mut kept = Vec::new();
        let mut last: Option<f64> = None;
        // Irregular source timing, including a burst and a gap.
        for pts in [0.0, 0.02, 0.05, 0.11, 0.12, 0.35, 0.36, 0.9] {
            if keep_frame(last, pts, min_gap) {
                last = Some(pts);
                kept.push(pts);
            }
        }
        assert_eq!(kept, vec![0.0, 0.11, 0.35, 0.9]);
        assert!(kept.windows(2).all(|w| w[1] - w[0] >= min_gap));
    }

    #[test]
    fn sample_rate_is_budget_bounded() {
        // 10 minute source, room for 600 frames -> 1 fps raw, floored at 5.
        assert_eq!(target_sample_rate(30.0, 600.0, 600), 5.0);
        // Plenty of budget -> nominal rate.
        assert_eq!(target_sample_rate(24.0, 10.0, 100_000), 24.0);
        // Tight budget on a short clip stays between the bounds.
        let r = target_sample_rate(30.0, 100.0, 1_000);
        assert!((5.0..=30.0).contains(&r));
        // Slow sources are never upsampled past nominal.
        assert_eq!(target_sample_rate(3.0, 10.0, 100_000), 3.0);
    }

    #[test]
    fn frame_lookup_is_at_or_after() {
        let store = FrameStore::from_frames(
            (0..=60).map(|i| frame(i as f64 / 30.0)).collect(),
            2.0,
        );
        assert_eq!(store.frame_at_or_after(0.0), 0);
        let idx = store.frame_at_or_after(0.5);
        assert!(store.frame(idx).pts_seconds >= 0.5);
        assert!(store.frame(idx - 1).pts_seconds < 0.5);
        // Past end of media falls back to the last frame.
        assert_eq!(store.frame_at_or_after(99.0), store.len() - 1);
    }

    #[test]
    fn duration_prefers_last_pts_when_container_lies() {
        let store = FrameStore::from_frames(vec![frame(0.0), frame(3.5)], 2.0);
        assert_eq!(store.duration_seconds(), 3.5);
    }
}
