/// Display-driven tick rate the runner advances the engine at.
pub const TICK_RATE_HZ: f64 = 60.0;

/// Default decode budget. Frames are kept at source resolution, so this
/// mostly dictates the sampling rate for long sources.
pub const DEFAULT_BUDGET_BYTES: usize = 768 * 1024 * 1024;
