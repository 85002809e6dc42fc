use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{info, warn};

use vslice_app::constants::{DEFAULT_BUDGET_BYTES, TICK_RATE_HZ};
use vslice_app::SamplerEngine;
use vslice_control::{spawn_listener, ControlEvent, DEFAULT_PORT};

/// Note-triggered video slice player.
#[derive(Parser)]
#[command(name = "vslice", version)]
struct Cli {
    /// Source video to load.
    video: PathBuf,

    /// UDP control port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Frame cache budget in megabytes.
    #[arg(long, default_value_t = DEFAULT_BUDGET_BYTES / (1024 * 1024))]
    budget_mb: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut engine = SamplerEngine::new();
    engine.set_budget_bytes(cli.budget_mb * 1024 * 1024);
    engine.open_video(&cli.video);

    let listener = match spawn_listener(cli.port) {
        Ok(l) => {
            info!("listening for control events on udp {}", l.local_addr);
            Some(l)
        }
        Err(e) => {
            // Network control is optional; the engine still answers any
            // other control path.
            warn!("{e}; continuing without network control");
            None
        }
    };

    let tick = Duration::from_secs_f64(1.0 / TICK_RATE_HZ);
    let mut last = Instant::now();

    loop {
        engine.poll_load();

        if let Some(listener) = &listener {
            while let Ok(event) = listener.event_rx.try_recv() {
                match event {
                    ControlEvent::NoteSlice { note, i, o, .. } => engine.trigger(note, i, o),
                    ControlEvent::NoteOff { note } => engine.stop_if_needed(note),
                }
            }
        }

        let now = Instant::now();
        let dt = (now - last).as_secs_f64();
        last = now;
        engine.advance(dt);

        std::thread::sleep(tick);
    }
}
