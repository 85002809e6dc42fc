use std::path::PathBuf;
use std::sync::mpsc;

use vslice_media::FrameStore;

pub struct LoadRequest {
    pub generation: u64,
    pub path: PathBuf,
    pub budget_bytes: usize,
}

pub struct LoadResult {
    pub generation: u64,
    pub path: PathBuf,
    pub outcome: Result<FrameStore, String>,
}

pub struct LoadWorkerChannels {
    pub req_tx: mpsc::Sender<LoadRequest>,
    pub result_rx: mpsc::Receiver<LoadResult>,
}

/// Spawns the decode worker. Requests coalesce to the most recent one so a
/// burst of re-opens only decodes the newest path; the generation tag lets
/// the engine discard completions that a later open has superseded.
pub fn spawn_load_worker() -> LoadWorkerChannels {
    let (req_tx, req_rx) = mpsc::channel::<LoadRequest>();
    let (result_tx, result_rx) = mpsc::channel::<LoadResult>();

    std::thread::spawn(move || loop {
        let Ok(mut req) = req_rx.recv() else {
            return;
        };
        while let Ok(next) = req_rx.try_recv() {
            req = next;
        }

        let outcome = FrameStore::load(&req.path, req.budget_bytes);
        let _ = result_tx.send(LoadResult {
            generation: req.generation,
            path: req.path,
            outcome,
        });
    });

    LoadWorkerChannels { req_tx, result_rx }
}
