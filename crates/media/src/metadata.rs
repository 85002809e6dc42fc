use std::path::Path;

use gst_pbutils::prelude::DiscovererStreamInfoExt;
use gstreamer as gst;
use gstreamer_pbutils as gst_pbutils;

use crate::gst_init::init_once;

#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    pub duration: Option<f64>,
    pub resolution: Option<(u32, u32)>,
    pub fps: Option<f64>,
    pub codec: Option<String>,
    pub has_video: bool,
}

pub fn probe(path: &Path) -> MediaMetadata {
    init_once();

    let Some(uri) = url_from_path(path) else {
        return MediaMetadata::default();
    };
    let Ok(discoverer) = gst_pbutils::Discoverer::new(gst::ClockTime::from_seconds(10)) else {
        return MediaMetadata::default();
    };
    let Ok(info) = discoverer.discover_uri(&uri) else {
        return MediaMetadata::default();
    };

    let mut meta = MediaMetadata {
        duration: info
            .duration()
            .map(|d| d.nseconds() as f64 / 1_000_000_000.0),
        ..MediaMetadata::default()
    };

    if let Some(stream) = info.video_streams().into_iter().next() {
        meta.has_video = true;
        let w = stream.width();
        let h = stream.height();
        if w > 0 && h > 0 {
            meta.resolution = Some((w, h));
        }
        let framerate = stream.framerate();
        if framerate.numer() > 0 && framerate.denom() > 0 {
            meta.fps = Some(framerate.numer() as f64 / framerate.denom() as f64);
        }
        if let Some(caps) = DiscovererStreamInfoExt::caps(&stream) {
            if let Some(structure) = caps.structure(0) {
                meta.codec = Some(structure.name().as_str().to_string());
            }
        }
    }

    meta
}

fn url_from_path(path: &Path) -> Option<String> {
    let abs = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some(format!("file://{}", abs.display()))
}
