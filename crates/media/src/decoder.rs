use std::path::Path;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;

use crate::gst_init::*;
use crate::store::Frame;

/// One-way decoder: opens a file and pulls BGRA frames front to back with
/// their presentation timestamps. Orientation tags are applied in-pipeline
/// (`videoflip video-direction=auto`) so every pulled frame is already
/// upright.
pub struct SequentialDecoder {
    pipeline: gst::Pipeline,
    appsink: gst_app::AppSink,
    is_playing: bool,
}

impl SequentialDecoder {
    pub fn open(path: &Path) -> Result<Self, String> {
        init_once();

        let pipeline = gst::Pipeline::new();

        let filesrc = gst::ElementFactory::make("filesrc")
            .property("location", path.to_str().unwrap_or_default())
            .build()
            .map_err(|e| format!("Failed to create filesrc: {e}"))?;

        let decodebin = make_element("decodebin")?;
        let videoflip = gst::ElementFactory::make("videoflip")
            .property_from_str("video-direction", "auto")
            .build()
            .map_err(|e| format!("Failed to create videoflip: {e}"))?;
        let videoconvert = make_element("videoconvert")?;

        let appsink = gst_app::AppSink::builder()
            .caps(&build_bgra_caps())
            .sync(false)
            .build();

        pipeline
            .add_many([
                &filesrc,
                &decodebin,
                &videoflip,
                &videoconvert,
                appsink.upcast_ref::<gst::Element>(),
            ])
            .map_err(|e| format!("Failed to add elements: {e}"))?;

        gst::Element::link_many([&filesrc, &decodebin])
            .map_err(|e| format!("Failed to link filesrc->decodebin: {e}"))?;
        gst::Element::link_many([
            &videoflip,
            &videoconvert,
            appsink.upcast_ref::<gst::Element>(),
        ])
        .map_err(|e| format!("Failed to link video chain: {e}"))?;

        connect_decodebin_video_only(&decodebin, &videoflip);

        if let Err(e) = pipeline.set_state(gst::State::Paused) {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(format!("Failed to set Paused: {e}"));
        }

        let bus = match pipeline.bus() {
            Some(b) => b,
            None => {
                let _ = pipeline.set_state(gst::State::Null);
                return Err("No bus".to_string());
            }
        };
        let timeout = gst::ClockTime::from_seconds(10);
        if let Err(e) = wait_for_async_done(&bus, timeout) {
            let _ = pipeline.set_state(gst::State::Null);
            return Err(format!("Preroll error: {e}"));
        }

        Ok(Self {
            pipeline,
            appsink,
            is_playing: false,
        })
    }

    fn ensure_playing(&mut self) {
        if !self.is_playing {
            let _ = self.pipeline.set_state(gst::State::Playing);
            self.is_playing = true;
        }
    }

    /// Pulls the next decoded frame, or `None` at end of stream / on a
    /// mid-stream decode failure.
    pub fn next_frame(&mut self) -> Option<Frame> {
        self.ensure_playing();

        let sample = self
            .appsink
            .try_pull_sample(gst::ClockTime::from_seconds(5))?;
        let caps = sample.caps()?;
        let structure = caps.structure(0)?;
        let width = structure.get::<i32>("width").ok()? as u32;
        let height = structure.get::<i32>("height").ok()? as u32;

        let buffer = sample.buffer()?;
        let pts_seconds = buffer
            .pts()
            .map(|p| p.nseconds() as f64 / 1_000_000_000.0)
            .unwrap_or(0.0);

        let map = buffer.map_readable().ok()?;
        let data = map.as_slice();
        let expected_size = (width as usize) * (height as usize) * 4;

        let mut bgra = Vec::with_capacity(expected_size);
        if data.len() >= expected_size {
            bgra.extend_from_slice(&data[..expected_size]);
        } else {
            bgra.extend_from_slice(data);
            bgra.resize(expected_size, 0);
        }

        Some(Frame {
            pts_seconds,
            width,
            height,
            bgra,
        })
    }
}

impl Drop for SequentialDecoder {
    fn drop(&mut self) {
        let _ = self.pipeline.set_state(gst::State::Null);
        let _ = self.pipeline.state(gst::ClockTime::from_seconds(2));
    }
}
