use gstreamer as gst;
use gstreamer::prelude::*;

pub fn init_once() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        gst::init().expect("Failed to initialize GStreamer");
    });
}

pub(crate) fn wait_for_async_done(bus: &gst::Bus, timeout: gst::ClockTime) -> Result<(), String> {
    loop {
        let Some(msg) = bus.timed_pop(timeout) else {
            return Ok(());
        };
        match msg.view() {
            gst::MessageView::AsyncDone(_) => return Ok(()),
            gst::MessageView::Error(err) => {
                return Err(format!("{}", err.error()));
            }
            _ => {}
        }
    }
}

/// BGRA output caps. Width/height are left to negotiation so frames come
/// out at source resolution.
pub(crate) fn build_bgra_caps() -> gst::Caps {
    use gstreamer_video as gst_video;
    gst_video::VideoCapsBuilder::new()
        .format(gst_video::VideoFormat::Bgra)
        .build()
}

pub(crate) fn make_element(factory_name: &str) -> Result<gst::Element, String> {
    gst::ElementFactory::make(factory_name)
        .build()
        .map_err(|e| format!("Failed to create {factory_name}: {e}"))
}

pub(crate) fn connect_decodebin_video_only(decodebin: &gst::Element, next: &gst::Element) {
    let next_weak = next.downgrade();
    decodebin.connect_pad_added(move |_dbin, src_pad| {
        let caps = match src_pad.current_caps() {
            Some(c) => c,
            None => src_pad.query_caps(None),
        };
        let Some(structure) = caps.structure(0) else {
            return;
        };
        if structure.name().as_str().starts_with("video/") {
            if let Some(element) = next_weak.upgrade() {
                let sink_pad = element.static_pad("sink").expect("element has sink");
                if !sink_pad.is_linked() {
                    let _ = src_pad.link(&sink_pad);
                }
            }
        }
    });
}
