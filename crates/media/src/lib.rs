pub mod decoder;
pub mod gst_init;
pub mod metadata;
pub mod store;

pub use store::{Frame, FrameStore};
