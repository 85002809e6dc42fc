pub mod listener;
pub mod protocol;

pub use listener::{spawn_listener, ListenerChannels, DEFAULT_PORT};
pub use protocol::{parse_packet, ControlEvent};
