use std::net::{SocketAddr, UdpSocket};
use std::sync::mpsc;

use log::debug;

use crate::protocol::{parse_packet, ControlEvent};

pub const DEFAULT_PORT: u16 = 57120;

const RECV_BUF_LEN: usize = 2048;

pub struct ListenerChannels {
    pub event_rx: mpsc::Receiver<ControlEvent>,
    pub local_addr: SocketAddr,
}

/// Binds the control port and spawns a dedicated receive thread.
///
/// Decoded events cross to the caller over the channel in per-socket
/// receive order. A bind failure disables network control only; the caller
/// decides whether to carry on without it. Port 0 binds an ephemeral port
/// (reported in `local_addr`).
pub fn spawn_listener(port: u16) -> Result<ListenerChannels, String> {
    let socket = UdpSocket::bind(("0.0.0.0", port))
        .map_err(|e| format!("failed to bind UDP port {port}: {e}"))?;
    let local_addr = socket
        .local_addr()
        .map_err(|e| format!("failed to read local addr: {e}"))?;

    let (event_tx, event_rx) = mpsc::channel::<ControlEvent>();

    std::thread::Builder::new()
        .name("control-listener".into())
        .spawn(move || {
            let mut buf = [0u8; RECV_BUF_LEN];
            loop {
                match socket.recv_from(&mut buf) {
                    Ok((len, _peer)) => {
                        let Some(event) = parse_packet(&buf[..len]) else {
                            continue;
                        };
                        debug!("control event: {event:?}");
                        if event_tx.send(event).is_err() {
                            // Engine side hung up.
                            return;
                        }
                    }
                    Err(_) => return,
                }
            }
        })
        .map_err(|e| format!("failed to spawn listener thread: {e}"))?;

    Ok(ListenerChannels {
        event_rx,
        local_addr,
    })
}
