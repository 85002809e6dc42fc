//! Control wire format: an address token followed somewhere in the payload
//! by a JSON object. Packets that don't match an address or don't carry a
//! decodable blob are dropped without comment; the channel is best-effort
//! by design.

use serde::Deserialize;

pub const NOTE_SLICE_ADDR: &str = "/note_slice";
pub const NOTE_OFF_ADDR: &str = "/note_off";

#[derive(Debug, Deserialize)]
struct NoteSliceMsg {
    note: i32,
    i: f64,
    o: f64,
    vel: i32,
}

#[derive(Debug, Deserialize)]
struct NoteOffMsg {
    note: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    NoteSlice { note: i32, i: f64, o: f64, vel: i32 },
    NoteOff { note: i32 },
}

/// Decodes one datagram, or `None` if it should be dropped.
pub fn parse_packet(payload: &[u8]) -> Option<ControlEvent> {
    let text = std::str::from_utf8(payload).ok()?;
    let text = text.trim_start();

    let addr_end = text
        .find(|c: char| c.is_whitespace() || c == '{')
        .unwrap_or(text.len());
    let addr = &text[..addr_end];

    let blob = json_span(text)?;
    match addr {
        NOTE_SLICE_ADDR => {
            let msg: NoteSliceMsg = serde_json::from_str(blob).ok()?;
            Some(ControlEvent::NoteSlice {
                note: msg.note,
                i: msg.i,
                o: msg.o,
                vel: msg.vel,
            })
        }
        NOTE_OFF_ADDR => {
            let msg: NoteOffMsg = serde_json::from_str(blob).ok()?;
            Some(ControlEvent::NoteOff { note: msg.note })
        }
        _ => None,
    }
}

/// First balanced `{...}` span in `text`, independent of framing around it.
/// Braces inside JSON strings don't count toward the balance.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (pos, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=pos]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_slice_packet_parses() {
        let payload = br#"/note_slice {"note":60,"i":0.1,"o":0.9,"vel":100}"#;
        assert_eq!(
            parse_packet(payload),
            Some(ControlEvent::NoteSlice {
                note: 60,
                i: 0.1,
                o: 0.9,
                vel: 100
            })
        );
    }

    #[test]
    fn note_off_packet_parses() {
        let payload = br#"/note_off {"note":60}"#;
        assert_eq!(parse_packet(payload), Some(ControlEvent::NoteOff { note: 60 }));
    }

    #[test]
    fn missing_required_field_is_dropped() {
        let payload = br#"/note_slice {"i":0.1,"o":0.9,"vel":100}"#;
        assert_eq!(parse_packet(payload), None);
    }

    #[test]
    fn mistyped_field_is_dropped() {
        let payload = br#"/note_slice {"note":"sixty","i":0.1,"o":0.9,"vel":100}"#;
        assert_eq!(parse_packet(payload), None);
    }

    #[test]
    fn unknown_address_is_dropped() {
        let payload = br#"/note_hold {"note":60}"#;
        assert_eq!(parse_packet(payload), None);
        // A longer token sharing the prefix must not match either.
        let payload = br#"/note_slicex {"note":60,"i":0.0,"o":1.0,"vel":1}"#;
        assert_eq!(parse_packet(payload), None);
    }

    #[test]
    fn blob_is_found_despite_extraneous_bytes() {
        let payload = br#"/note_off ,junk;; {"note":61} trailing"#;
        assert_eq!(parse_packet(payload), Some(ControlEvent::NoteOff { note: 61 }));
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance() {
        let payload = br#"/note_off {"tag":"{not json}","note":62}"#;
        assert_eq!(parse_packet(payload), Some(ControlEvent::NoteOff { note: 62 }));
    }

    #[test]
    fn garbage_is_dropped() {
        assert_eq!(parse_packet(b"\xff\xfe\x00"), None);
        assert_eq!(parse_packet(b""), None);
        assert_eq!(parse_packet(b"/note_slice"), None);
        assert_eq!(parse_packet(b"/note_slice {"), None);
    }
}
