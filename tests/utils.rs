#![allow(dead_code)]

pub fn enable_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The number of tracks the MThd chunk declares.
pub fn declared_tracks(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[10], bytes[11]])
}

/// The format word of the MThd chunk.
pub fn declared_format(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[8], bytes[9]])
}

/// The division word of the MThd chunk.
pub fn declared_division(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[12], bytes[13]])
}

/// Split a produced file into its track bodies (the bytes between each MTrk length prefix
/// and the end of that chunk).
pub fn track_bodies(bytes: &[u8]) -> Vec<&[u8]> {
    assert_eq!(b"MThd", &bytes[0..4], "not a midi file");
    let mut bodies = Vec::new();
    let mut ix = 14usize;
    while ix < bytes.len() {
        assert_eq!(b"MTrk", &bytes[ix..ix + 4], "expected a track chunk");
        let len = u32::from_be_bytes([bytes[ix + 4], bytes[ix + 5], bytes[ix + 6], bytes[ix + 7]])
            as usize;
        bodies.push(&bytes[ix + 8..ix + 8 + len]);
        ix += 8 + len;
    }
    bodies
}

/// Decode one variable-length quantity, returning the value and the bytes consumed.
pub fn read_vlq(bytes: &[u8]) -> (u32, usize) {
    let mut value = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        value = (value << 7) | u32::from(b & 0x7f);
        if b & 0x80 == 0 {
            return (value, i + 1);
        }
    }
    panic!("unterminated vlq");
}

/// A decoded track event: delta time plus the raw event bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub delta: u32,
    pub bytes: Vec<u8>,
}

/// Walk a track body into (delta, event-bytes) pairs. Understands the subset of events this
/// library writes: channel messages, meta events, and F0 sysex. Running status never occurs.
pub fn events_of(body: &[u8]) -> Vec<RawEvent> {
    let mut events = Vec::new();
    let mut ix = 0usize;
    while ix < body.len() {
        let (delta, used) = read_vlq(&body[ix..]);
        ix += used;
        let status = body[ix];
        let start = ix;
        match status {
            0xff => {
                let (len, used) = read_vlq(&body[ix + 2..]);
                ix += 2 + used + len as usize;
            }
            0xf0 => {
                let (len, used) = read_vlq(&body[ix + 1..]);
                ix += 1 + used + len as usize;
            }
            _ => {
                let data_bytes = match status & 0xf0 {
                    0xc0 | 0xd0 => 1,
                    _ => 2,
                };
                ix += 1 + data_bytes;
            }
        }
        events.push(RawEvent {
            delta,
            bytes: body[start..ix].to_vec(),
        });
    }
    events
}

/// The sum of all delta times in a track body.
pub fn delta_sum(body: &[u8]) -> u32 {
    events_of(body).iter().map(|e| e.delta).sum()
}
