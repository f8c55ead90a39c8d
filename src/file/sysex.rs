use crate::error::LibResult;
use crate::scribe::Scribe;
use snafu::{OptionExt, ResultExt};
use std::io::Write;

/// The longest sysex payload a single event may carry, terminator included.
pub(crate) const SYSEX_MAX: usize = 128;

/// `<sysex event>` specifies a MIDI system exclusive message stored as one unit:
/// `F0 <length> <bytes ending in F7>`. The length is a variable-length quantity counting the
/// bytes that follow it, including the mandatory `F7` terminator. Only complete `F0` messages
/// are supported; the packetized `F7` continuation form is not.
#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct SysexEvent {
    data: Vec<u8>,
}

impl SysexEvent {
    /// Wrap a raw payload. Everything from the first `0xF7` on is ignored when writing; a
    /// payload with no terminator within [`SYSEX_MAX`] bytes fails at write time.
    pub fn new<D: Into<Vec<u8>>>(data: D) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The number of payload bytes up to and including the first `0xF7` terminator.
    pub(crate) fn terminated_len(&self) -> Option<usize> {
        self.data
            .iter()
            .take(SYSEX_MAX)
            .position(|&b| b == 0xf7)
            .map(|i| i + 1)
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        let size = self
            .terminated_len()
            .context(crate::error::SysexUnterminatedSnafu { site: site!() })?;
        write_u8!(w, 0xf0)?;
        w.write_vlq(size as u32)?;
        w.write_all(&self.data[..size]).context(wr!())?;
        Ok(())
    }
}

#[test]
fn terminator_scan() {
    assert_eq!(
        Some(4),
        SysexEvent::new(vec![0x43, 0x12, 0x00, 0xf7]).terminated_len()
    );
    assert_eq!(None, SysexEvent::new(vec![0x43, 0x12, 0x00]).terminated_len());
    // the terminator must appear within the size limit
    let mut long = vec![0u8; SYSEX_MAX];
    long.push(0xf7);
    assert_eq!(None, SysexEvent::new(long).terminated_len());
}

#[test]
fn write_stops_at_terminator() {
    let event = SysexEvent::new(vec![0x43, 0x12, 0xf7, 0x99, 0x99]);
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    event.write(&mut scribe).unwrap();
    assert_eq!(&[0xf0, 0x03, 0x43, 0x12, 0xf7], bytes.as_slice());
}

#[test]
fn write_unterminated_fails() {
    let event = SysexEvent::new(vec![0x43, 0x12]);
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    assert!(event.write(&mut scribe).is_err());
}
