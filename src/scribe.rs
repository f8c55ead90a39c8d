use crate::core::vlq::Vlq;
use crate::error::LibResult;
use snafu::ResultExt;
use std::io::Write;

/// A wrapper for any `Write` which adds the primitive encodings a MIDI file is made of:
/// big-endian integers of one to four bytes and variable-length quantities. Running status is
/// never used when writing, so the wrapper carries no state of its own.
pub(crate) struct Scribe<W: Write> {
    w: W,
}

impl<W: Write> Write for Scribe<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.w.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.w.flush()
    }
}

impl<W: Write> Scribe<W> {
    pub(crate) fn new(w: W) -> Self {
        Self { w }
    }

    /// Write the low `count` bytes of `value`, most significant byte first.
    pub(crate) fn write_be(&mut self, value: u32, count: usize) -> LibResult<()> {
        debug_assert!((1..=4).contains(&count));
        let bytes = value.to_be_bytes();
        self.w.write_all(&bytes[4 - count..]).context(wr!())?;
        Ok(())
    }

    /// Write `value` as a MIDI variable-length quantity.
    pub(crate) fn write_vlq(&mut self, value: u32) -> LibResult<()> {
        let bytes = Vlq::new(value).to_bytes();
        self.w.write_all(&bytes).context(wr!())?;
        Ok(())
    }
}

#[test]
fn write_be_four_bytes() {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    scribe.write_be(0x01020304, 4).unwrap();
    assert_eq!(&[0x01, 0x02, 0x03, 0x04], bytes.as_slice());
}

#[test]
fn write_be_partial() {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    scribe.write_be(0x0007A120, 3).unwrap();
    scribe.write_be(0x0060, 2).unwrap();
    scribe.write_be(0xFF, 1).unwrap();
    assert_eq!(&[0x07, 0xA1, 0x20, 0x00, 0x60, 0xFF], bytes.as_slice());
}

#[test]
fn write_vlq_values() {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    scribe.write_vlq(0).unwrap();
    scribe.write_vlq(0x7f).unwrap();
    scribe.write_vlq(0x80).unwrap();
    assert_eq!(&[0x00, 0x7f, 0x81, 0x00], bytes.as_slice());
}
