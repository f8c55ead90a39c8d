use crate::error::LibResult;
use crate::file::QuarterNoteDivision;
use crate::scribe::Scribe;
use std::io::Write;

/// The MThd chunk of a standard MIDI file: format, number of tracks, time division. The
/// chunk length is always six.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Header {
    format: Format,
    division: QuarterNoteDivision,
}

impl Header {
    /// Create a new `Header` object.
    pub fn new(format: Format, division: QuarterNoteDivision) -> Self {
        Self { format, division }
    }

    /// A getter for the `format` field.
    pub fn format(&self) -> &Format {
        &self.format
    }

    /// A getter for the `division` field.
    pub fn division(&self) -> &QuarterNoteDivision {
        &self.division
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>, ntracks: u16) -> LibResult<()> {
        // write the header chunk identifier
        w.write_be(0x4D546864, 4)?; // "MThd"

        // write the header chunk length (always 6)
        w.write_be(6, 4)?;

        // write the format indicator
        w.write_be(u32::from(self.format as u16), 2)?;

        // write the number of tracks
        w.write_be(u32::from(ntracks), 2)?;

        // write the division value
        w.write_be(u32::from(self.division.get()), 2)?;
        Ok(())
    }
}

/// The format word of the MThd chunk. Format 2 (sequentially independent patterns) is not
/// supported by this library.
#[repr(u16)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum Format {
    /// 0 the file contains a single multi-channel track
    Single = 0,
    /// 1 the file contains one or more simultaneous tracks (or MIDI outputs) of a sequence
    Multi = 1,
}

impl Default for Format {
    fn default() -> Self {
        Format::Multi
    }
}

#[test]
fn header_bytes() {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    let header = Header::new(Format::Single, QuarterNoteDivision::new(96));
    header.write(&mut scribe, 1).unwrap();
    assert_eq!(
        &[0x4D, 0x54, 0x68, 0x64, 0, 0, 0, 6, 0, 0, 0, 1, 0, 96],
        bytes.as_slice()
    );
}
