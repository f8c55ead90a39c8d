use crate::error::LibResult;
use crate::scribe::Scribe;
use crate::Text;
use snafu::{OptionExt, ResultExt};
use std::convert::TryFrom;
use std::io::Write;

/// A meta event, `FF type len data`. Only the events this library writes are represented:
/// the text-like types `01` through `09`, end-of-track, and set-tempo. Meta events carry no
/// channel and are always written at whatever delta-time their [`TrackEvent`] holds.
///
/// [`TrackEvent`]: crate::file::TrackEvent
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum MetaEvent {
    /// `FF 01 len text`: Any amount of text describing anything.
    OtherText(Text),

    /// `FF 02 len text`: A copyright notice as printable ASCII text. This event should be the
    /// first event in the first track chunk, at time 0.
    Copyright(Text),

    /// `FF 03 len text`: If in a format 0 track, or the first track in a format 1 file, the
    /// name of the sequence. Otherwise, the name of the track.
    TrackName(Text),

    /// `FF 04 len text`: A description of the type of instrumentation to be used in the track.
    InstrumentName(Text),

    /// `FF 05 len text`: A lyric to be sung, generally one syllable per event.
    Lyric(Text),

    /// `FF 06 len text`: The name of a point in the sequence, such as a rehearsal letter.
    Marker(Text),

    /// `FF 07 len text`: A description of something happening on film, video, or stage.
    CuePoint(Text),

    /// `FF 08 len text`: The name of the program (patch) used in the track. Found at
    /// http://www.somascape.org/midi/tech/mfile.html
    ProgramName(Text),

    /// `FF 09 len text`: The name of the device the track is intended for. Found at
    /// http://www.somascape.org/midi/tech/mfile.html
    DeviceName(Text),

    /// `FF 2F 00`: This event is not optional. It is included so that an exact ending point
    /// may be specified for the track, so that it has an exact length, which is necessary for
    /// tracks which are looped or concatenated.
    EndOfTrack,

    /// `FF 51 03 tttttt`: Set Tempo, in microseconds per MIDI quarter-note, a 24-bit value
    /// stored most-significant-byte first.
    SetTempo(MicrosecondsPerQuarter),
}

impl Default for MetaEvent {
    fn default() -> Self {
        MetaEvent::EndOfTrack
    }
}

impl MetaEvent {
    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_u8!(w, 0xff)?;
        match self {
            MetaEvent::OtherText(text) => write_text(w, 0x01, text),
            MetaEvent::Copyright(text) => write_text(w, 0x02, text),
            MetaEvent::TrackName(text) => write_text(w, 0x03, text),
            MetaEvent::InstrumentName(text) => write_text(w, 0x04, text),
            MetaEvent::Lyric(text) => write_text(w, 0x05, text),
            MetaEvent::Marker(text) => write_text(w, 0x06, text),
            MetaEvent::CuePoint(text) => write_text(w, 0x07, text),
            MetaEvent::ProgramName(text) => write_text(w, 0x08, text),
            MetaEvent::DeviceName(text) => write_text(w, 0x09, text),
            MetaEvent::EndOfTrack => {
                write_u8!(w, 0x2f)?;
                write_u8!(w, 0x00)?;
                Ok(())
            }
            MetaEvent::SetTempo(microseconds) => {
                write_u8!(w, 0x51)?;
                write_u8!(w, 0x03)?;
                w.write_be(microseconds.get(), 3)
            }
        }
    }
}

fn write_text<W: Write>(w: &mut Scribe<W>, meta_type: u8, text: &Text) -> LibResult<()> {
    write_u8!(w, meta_type)?;
    let bytes = text.as_bytes();
    let len = u32::try_from(bytes.len())
        .ok()
        .context(crate::error::TrackTooLongSnafu { site: site!() })?;
    w.write_vlq(len)?;
    w.write_all(bytes).context(wr!())?;
    Ok(())
}

pub(crate) const DEFAULT_MICROSECONDS_PER_QUARTER: u32 = 500_000;
pub(crate) const MAX_24BIT_UINT_VALUE: u32 = 16_777_215;

// Tempo microseconds are given by a 3-byte integer, hence the weird upper-bound. Default tempo
// is 120 beats per minute, which is 500_000 microseconds per beat.
clamp!(
    MicrosecondsPerQuarter,
    u32,
    1,
    MAX_24BIT_UINT_VALUE,
    DEFAULT_MICROSECONDS_PER_QUARTER,
    pub
);

clamp!(
    /// Tempo expressed as quarter notes ("beats") per minute.
    QuartersPerMinute,
    u8,
    1,
    255,
    120,
    pub
);

impl MicrosecondsPerQuarter {
    /// Convert a beats-per-minute tempo to microseconds per quarter note, truncating the same
    /// way a float-to-int cast does (60,000,000 / bpm).
    pub fn from_quarters_per_minute(qpm: QuartersPerMinute) -> Self {
        let microseconds = 60_000_000f64 / f64::from(qpm.get());
        MicrosecondsPerQuarter::new(microseconds as u32)
    }
}

#[cfg(test)]
fn written(event: &MetaEvent) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    event.write(&mut scribe).unwrap();
    bytes
}

#[test]
fn end_of_track_bytes() {
    assert_eq!(&[0xff, 0x2f, 0x00], written(&MetaEvent::EndOfTrack).as_slice());
}

#[test]
fn set_tempo_bytes() {
    let event = MetaEvent::SetTempo(MicrosecondsPerQuarter::new(500_000));
    assert_eq!(&[0xff, 0x51, 0x03, 0x07, 0xa1, 0x20], written(&event).as_slice());
}

#[test]
fn device_name_bytes() {
    let event = MetaEvent::DeviceName(Text::new("INST"));
    assert_eq!(
        &[0xff, 0x09, 0x04, b'I', b'N', b'S', b'T'],
        written(&event).as_slice()
    );
}

#[test]
fn quarters_per_minute_conversion() {
    assert_eq!(
        500_000,
        MicrosecondsPerQuarter::from_quarters_per_minute(QuartersPerMinute::new(120)).get()
    );
    assert_eq!(
        600_000,
        MicrosecondsPerQuarter::from_quarters_per_minute(QuartersPerMinute::new(100)).get()
    );
    // truncation, not rounding
    assert_eq!(
        666_666,
        MicrosecondsPerQuarter::from_quarters_per_minute(QuartersPerMinute::new(90)).get()
    );
}
