/*!
The `file` module is for types and concepts strictly related to MIDI *files*.
These are kept separate from types and concepts that are also used in realtime MIDI (`core`).
!*/

use crate::error::LibResult;
use crate::scribe::Scribe;
use log::debug;
use snafu::{ensure, ResultExt};
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

mod division;
mod header;
mod meta_event;
mod sysex;
mod track;
mod track_event;

pub use division::QuarterNoteDivision;
pub use header::{Format, Header};
pub use meta_event::{MetaEvent, MicrosecondsPerQuarter, QuartersPerMinute};
pub use sysex::SysexEvent;
pub use track::Track;
pub use track_event::{Event, TrackEvent};

pub(crate) use track::ensure_end_of_track;

/// A writable standard MIDI file: a time division plus the tracks in the order their MTrk
/// chunks will appear. The format word is not stored; it is decided by the track count when
/// writing, type 0 for a single track and type 1 otherwise.
#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct MidiFile {
    division: QuarterNoteDivision,
    tracks: Vec<Track>,
}

impl MidiFile {
    pub fn new(division: QuarterNoteDivision) -> Self {
        Self {
            division,
            tracks: Vec::new(),
        }
    }

    pub fn division(&self) -> &QuarterNoteDivision {
        &self.division
    }

    pub fn tracks_len(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Add a track to the end. A standard MIDI file can address at most 65535 tracks.
    pub fn push_track(&mut self, track: Track) -> crate::Result<()> {
        ensure!(
            self.tracks.len() < usize::from(u16::MAX),
            crate::error::TooManyTracksSnafu { site: site!() }
        );
        self.tracks.push(track);
        Ok(())
    }

    /// Serialize as a standard MIDI file into any writer.
    pub fn write<W: Write>(&self, w: &mut W) -> crate::Result<()> {
        let mut scribe = Scribe::new(w);
        Ok(self.write_inner(&mut scribe)?)
    }

    /// Write the standard MIDI file to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let file = File::create(path).context(wr!())?;
        let mut w = BufWriter::new(file);
        self.write(&mut w)?;
        w.flush().context(wr!()).map_err(crate::Error::from)?;
        Ok(())
    }

    fn write_inner<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        ensure!(
            !self.tracks.is_empty(),
            crate::error::NoTracksSnafu { site: site!() }
        );
        let format = if self.tracks.len() == 1 {
            Format::Single
        } else {
            Format::Multi
        };
        debug!(
            "writing format {:?} file with {} track(s)",
            format,
            self.tracks.len()
        );
        let ntracks = u16::try_from(self.tracks.len())
            .ok()
            .ok_or_else(|| crate::error::TooManyTracksSnafu { site: site!() }.build())?;
        Header::new(format, self.division).write(w, ntracks)?;
        for track in self.tracks() {
            let finished = ensure_end_of_track(track.clone())?;
            finished.write(w)?;
        }
        Ok(())
    }
}

#[test]
fn no_tracks_is_an_error() {
    let file = MidiFile::new(QuarterNoteDivision::new(96));
    let mut bytes = Vec::new();
    assert!(file.write(&mut bytes).is_err());
}

#[test]
fn single_track_is_format_zero() {
    let mut file = MidiFile::new(QuarterNoteDivision::new(96));
    file.push_track(Track::default()).unwrap();
    let mut bytes = Vec::new();
    file.write(&mut bytes).unwrap();
    assert_eq!(b"MThd", &bytes[0..4]);
    assert_eq!(&[0x00, 0x00, 0x00, 0x06], &bytes[4..8]);
    assert_eq!(&[0x00, 0x00], &bytes[8..10]); // format 0
    assert_eq!(&[0x00, 0x01], &bytes[10..12]); // one track
    assert_eq!(&[0x00, 0x60], &bytes[12..14]); // division 96
}

#[test]
fn two_tracks_are_format_one() {
    let mut file = MidiFile::new(QuarterNoteDivision::new(96));
    file.push_track(Track::default()).unwrap();
    file.push_track(Track::default()).unwrap();
    let mut bytes = Vec::new();
    file.write(&mut bytes).unwrap();
    assert_eq!(&[0x00, 0x01], &bytes[8..10]); // format 1
    assert_eq!(&[0x00, 0x02], &bytes[10..12]); // two tracks
}
