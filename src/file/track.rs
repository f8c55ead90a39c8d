use crate::core::{Channel, Controller, ControlValue, Message, NoteNumber, Program, Velocity};
use crate::error::LibResult;
use crate::file::{
    Event, MetaEvent, MicrosecondsPerQuarter, QuartersPerMinute, SysexEvent, TrackEvent,
};
use crate::scribe::Scribe;
use crate::Text;
use log::debug;
use snafu::ResultExt;
use std::convert::TryFrom;
use std::io::Write;

/// 2.3 - Track Chunks
/// The track chunks (type MTrk) are where actual song data is stored. Each track chunk is
/// simply a stream of MIDI events (and non-MIDI events), preceded by delta-time values.
///
/// Here is the syntax of an MTrk chunk (the + means "one or more": at least one MTrk event
/// must be present):
///
/// `<Track Chunk> = <chunk type><length><MTrk event>+`
#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Track {
    events: Vec<TrackEvent>,
}

impl Track {
    /// Returns `true` if the track has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The number of events in the track.
    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Iterator over the events in the track.
    pub fn events(&self) -> impl Iterator<Item = &TrackEvent> {
        self.events.iter()
    }

    /// Add an event to the end.
    pub fn push_event(&mut self, delta_time: u32, event: Event) -> crate::Result<()> {
        self.events.push(TrackEvent::new(delta_time, event));
        Ok(())
    }

    /// Add a tempo message.
    pub fn push_tempo(
        &mut self,
        delta_time: u32,
        quarters_per_minute: QuartersPerMinute,
    ) -> crate::Result<()> {
        let value = MicrosecondsPerQuarter::from_quarters_per_minute(quarters_per_minute);
        self.push_event(delta_time, Event::Meta(MetaEvent::SetTempo(value)))
    }

    /// Add a note on message.
    pub fn push_note_on(
        &mut self,
        delta_time: u32,
        channel: Channel,
        note_number: NoteNumber,
        velocity: Velocity,
    ) -> crate::Result<()> {
        let note_on = Event::Midi(Message::note_on(
            channel.get(),
            note_number.get(),
            velocity.get(),
        ));
        self.push_event(delta_time, note_on)
    }

    /// Add a note off message.
    pub fn push_note_off(
        &mut self,
        delta_time: u32,
        channel: Channel,
        note_number: NoteNumber,
        velocity: Velocity,
    ) -> crate::Result<()> {
        let note_off = Event::Midi(Message::note_off(
            channel.get(),
            note_number.get(),
            velocity.get(),
        ));
        self.push_event(delta_time, note_off)
    }

    /// Add a control change message.
    pub fn push_control(
        &mut self,
        delta_time: u32,
        channel: Channel,
        control: Controller,
        value: ControlValue,
    ) -> crate::Result<()> {
        let event = Event::Midi(Message::control(channel.get(), control.get(), value.get()));
        self.push_event(delta_time, event)
    }

    /// Add a program change message.
    pub fn push_program_change(
        &mut self,
        delta_time: u32,
        channel: Channel,
        program: Program,
    ) -> crate::Result<()> {
        let event = Event::Midi(Message::program_change(channel.get(), program.get()));
        self.push_event(delta_time, event)
    }

    /// Add a copyright meta event.
    pub fn push_copyright<S: Into<String>>(&mut self, delta_time: u32, text: S) -> crate::Result<()> {
        let event = Event::Meta(MetaEvent::Copyright(Text::new(text)));
        self.push_event(delta_time, event)
    }

    /// Add a program name meta event.
    pub fn push_program_name<S: Into<String>>(
        &mut self,
        delta_time: u32,
        text: S,
    ) -> crate::Result<()> {
        let event = Event::Meta(MetaEvent::ProgramName(Text::new(text)));
        self.push_event(delta_time, event)
    }

    /// Add a device name meta event.
    pub fn push_device_name<S: Into<String>>(
        &mut self,
        delta_time: u32,
        text: S,
    ) -> crate::Result<()> {
        let event = Event::Meta(MetaEvent::DeviceName(Text::new(text)));
        self.push_event(delta_time, event)
    }

    /// Add a lyric.
    pub fn push_lyric<S: Into<String>>(&mut self, delta_time: u32, lyric: S) -> crate::Result<()> {
        let event = Event::Meta(MetaEvent::Lyric(Text::new(lyric)));
        self.push_event(delta_time, event)
    }

    /// Add a complete system exclusive message.
    pub fn push_sysex<D: Into<Vec<u8>>>(&mut self, delta_time: u32, data: D) -> crate::Result<()> {
        self.push_event(delta_time, Event::Sysex(SysexEvent::new(data)))
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        // write the track chunk header
        w.write_all(b"MTrk").context(wr!())?;

        // we need to write out all of the data first so we know its length
        let mut track_data: Vec<u8> = Vec::new();
        let mut track_scribe = Scribe::new(&mut track_data);
        for event in self.events() {
            event.write(&mut track_scribe)?;
        }

        // write the length of the track
        let track_length = u32::try_from(track_data.len())
            .ok()
            .ok_or_else(|| crate::error::TrackTooLongSnafu { site: site!() }.build())?;
        w.write_be(track_length, 4)?;

        // write the track data
        w.write_all(&track_data).context(wr!())?;
        Ok(())
    }
}

/// If the last item of the track is *not* an end-of-track event, then add it to the back. If
/// the track already has an end-of-track event as its last event, then nothing happens.
pub(crate) fn ensure_end_of_track(mut track: Track) -> LibResult<Track> {
    let needs_end = match track.events.last() {
        Some(last_event) => !last_event.is_end(),
        None => true,
    };
    if needs_end {
        debug!("appending end-of-track event");
        track.events.push(TrackEvent::new(0, Event::Meta(MetaEvent::EndOfTrack)));
    }
    Ok(track)
}

#[cfg(test)]
fn written(track: &Track) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    track.write(&mut scribe).unwrap();
    bytes
}

#[test]
fn track_chunk_length_prefix() {
    let mut track = Track::default();
    track
        .push_note_on(0, Channel::new(0), NoteNumber::new(60), Velocity::new(100))
        .unwrap();
    track
        .push_note_off(96, Channel::new(0), NoteNumber::new(60), Velocity::new(100))
        .unwrap();
    let track = ensure_end_of_track(track).unwrap();
    let bytes = written(&track);
    assert_eq!(b"MTrk", &bytes[0..4]);
    // 4 (note on) + 4 (note off) + 4 (end of track)
    assert_eq!(&[0, 0, 0, 12], &bytes[4..8]);
    assert_eq!(
        &[0, 0x90, 60, 100, 96, 0x80, 60, 100, 0, 0xff, 0x2f, 0x00],
        &bytes[8..]
    );
}

#[test]
fn ensure_end_of_track_is_idempotent() {
    let track = ensure_end_of_track(Track::default()).unwrap();
    assert_eq!(1, track.events_len());
    let track = ensure_end_of_track(track).unwrap();
    assert_eq!(1, track.events_len());
}
