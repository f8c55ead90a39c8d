use crate::error::LibResult;
use crate::scribe::Scribe;
use crate::{core::Message, file::MetaEvent, file::SysexEvent};
use std::io::Write;

/// `<MTrk event> = <delta-time> <event>`
#[derive(Clone, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct TrackEvent {
    /// `<delta-time>` is stored as a variable-length quantity. It represents the amount of
    /// time before the following event. If the first event in a track occurs at the very
    /// beginning of a track, or if two events occur simultaneously, a delta-time of zero is
    /// used. Delta-times are always present. Delta-time is in ticks as specified in the
    /// header chunk.
    delta_time: u32,
    event: Event,
}

impl TrackEvent {
    pub fn new(delta_time: u32, event: Event) -> Self {
        Self { delta_time, event }
    }

    pub fn delta_time(&self) -> u32 {
        self.delta_time
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Returns true if the track event is a [`MetaEvent::EndOfTrack`].
    pub(crate) fn is_end(&self) -> bool {
        matches!(&self.event, Event::Meta(MetaEvent::EndOfTrack))
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        w.write_vlq(self.delta_time)?;
        self.event.write(w)
    }
}

/// `<event> = <MIDI event> | <sysex event> | <meta-event>`
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum Event {
    /// `<MIDI event>` is any MIDI channel message. Running status is never used when writing.
    Midi(Message),
    /// `<sysex event>` is used to specify a MIDI system exclusive message.
    Sysex(SysexEvent),
    /// `<meta-event>` specifies non-MIDI information useful to this format or to sequencers.
    Meta(MetaEvent),
}

impl Default for Event {
    fn default() -> Self {
        Event::Midi(Message::default())
    }
}

impl Event {
    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        match self {
            Event::Midi(md) => md.write(w),
            Event::Sysex(sx) => sx.write(w),
            Event::Meta(mt) => mt.write(w),
        }
    }
}

#[test]
fn delta_then_payload() {
    let event = TrackEvent::new(96, Event::Midi(Message::note_off(0, 60, 64)));
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    event.write(&mut scribe).unwrap();
    assert_eq!(&[96, 0x80, 60, 64], bytes.as_slice());
}

#[test]
fn end_of_track_detection() {
    assert!(TrackEvent::new(0, Event::Meta(MetaEvent::EndOfTrack)).is_end());
    assert!(!TrackEvent::new(0, Event::default()).is_end());
}
