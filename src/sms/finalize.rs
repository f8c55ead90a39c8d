//! Turns the compiler's unordered event stream into a finished [`MidiFile`]: sort by
//! (track name, time, emission id), split into tracks, convert absolute times to deltas,
//! and put the song-wide metadata at the front of the first track.

use crate::core::{Channel, ControlValue, Controller, Program, CONTROL_BANK_SELECT};
use crate::file::{Event, MidiFile, QuarterNoteDivision, QuartersPerMinute, Track};
use crate::sms::events::{EventList, ScoreEventKind};
use crate::sms::song::{InstrumentTrack, SongHeader};
use log::debug;

const COPYRIGHT: &str = "(c) ma.ke. 2024";
const PROGRAM_NAME: &str = "created with HIDCAM-SMS";

pub(crate) fn assemble(
    header: &SongHeader,
    tracks: &[InstrumentTrack],
    events: EventList,
) -> crate::Result<MidiFile> {
    let names: Vec<&str> = tracks.iter().map(|t| t.name.as_str()).collect();
    let sorted = events.into_sorted(&names);
    debug!("assembling {} events", sorted.len());

    let mut file = MidiFile::new(QuarterNoteDivision::new(header.ppqn));
    let mut current: Option<usize> = None;
    let mut track = Track::default();
    let mut last_time = 0u32;

    for event in &sorted {
        if current != Some(event.track) {
            if current.is_some() {
                file.push_track(track)?;
            }
            track = Track::default();
            last_time = 0;
            let source = &tracks[event.track];
            debug!("starting midi track for '{}'", source.name);
            if current.is_none() {
                // song-wide metadata lives in the first track only
                track.push_tempo(0, QuartersPerMinute::new(header.bpm))?;
                track.push_copyright(0, COPYRIGHT)?;
                track.push_program_name(0, PROGRAM_NAME)?;
            }
            track.push_device_name(0, source.name.as_str())?;
            track.push_control(
                0,
                Channel::new(source.channel),
                Controller::new(CONTROL_BANK_SELECT),
                ControlValue::new(source.bank),
            )?;
            track.push_program_change(0, Channel::new(source.channel), Program::new(source.program))?;
            current = Some(event.track);
        }

        let delta = event.time - last_time;
        last_time = event.time;
        match event.kind {
            ScoreEventKind::Channel(message) => {
                track.push_event(delta, Event::Midi(message))?;
            }
            // a tempo change always follows the all-notes-off written at the same tick,
            // so its own elapsed delta is zero
            ScoreEventKind::Tempo(qpm) => {
                track.push_tempo(0, qpm)?;
            }
        }
    }
    if current.is_some() {
        file.push_track(track)?;
    }
    Ok(file)
}
