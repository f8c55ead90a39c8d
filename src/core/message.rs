use crate::core::{
    Channel, ControlValue, Controller, NoteNumber, PitchBendValue, Program, StatusType, U7,
    Velocity,
};
use crate::error::LibResult;
use crate::scribe::Scribe;
use snafu::ResultExt;
use std::io::Write;

/// CC 0: selects the sound bank on a channel.
pub(crate) const CONTROL_BANK_SELECT: u8 = 0;

/// CC 123: all notes off, a channel mode message.
pub(crate) const CONTROL_ALL_NOTES_OFF: u8 = 123;

/// Represents the data that is common, and required for both [`Message::NoteOn`] and
/// [`Message::NoteOff`] messages.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NoteMessage {
    pub(crate) channel: Channel,
    pub(crate) note_number: NoteNumber,
    pub(crate) velocity: Velocity,
}

impl NoteMessage {
    pub fn new(channel: Channel, note_number: NoteNumber, velocity: Velocity) -> Self {
        Self {
            channel,
            note_number,
            velocity,
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn note_number(&self) -> &NoteNumber {
        &self.note_number
    }

    pub fn velocity(&self) -> &Velocity {
        &self.velocity
    }

    fn write<W: Write>(&self, w: &mut Scribe<W>, st: StatusType) -> LibResult<()> {
        write_status_byte(w, st, self.channel)?;
        write_u8!(w, self.note_number.get())?;
        write_u8!(w, self.velocity.get())?;
        Ok(())
    }
}

/// A control change on a channel: controller number plus value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ControlChangeValue {
    pub(crate) channel: Channel,
    pub(crate) control: Controller,
    pub(crate) value: ControlValue,
}

impl ControlChangeValue {
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn control(&self) -> &Controller {
        &self.control
    }

    pub fn value(&self) -> &ControlValue {
        &self.value
    }

    fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_status_byte(w, StatusType::ControlOrSelectChannelMode, self.channel)?;
        write_u8!(w, self.control.get())?;
        write_u8!(w, self.value.get())?;
        Ok(())
    }
}

/// Provides the ability to change an instrument (sound, patch, etc.) by specifying the affected
/// channel number and the new program value. On the wire this message has a single data byte.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ProgramChangeValue {
    pub(crate) channel: Channel,
    pub(crate) program: Program,
}

impl ProgramChangeValue {
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_status_byte(w, StatusType::Program, self.channel)?;
        write_u8!(w, self.program.get())?;
        Ok(())
    }
}

/// Channel pressure (aftertouch applied to the whole channel). A single data byte on the wire.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChannelPressureValue {
    pub(crate) channel: Channel,
    pub(crate) pressure: U7,
}

impl ChannelPressureValue {
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn pressure(&self) -> &U7 {
        &self.pressure
    }

    fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_status_byte(w, StatusType::ChannelPressure, self.channel)?;
        write_u8!(w, self.pressure.get())?;
        Ok(())
    }
}

/// A pitch bend, written as two 7-bit data bytes, least significant first.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PitchBendMessage {
    pub(crate) channel: Channel,
    pub(crate) pitch_bend: PitchBendValue,
}

impl PitchBendMessage {
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    pub fn pitch_bend(&self) -> &PitchBendValue {
        &self.pitch_bend
    }

    fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        write_status_byte(w, StatusType::PitchBend, self.channel)?;
        write_u8!(w, (self.pitch_bend.get() & 0x7f) as u8)?;
        write_u8!(w, (self.pitch_bend.get() >> 7) as u8)?;
        Ok(())
    }
}

/// A MIDI channel voice message. These are the messages a track's event stream is made of;
/// system common and realtime messages never occur in a file this library writes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Message {
    NoteOff(NoteMessage),
    NoteOn(NoteMessage),
    PolyPressure(NoteMessage),
    Control(ControlChangeValue),
    ProgramChange(ProgramChangeValue),
    ChannelPressure(ChannelPressureValue),
    PitchBend(PitchBendMessage),
}

impl Default for Message {
    fn default() -> Self {
        Message::NoteOff(NoteMessage::default())
    }
}

impl Message {
    pub fn note_on(channel: u8, note_number: u8, velocity: u8) -> Self {
        Message::NoteOn(NoteMessage::new(
            Channel::new(channel),
            NoteNumber::new(note_number),
            Velocity::new(velocity),
        ))
    }

    pub fn note_off(channel: u8, note_number: u8, velocity: u8) -> Self {
        Message::NoteOff(NoteMessage::new(
            Channel::new(channel),
            NoteNumber::new(note_number),
            Velocity::new(velocity),
        ))
    }

    pub fn control(channel: u8, control: u8, value: u8) -> Self {
        Message::Control(ControlChangeValue {
            channel: Channel::new(channel),
            control: Controller::new(control),
            value: ControlValue::new(value),
        })
    }

    pub fn program_change(channel: u8, program: u8) -> Self {
        Message::ProgramChange(ProgramChangeValue {
            channel: Channel::new(channel),
            program: Program::new(program),
        })
    }

    pub(crate) fn write<W: Write>(&self, w: &mut Scribe<W>) -> LibResult<()> {
        match self {
            Message::NoteOff(value) => value.write(w, StatusType::NoteOff),
            Message::NoteOn(value) => value.write(w, StatusType::NoteOn),
            Message::PolyPressure(value) => value.write(w, StatusType::PolyPressure),
            Message::Control(value) => value.write(w),
            Message::ProgramChange(value) => value.write(w),
            Message::ChannelPressure(value) => value.write(w),
            Message::PitchBend(value) => value.write(w),
        }
    }
}

/// Combines the status part and channel part of a channel voice message.
fn merge_byte(status: StatusType, channel: Channel) -> u8 {
    ((status as u8) << 4) | channel.get()
}

/// Combines then writes the status part and channel part of a channel voice message.
fn write_status_byte<W: Write>(
    w: &mut Scribe<W>,
    status: StatusType,
    channel: Channel,
) -> LibResult<()> {
    write_u8!(w, merge_byte(status, channel))?;
    Ok(())
}

#[cfg(test)]
fn written(message: &Message) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut scribe = Scribe::new(&mut bytes);
    message.write(&mut scribe).unwrap();
    bytes
}

#[test]
fn note_messages_have_two_data_bytes() {
    assert_eq!(&[0x90, 60, 127], written(&Message::note_on(0, 60, 127)).as_slice());
    assert_eq!(&[0x89, 60, 0], written(&Message::note_off(9, 60, 0)).as_slice());
}

#[test]
fn program_change_has_one_data_byte() {
    assert_eq!(&[0xC5, 33], written(&Message::program_change(5, 33)).as_slice());
}

#[test]
fn channel_pressure_has_one_data_byte() {
    let message = Message::ChannelPressure(ChannelPressureValue {
        channel: Channel::new(2),
        pressure: U7::new(99),
    });
    assert_eq!(&[0xD2, 99], written(&message).as_slice());
}

#[test]
fn control_change_bytes() {
    assert_eq!(&[0xB0, 123, 0], written(&Message::control(0, 123, 0)).as_slice());
    assert_eq!(&[0xB9, 10, 64], written(&Message::control(9, 10, 64)).as_slice());
}

#[test]
fn pitch_bend_splits_fourteen_bits() {
    let message = Message::PitchBend(PitchBendMessage {
        channel: Channel::new(1),
        pitch_bend: PitchBendValue::new(8192),
    });
    assert_eq!(&[0xE1, 0x00, 0x40], written(&message).as_slice());
}
