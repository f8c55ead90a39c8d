/*!
The `core` module is for types and concepts that are *not* strictly related to MIDI *files*.
These types and concepts could be used for realtime MIDI as well.
!*/

mod message;
mod numbers;
mod status_type;
pub(crate) mod vlq;

pub(crate) use message::{CONTROL_ALL_NOTES_OFF, CONTROL_BANK_SELECT};

pub use message::{
    ChannelPressureValue, ControlChangeValue, Message, NoteMessage, PitchBendMessage,
    ProgramChangeValue,
};
pub use numbers::{
    Channel, ControlValue, Controller, NoteNumber, PitchBendValue, Program, Velocity, U7,
};
pub use status_type::StatusType;
