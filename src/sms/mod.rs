/*!
The `sms` module is the compiler front end: it turns a music-script document into the
event stream and object stores that the finalizer assembles into a [`MidiFile`].

[`MidiFile`]: crate::file::MidiFile
!*/

mod chords;
mod compiler;
mod events;
mod finalize;
mod song;
mod symbols;
mod tokenizer;
mod values;

use crate::file::MidiFile;

pub(crate) fn compile_to_midi(source: &str) -> crate::Result<MidiFile> {
    let mut compiler = compiler::Compiler::new(source);
    compiler.run()?;
    let events = std::mem::take(&mut compiler.events);
    finalize::assemble(&compiler.header, &compiler.tracks, events)
}
