/*!
`sms_midi` compiles SMS, a small whitespace-delimited music scripting language, into
standard MIDI files (type 0 or 1). The compiler is a single synchronous pass: give it the
source document, get back the complete file as bytes or a structured error pointing at the
offending word.

```
let bytes = sms_midi::compile("H: demo\nc5/4 d e f |\n").unwrap();
assert_eq!(b"MThd", &bytes[0..4]);
```

The MIDI writing layer is usable on its own through the [`file`] and [`core`] modules, for
callers who want to build a [`MidiFile`] event by event.
!*/

#[macro_use]
mod error;
#[macro_use]
mod clamp;
#[macro_use]
mod macros;

pub mod core;
pub mod file;

mod scribe;
mod sms;
mod text;

pub use error::{CompileError, CompileErrorKind, Error, FrameContext, Result};
pub use file::MidiFile;
pub use text::Text;

use log::debug;

/// Compile an SMS source document into a standard MIDI file. The returned buffer is the
/// complete file image, ready to be written to disk. Compilation is fail-fast; the first
/// violation aborts with an error whose details are available through
/// [`Error::compile_error`].
pub fn compile(source: &str) -> Result<Vec<u8>> {
    debug!("compiling {} bytes of sms source", source.len());
    let file = sms::compile_to_midi(source)?;
    let mut bytes = Vec::new();
    file.write(&mut bytes)?;
    Ok(bytes)
}
