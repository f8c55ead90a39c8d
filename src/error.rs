use snafu::Snafu;
use std::fmt;

/// The public Error type for this library.
#[derive(Debug, Snafu)]
pub struct Error(LibError);

/// The public Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// The internal Result type for this library.
pub(crate) type LibResult<T> = std::result::Result<T, LibError>;

impl Error {
    /// If this error came from the SMS compiler, the structured description of the failure.
    pub fn compile_error(&self) -> Option<&CompileError> {
        match &self.0 {
            LibError::Compile { fault } => Some(fault),
            _ => None,
        }
    }
}

/// The internal Error type for this library.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum LibError {
    #[snafu(display("{}: error while writing bytes: {}", site, source))]
    Write {
        site: String,
        source: std::io::Error,
    },

    #[snafu(display("{}: a standard MIDI file requires at least one track", site))]
    NoTracks { site: String },

    #[snafu(display(
        "{}: too many tracks for a standard MIDI file, the maximum is 65535",
        site
    ))]
    TooManyTracks { site: String },

    #[snafu(display("{}: track data exceeds the maximum chunk length", site))]
    TrackTooLong { site: String },

    #[snafu(display("{}: sysex data has no 0xF7 terminator", site))]
    SysexUnterminated { site: String },

    #[snafu(display("{}", fault))]
    Compile { fault: CompileError },
}

/// Everything that can be wrong with an SMS source document. The compiler is fail-fast: the
/// first violation aborts the compilation and is reported with one of these kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompileErrorKind {
    /// The word is not a command, a known name, a note, or a chord.
    UnknownWord,
    /// A qualifier that arp notes do not accept (`#`, `+`, `-`).
    ArpQualifier,
    /// Macros cannot expand or be defined inside other macros.
    NestedMacro,
    /// Octave out of 0..=10.
    OctaveRange,
    /// An unrecognized note qualifier character.
    NoteQualifier,
    /// End of input while a `[` time block was still open.
    UnclosedTimeBlock,
    /// The duration dot was given twice in one word.
    DuplicateDot,
    /// Duration denominator not one of 1, 2, 4, 8, 16, 32, 64.
    DurationValue,
    /// Volume out of 0..=127.
    VolumeValue,
    /// A parameter value is missing or out of range.
    ParameterValue,
    /// A parameter name the command does not accept.
    ParameterName,
    /// A `@name=` controller that is neither three digits nor a known alias.
    ControllerName,
    /// A qualifier that drum beats do not accept.
    DrumQualifier,
    /// `[`/`]` opened twice, closed unopened, or nested.
    TimeBlockPairing,
    /// `(`/`)` opened twice, closed unopened, nested, or interrupted by a newline.
    TimeGroupPairing,
    /// The name is already in use, by an object of any kind.
    DuplicateName,
    /// Names must begin with an ASCII letter.
    NameNotAlpha,
    /// Macro definition syntax (`M: name { ... }`) violated.
    MacroSyntax,
    /// End of input while a macro definition was still open.
    UnclosedMacro,
    /// A chord definition offset that is not an integer 0..=24.
    ChordSyntax,
    /// More than seven offsets in a chord definition.
    ChordSlots,
    /// A chord root without a valid chord-type suffix.
    KeyChord,
    /// The `~name` suffix does not name an arp.
    UnknownArp,
    /// The bar accumulated more ticks than the time signature allows.
    BarOverrun,
    /// A computed note pitch outside 0..=127.
    NoteRange,
    /// A chord-step or base-note offset outside 0..=24, or one with no chord tone.
    NoteOffsetRange,
    /// A repeater count smaller than one.
    RepeaterValue,
    /// `*N` must follow a note, a chord, or a macro.
    RepeaterTarget,
    /// Base note syntax (`letter[octave][#]:`) violated.
    BaseNoteSyntax,
    /// A qualifier that base-note offsets do not accept.
    BaseNoteQualifier,
    /// `_` must be the last qualifier of a note.
    HoldNotLast,
    /// `/*`/`*/` opened twice, closed unopened, or left open at end of input.
    BlockComment,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            CompileErrorKind::UnknownWord => "unrecognized word",
            CompileErrorKind::ArpQualifier => "qualifier not allowed in an arp",
            CompileErrorKind::NestedMacro => "nested macros are not allowed",
            CompileErrorKind::OctaveRange => "octave out of range (0-10)",
            CompileErrorKind::NoteQualifier => "wrong note qualifier (# + - < > . / ! _)",
            CompileErrorKind::UnclosedTimeBlock => "time block is missing its closing bracket",
            CompileErrorKind::DuplicateDot => "duration dot given twice",
            CompileErrorKind::DurationValue => "invalid duration (1 2 4 8 16 32 64)",
            CompileErrorKind::VolumeValue => "volume out of range (0-127)",
            CompileErrorKind::ParameterValue => "missing or invalid parameter value",
            CompileErrorKind::ParameterName => "unknown parameter",
            CompileErrorKind::ControllerName => "unknown midi controller",
            CompileErrorKind::DrumQualifier => "qualifier not allowed on a drum beat",
            CompileErrorKind::TimeBlockPairing => "time block open/close mismatch",
            CompileErrorKind::TimeGroupPairing => "time group open/close mismatch",
            CompileErrorKind::DuplicateName => "name is already in use",
            CompileErrorKind::NameNotAlpha => "a name must begin with a letter",
            CompileErrorKind::MacroSyntax => "wrong macro syntax",
            CompileErrorKind::UnclosedMacro => "macro definition is missing its closing brace",
            CompileErrorKind::ChordSyntax => "chord offsets are integers 0-24",
            CompileErrorKind::ChordSlots => "a chord holds at most 7 offsets",
            CompileErrorKind::KeyChord => "invalid key chord",
            CompileErrorKind::UnknownArp => "arpeggio is not defined",
            CompileErrorKind::BarOverrun => "too many events in the previous bar",
            CompileErrorKind::NoteRange => "note out of range",
            CompileErrorKind::NoteOffsetRange => "invalid note offset (0-24)",
            CompileErrorKind::RepeaterValue => "repeater count must be positive",
            CompileErrorKind::RepeaterTarget => {
                "the repeater needs a preceding note, chord, or macro"
            }
            CompileErrorKind::BaseNoteSyntax => "wrong base note syntax (note[octave][#]:)",
            CompileErrorKind::BaseNoteQualifier => "qualifier not allowed on a base note offset",
            CompileErrorKind::HoldNotLast => "hold must be the last qualifier of a note",
            CompileErrorKind::BlockComment => "block comment open/close mismatch",
        };
        f.write_str(msg)
    }
}

/// Where a compile error happened inside a macro or arp body: the object's name, the source
/// line its definition started on, and the 1-based word position within the body line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameContext {
    name: String,
    line: u32,
    column: u32,
}

impl FrameContext {
    pub(crate) fn new<S: Into<String>>(name: S, line: u32, column: u32) -> Self {
        Self {
            name: name.into(),
            line,
            column,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }
}

/// The structured result of a failed compilation: what was wrong, where, and on which word.
/// `column` is the 1-based position of the word within its line, the unit the tokenizer
/// counts in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompileError {
    kind: CompileErrorKind,
    line: u32,
    column: u32,
    word: String,
    macro_frame: Option<FrameContext>,
    arp_frame: Option<FrameContext>,
}

impl CompileError {
    pub(crate) fn new<S: Into<String>>(
        kind: CompileErrorKind,
        line: u32,
        column: u32,
        word: S,
        macro_frame: Option<FrameContext>,
        arp_frame: Option<FrameContext>,
    ) -> Self {
        Self {
            kind,
            line,
            column,
            word: word.into(),
            macro_frame,
            arp_frame,
        }
    }

    pub fn kind(&self) -> CompileErrorKind {
        self.kind
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// The word the compiler was processing when it gave up.
    pub fn word(&self) -> &str {
        &self.word
    }

    /// Present when the error happened while a macro was expanding.
    pub fn macro_frame(&self) -> Option<&FrameContext> {
        self.macro_frame.as_ref()
    }

    /// Present when the error happened while an arp was playing.
    pub fn arp_frame(&self) -> Option<&FrameContext> {
        self.arp_frame.as_ref()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {} word {}: {} ('{}')",
            self.line, self.column, self.kind, self.word
        )?;
        if let Some(m) = &self.macro_frame {
            write!(
                f,
                " in macro '{}' at line {} word {}",
                m.name, m.line, m.column
            )?;
        }
        if let Some(a) = &self.arp_frame {
            write!(
                f,
                " in arp '{}' defined at line {} word {}",
                a.name, a.line, a.column
            )?;
        }
        Ok(())
    }
}

macro_rules! site {
    () => {
        format!("{}:{}", file!(), line!())
    };
}

macro_rules! wr {
    () => {
        crate::error::WriteSnafu { site: site!() }
    };
}

#[test]
fn site_test() {
    let line = line!() + 1;
    let site = site!();
    assert!(site.contains("error.rs"));
    assert!(site.contains(format!("{}", line).as_str()));
}

#[test]
fn compile_error_display_test() {
    let fault = CompileError::new(
        CompileErrorKind::BarOverrun,
        7,
        3,
        "|",
        Some(FrameContext::new("riff", 2, 5)),
        None,
    );
    let message = format!("{}", fault);
    assert!(message.contains("line 7 word 3"));
    assert!(message.contains("too many events"));
    assert!(message.contains("macro 'riff'"));
}

#[test]
fn compile_error_accessor_test() {
    let fault = CompileError::new(CompileErrorKind::KeyChord, 1, 1, "Cxyz", None, None);
    let err: Error = LibError::Compile { fault }.into();
    let fault = err.compile_error().unwrap();
    assert_eq!(CompileErrorKind::KeyChord, fault.kind());
    assert_eq!("Cxyz", fault.word());
    assert!(fault.macro_frame().is_none());
}
