//! The objects an SMS document builds up while it compiles: the song header, instrument
//! tracks with their per-line note state, drum keys, chords, and macro/arp bodies.

pub(crate) const DEFAULT_OCTAVE: i32 = 5;
pub(crate) const DEFAULT_DURATION: u32 = 4;
pub(crate) const DEFAULT_VOLUME: u8 = 127;
pub(crate) const DEFAULT_BPM: u8 = 120;
pub(crate) const DEFAULT_PPQN: u16 = 96;

/// The MIDI note a freshly defined drum key strikes (a low percussion tick).
pub(crate) const DEFAULT_DRUM_KEY: u8 = 31;

/// Chord offsets, chord-step indices, and base-note offsets all live in 0..=24.
pub(crate) const MAX_NOTE_OFFSET: u32 = 24;

/// A chord stores at most this many tones.
pub(crate) const CHORD_SLOTS: usize = 7;

/// Chords and arps sound relative to this octave.
pub(crate) const CHORD_OCTAVE: i32 = 3;

/// The time divisions a header may select.
pub(crate) const PPQN_CHOICES: [u16; 6] = [24, 48, 96, 192, 384, 768];

/// The duration denominators a note may select.
pub(crate) const DURATION_CHOICES: [u32; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Song-wide settings. The bar length is not stored; it derives from the time signature and
/// the division, so changing `ppqn` mid-song rescales the bar exactly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct SongHeader {
    pub(crate) name: String,
    pub(crate) bpm: u8,
    pub(crate) ppqn: u16,
    pub(crate) sig_count: u32,
    pub(crate) sig_unit: u32,
    pub(crate) drum_kit: u8,
}

impl SongHeader {
    pub(crate) fn new() -> Self {
        Self {
            name: "SMS".to_string(),
            bpm: DEFAULT_BPM,
            ppqn: DEFAULT_PPQN,
            sig_count: 4,
            sig_unit: 4,
            drum_kit: 0,
        }
    }

    /// The bar length in ticks, `ppqn * 4 * N / D`. Exact for every legal combination since
    /// `ppqn * 4` is divisible by the largest allowed denominator.
    pub(crate) fn bar(&self) -> u32 {
        u32::from(self.ppqn) * 4 * self.sig_count / self.sig_unit
    }
}

/// What a note word names: silence, a drum beat, or a pitch step. For instrument notes the
/// step is a semitone within the octave (0..=11); for arp and base-note words it is an
/// offset 0..=24.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NoteKey {
    Pause,
    Beat,
    Step(u8),
}

/// The note defaults a track carries between words. Octave, duration, and volume persist
/// from word to word within a line; half-tone and the dot reset at each word; everything
/// but the pending hold resets at each newline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct NoteState {
    pub(crate) key: NoteKey,
    pub(crate) half: i32,
    pub(crate) octave: i32,
    pub(crate) duration: u32,
    pub(crate) dotted: bool,
    pub(crate) volume: u8,
    /// `_` appeared on the word just parsed.
    pub(crate) held: bool,
    /// A sounding note whose off is deferred until the next word on the track.
    pub(crate) hold: Option<u8>,
}

impl NoteState {
    pub(crate) fn new() -> Self {
        Self {
            key: NoteKey::Pause,
            half: 0,
            octave: DEFAULT_OCTAVE,
            duration: DEFAULT_DURATION,
            dotted: false,
            volume: DEFAULT_VOLUME,
            held: false,
            hold: None,
        }
    }

    /// The per-line reset. The pending hold survives so ties can cross lines.
    pub(crate) fn reset_line_defaults(&mut self) {
        self.half = 0;
        self.octave = DEFAULT_OCTAVE;
        self.duration = DEFAULT_DURATION;
        self.dotted = false;
        self.volume = DEFAULT_VOLUME;
    }
}

/// An instrument track: the MIDI channel/bank/program it plays on and its note state. The
/// track's position in the compiler's track store is its stable identity; events refer to
/// it by that index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct InstrumentTrack {
    pub(crate) name: String,
    pub(crate) channel: u8,
    pub(crate) bank: u8,
    pub(crate) program: u8,
    pub(crate) note: NoteState,
}

impl InstrumentTrack {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            channel: 0,
            bank: 0,
            program: 0,
            note: NoteState::new(),
        }
    }
}

/// A named drum key, playable on the drum track.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct DrumKey {
    pub(crate) key: u8,
}

impl DrumKey {
    pub(crate) fn new() -> Self {
        Self {
            key: DEFAULT_DRUM_KEY,
        }
    }
}

/// A chord type: up to seven semitone offsets above the root. Unfilled slots are absent.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct Chord {
    pub(crate) offsets: [Option<u8>; CHORD_SLOTS],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum MacroKind {
    Macro,
    Arp,
}

/// A recorded word list: the body of a macro (replayed through the compiler) or of an arp
/// (replayed through the arp note parser). `start_line` anchors error positions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct MacroDef {
    pub(crate) name: String,
    pub(crate) kind: MacroKind,
    pub(crate) start_line: u32,
    pub(crate) words: Vec<String>,
}

impl MacroDef {
    pub(crate) fn new<S: Into<String>>(name: S, kind: MacroKind, start_line: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            words: Vec::new(),
        }
    }
}

#[test]
fn bar_length_follows_signature_and_division() {
    let mut header = SongHeader::new();
    assert_eq!(384, header.bar());
    header.sig_count = 3;
    header.sig_unit = 8;
    assert_eq!(144, header.bar());
    header.ppqn = 192;
    assert_eq!(288, header.bar());
}

#[test]
fn line_reset_keeps_hold() {
    let mut note = NoteState::new();
    note.octave = 7;
    note.duration = 16;
    note.hold = Some(60);
    note.reset_line_defaults();
    assert_eq!(DEFAULT_OCTAVE, note.octave);
    assert_eq!(DEFAULT_DURATION, note.duration);
    assert_eq!(Some(60), note.hold);
}
