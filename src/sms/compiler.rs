//! The SMS state machine. One pass over the word stream, dispatching each word on the first
//! interpretation that claims it: repeater, newline, comment, command prefix, definition,
//! name, timing token, dynamic parameter, controller, base note, note, key chord. The
//! compiler owns every object the document defines and emits an unordered stream of
//! absolute-time events for the finalizer.

use crate::core::{Message, CONTROL_ALL_NOTES_OFF, CONTROL_BANK_SELECT};
use crate::error::{CompileError, CompileErrorKind as Kind, FrameContext, LibError, LibResult};
use crate::file::QuartersPerMinute;
use crate::sms::chords::builtin_chords;
use crate::sms::events::{EventList, ScoreEventKind};
use crate::sms::song::{
    Chord, DrumKey, InstrumentTrack, MacroDef, MacroKind, NoteKey, NoteState, SongHeader,
    CHORD_OCTAVE, MAX_NOTE_OFFSET,
};
use crate::sms::symbols::{SymbolKind, SymbolTable};
use crate::sms::tokenizer::{Scan, Tokenizer};
use crate::sms::values::{self, NoteContext};
use log::{debug, trace};
use std::mem;

/// The default instrument track, current at the start of every plain line.
const DEFAULT_TRACK: usize = 0;

/// The drum track, fixed on MIDI channel 9.
const DRUM_TRACK: usize = 1;

/// Which definition command the current line opened with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Command {
    Header,
    Instrument,
    Drum,
    Chord,
    Arp,
    Macro,
}

impl Command {
    fn from_prefix(word: &str) -> Option<Self> {
        match word {
            "H:" => Some(Command::Header),
            "I:" => Some(Command::Instrument),
            "D:" => Some(Command::Drum),
            "C:" => Some(Command::Chord),
            "A:" => Some(Command::Arp),
            "M:" => Some(Command::Macro),
            _ => None,
        }
    }
}

/// What the previous word was, for the repeater's benefit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LastKind {
    Unknown,
    Note,
    Chord,
    Macro,
}

/// Reading position inside an expanding macro, with its own line/word counters relative to
/// the definition for error reporting.
#[derive(Clone, Debug)]
struct Expansion {
    mac: usize,
    next_word: usize,
    line: u32,
    line_word: u32,
}

#[derive(Clone, Debug)]
enum MacroMode {
    Idle,
    Defining,
    Passing(Expansion),
}

/// `[` ... `]`: every line inside restarts at `start`; `]` jumps to the furthest end.
#[derive(Clone, Copy, Debug)]
struct BlockState {
    start: u32,
    end: u32,
}

/// `(` ... `)`: every note inside restarts at `start`; `)` jumps to the furthest end and
/// restores the bar accounting.
#[derive(Clone, Copy, Debug)]
struct GroupState {
    start: u32,
    end: u32,
    bar: u32,
}

pub(crate) struct Compiler<'a> {
    tok: Tokenizer<'a>,

    pub(crate) symbols: SymbolTable,
    pub(crate) header: SongHeader,
    pub(crate) tracks: Vec<InstrumentTrack>,
    pub(crate) drum_keys: Vec<DrumKey>,
    pub(crate) chords: Vec<Chord>,
    pub(crate) macros: Vec<MacroDef>,
    pub(crate) events: EventList,

    cmd: Option<Command>,
    comment: bool,
    block_comment: bool,
    macro_mode: MacroMode,
    block: Option<BlockState>,
    group: Option<GroupState>,

    /// Pending `*N` replays of `last_word`.
    replay: Option<u32>,
    /// Additional expansions still owed to a repeated macro.
    macro_repeat: u32,
    current_word: String,
    last_word: String,
    last_kind: LastKind,

    song_time: u32,
    bar_time: u32,

    current_track: usize,
    current_drum_key: usize,
    defining_chord: usize,
    defining_macro: usize,
    base_note: Option<u32>,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let mut symbols = SymbolTable::new();
        let mut chords = Vec::new();
        for (name, chord) in builtin_chords() {
            symbols.insert(name, SymbolKind::Chord(chords.len()));
            chords.push(chord);
        }

        let mut tracks = Vec::new();
        symbols.insert("INST", SymbolKind::Instrument(DEFAULT_TRACK));
        tracks.push(InstrumentTrack::new("INST"));
        let mut drum_track = InstrumentTrack::new("DRUM");
        drum_track.channel = 9;
        symbols.insert("DRUM", SymbolKind::Instrument(DRUM_TRACK));
        tracks.push(drum_track);

        let mut drum_keys = Vec::new();
        symbols.insert("TICK:", SymbolKind::DrumKey(0));
        drum_keys.push(DrumKey::new());

        Self {
            tok: Tokenizer::new(source),
            symbols,
            header: SongHeader::new(),
            tracks,
            drum_keys,
            chords,
            macros: Vec::new(),
            events: EventList::new(),
            cmd: None,
            comment: false,
            block_comment: false,
            macro_mode: MacroMode::Idle,
            block: None,
            group: None,
            replay: None,
            macro_repeat: 0,
            current_word: String::new(),
            last_word: String::new(),
            last_kind: LastKind::Unknown,
            song_time: 0,
            bar_time: 0,
            current_track: DEFAULT_TRACK,
            current_drum_key: 0,
            defining_chord: 0,
            defining_macro: 0,
            base_note: None,
        }
    }

    pub(crate) fn run(&mut self) -> LibResult<()> {
        loop {
            let word = match self.next_word()? {
                Some(word) => word,
                None => break,
            };
            self.dispatch(&word)?;
        }
        self.finish()
    }

    // ------------------------------------------------------------------------------------
    // word supply
    // ------------------------------------------------------------------------------------

    /// The next word to process: a pending repetition, the next word of an expanding macro,
    /// or a fresh word from the tokenizer. Newlines arrive as the word `"\n"`, which is also
    /// how macro bodies record them.
    fn next_word(&mut self) -> LibResult<Option<String>> {
        loop {
            if let Some(count) = self.replay.take() {
                match self.last_kind {
                    LastKind::Macro => {
                        self.macro_repeat = count;
                    }
                    LastKind::Note | LastKind::Chord => {
                        if count > 1 {
                            self.replay = Some(count - 1);
                        }
                    }
                    LastKind::Unknown => return Err(self.err(Kind::RepeaterTarget)),
                }
                self.current_word = self.last_word.clone();
                return Ok(Some(self.current_word.clone()));
            }

            let mut fetched: Option<String> = None;
            let mut exhausted: Option<usize> = None;
            if let MacroMode::Passing(exp) = &mut self.macro_mode {
                match self.macros[exp.mac].words.get(exp.next_word) {
                    Some(word) => {
                        exp.next_word += 1;
                        if word == "\n" {
                            exp.line += 1;
                            exp.line_word = 0;
                        } else {
                            exp.line_word += 1;
                        }
                        fetched = Some(word.clone());
                    }
                    None => exhausted = Some(exp.mac),
                }
            }
            if let Some(word) = fetched {
                self.last_word = mem::replace(&mut self.current_word, word.clone());
                return Ok(Some(word));
            }
            if let Some(mac) = exhausted {
                trace!("macro '{}' exhausted", self.macros[mac].name);
                self.macro_mode = MacroMode::Idle;
                self.last_word = self.macros[mac].name.clone();
                self.last_kind = LastKind::Macro;
                if self.macro_repeat > 0 {
                    let owed = self.macro_repeat - 1;
                    self.macro_repeat = 0;
                    if owed > 0 {
                        self.replay = Some(owed);
                    }
                }
                continue;
            }

            return match self.tok.next() {
                Scan::End => Ok(None),
                Scan::Newline => {
                    self.last_word = mem::replace(&mut self.current_word, "\n".to_string());
                    Ok(Some("\n".to_string()))
                }
                Scan::Word(word) => {
                    self.last_word = mem::replace(&mut self.current_word, word.clone());
                    Ok(Some(word))
                }
            };
        }
    }

    // ------------------------------------------------------------------------------------
    // dispatch
    // ------------------------------------------------------------------------------------

    fn dispatch(&mut self, word: &str) -> LibResult<()> {
        // the repeater claims its word before anything else, but never inside a macro
        // definition or a comment
        if !matches!(self.macro_mode, MacroMode::Defining) && !self.comment && !self.block_comment
        {
            match values::repeater(word) {
                Ok(None) => {}
                Ok(Some(count)) => {
                    self.replay = Some(count);
                    return Ok(());
                }
                Err(kind) => return Err(self.err(kind)),
            }
        }
        self.last_kind = LastKind::Unknown;

        if word == "\n" {
            return self.newline();
        }

        match word {
            "//" => self.comment = true,
            "/*" => {
                if self.block_comment {
                    return Err(self.err(Kind::BlockComment));
                }
                self.block_comment = true;
            }
            "*/" => {
                if !self.block_comment {
                    return Err(self.err(Kind::BlockComment));
                }
                self.block_comment = false;
                self.comment = true;
            }
            _ => {}
        }
        if self.comment || self.block_comment {
            return Ok(());
        }

        // a command prefix opens a definition, but only as the first word of a source line
        if self.tok.line_word() == 1 && matches!(self.macro_mode, MacroMode::Idle) {
            if let Some(cmd) = Command::from_prefix(word) {
                self.cmd = Some(cmd);
                return Ok(());
            }
        }

        if let Some(cmd) = self.cmd {
            return self.define(cmd, word);
        }

        if let Some(kind) = self.symbols.lookup(word) {
            match kind {
                SymbolKind::Instrument(ix) => {
                    self.switch_instrument(ix);
                    return Ok(());
                }
                SymbolKind::DrumKey(ix) => {
                    self.current_drum_key = ix;
                    self.current_track = DRUM_TRACK;
                    self.realign_bar();
                    return Ok(());
                }
                SymbolKind::Macro(ix) => {
                    if !matches!(self.macro_mode, MacroMode::Idle) {
                        return Err(self.err(Kind::NestedMacro));
                    }
                    self.begin_expansion(ix);
                    return Ok(());
                }
                // chord and arp names are only playable through the key chord syntax
                SymbolKind::Chord(_) | SymbolKind::Arp(_) => {}
            }
        }

        match word {
            "[" => return self.open_block(),
            "]" => return self.close_block(),
            "(" => return self.open_group(),
            ")" => return self.close_group(),
            "|" => return self.bar_line(),
            _ => {}
        }

        match values::bpm(word) {
            Ok(Some(bpm)) => {
                self.tempo_change(bpm);
                return Ok(());
            }
            Ok(None) => {}
            Err(kind) => return Err(self.err(kind)),
        }

        match values::bar(word) {
            Ok(Some((count, unit))) => {
                self.header.sig_count = count;
                self.header.sig_unit = unit;
                return Ok(());
            }
            Ok(None) => {}
            Err(kind) => return Err(self.err(kind)),
        }

        match values::midi_cc(word) {
            Ok(Some((control, value))) => {
                let track_ix = self.current_track;
                let channel = self.tracks[track_ix].channel;
                self.push_channel(
                    track_ix,
                    self.song_time,
                    Message::control(channel, control, value),
                );
                return Ok(());
            }
            Ok(None) => {}
            Err(kind) => return Err(self.err(kind)),
        }

        match values::base_note(word) {
            Ok(Some(pitch)) => {
                self.base_note = Some(pitch);
                return Ok(());
            }
            Ok(None) => {}
            Err(kind) => return Err(self.err(kind)),
        }

        let ctx = if self.base_note.is_some() {
            NoteContext::BaseOffset
        } else if self.tracks[self.current_track].channel == 9 {
            NoteContext::Drum
        } else {
            NoteContext::Instrument
        };
        let mut note = self.tracks[self.current_track].note;
        let hold_pending = note.hold.take();
        match values::parse_note(word, &mut note, ctx) {
            Ok(true) => return self.play_note(note, hold_pending, ctx),
            Ok(false) => {}
            Err(kind) => return Err(self.err(kind)),
        }

        match values::parse_chord(word, &self.symbols) {
            Ok(Some(kc)) => self.play_chord(kc),
            Ok(None) => Err(self.err(Kind::UnknownWord)),
            Err(kind) => Err(self.err(kind)),
        }
    }

    fn newline(&mut self) -> LibResult<()> {
        self.pad_bar();
        self.comment = false;

        // a macro definition records the newline so expansion can reset line state
        if matches!(self.macro_mode, MacroMode::Defining) {
            self.macros[self.defining_macro].words.push("\n".to_string());
            return Ok(());
        }

        if let Some(block) = &mut self.block {
            if block.end < self.song_time {
                block.end = self.song_time;
            }
            if let Some(group) = &mut self.group {
                if group.end < self.song_time {
                    group.end = self.song_time;
                }
            }
            self.song_time = block.start;
        }
        if self.group.is_some() {
            return Err(self.err(Kind::TimeGroupPairing));
        }

        if !matches!(self.macro_mode, MacroMode::Passing(_)) && self.block.is_none() {
            self.current_track = DEFAULT_TRACK;
        }
        self.tracks[self.current_track].note.reset_line_defaults();
        self.base_note = None;
        self.cmd = None;
        Ok(())
    }

    // ------------------------------------------------------------------------------------
    // definitions
    // ------------------------------------------------------------------------------------

    fn define(&mut self, cmd: Command, word: &str) -> LibResult<()> {
        let pos = self.tok.line_word();
        match cmd {
            Command::Header => {
                if pos == 2 {
                    self.check_name(word)?;
                    self.header.name = word.to_string();
                    return Ok(());
                }
                values::apply_parameter(word, values::ParamTarget::Header(&mut self.header))
                    .map_err(|kind| self.err(kind))
            }
            Command::Instrument => {
                if pos == 2 {
                    self.check_name(word)?;
                    let ix = self.tracks.len();
                    if !self.symbols.insert(word, SymbolKind::Instrument(ix)) {
                        return Err(self.err(Kind::DuplicateName));
                    }
                    self.tracks.push(InstrumentTrack::new(word));
                    self.current_track = ix;
                    return Ok(());
                }
                let track = &mut self.tracks[self.current_track];
                values::apply_parameter(word, values::ParamTarget::Instrument(track))
                    .map_err(|kind| self.err(kind))
            }
            Command::Drum => {
                if pos == 2 {
                    self.check_name(word)?;
                    let ix = self.drum_keys.len();
                    if !self.symbols.insert(word, SymbolKind::DrumKey(ix)) {
                        return Err(self.err(Kind::DuplicateName));
                    }
                    self.drum_keys.push(DrumKey::new());
                    self.current_drum_key = ix;
                    return Ok(());
                }
                // drum definitions keep the drum track's program in step with the kit
                self.tracks[DRUM_TRACK].program = self.header.drum_kit;
                let key = &mut self.drum_keys[self.current_drum_key].key;
                values::apply_parameter(word, values::ParamTarget::DrumKey(key))
                    .map_err(|kind| self.err(kind))?;
                self.tracks[DRUM_TRACK].program = self.header.drum_kit;
                Ok(())
            }
            Command::Chord => {
                if pos == 2 {
                    self.check_name(word)?;
                    let ix = self.chords.len();
                    if !self.symbols.insert(word, SymbolKind::Chord(ix)) {
                        return Err(self.err(Kind::DuplicateName));
                    }
                    self.chords.push(Chord::default());
                    self.defining_chord = ix;
                    return Ok(());
                }
                let chord = &mut self.chords[self.defining_chord];
                let slot = (pos - 3) as usize;
                if slot >= chord.offsets.len() {
                    return Err(self.err(Kind::ChordSlots));
                }
                let (value, len) = values::leading_number(word.as_bytes());
                if len != word.len() || value > MAX_NOTE_OFFSET {
                    return Err(self.err(Kind::ChordSyntax));
                }
                chord.offsets[slot] = Some(value as u8);
                Ok(())
            }
            Command::Arp => {
                if pos == 2 {
                    self.check_name(word)?;
                    let ix = self.macros.len();
                    if !self.symbols.insert(word, SymbolKind::Arp(ix)) {
                        return Err(self.err(Kind::DuplicateName));
                    }
                    self.macros
                        .push(MacroDef::new(word, MacroKind::Arp, self.tok.line()));
                    self.defining_macro = ix;
                    return Ok(());
                }
                if matches!(word, "{" | "}" | "[" | "]") {
                    return Err(self.err(Kind::ArpQualifier));
                }
                self.macros[self.defining_macro].words.push(word.to_string());
                Ok(())
            }
            Command::Macro => self.define_macro(word, pos),
        }
    }

    fn define_macro(&mut self, word: &str, pos: u32) -> LibResult<()> {
        match self.macro_mode {
            MacroMode::Idle if pos == 2 => {
                self.check_name(word)?;
                let ix = self.macros.len();
                if !self.symbols.insert(word, SymbolKind::Macro(ix)) {
                    return Err(self.err(Kind::DuplicateName));
                }
                self.macros
                    .push(MacroDef::new(word, MacroKind::Macro, self.tok.line()));
                self.defining_macro = ix;
                Ok(())
            }
            MacroMode::Idle if pos == 3 => {
                if word != "{" {
                    return Err(self.err(Kind::MacroSyntax));
                }
                self.macro_mode = MacroMode::Defining;
                Ok(())
            }
            MacroMode::Defining => match word {
                "{" => Err(self.err(Kind::MacroSyntax)),
                "}" => {
                    self.macro_mode = MacroMode::Idle;
                    self.cmd = None;
                    // the rest of the line after the closing brace is ignored
                    self.comment = true;
                    Ok(())
                }
                _ => {
                    if let Some(SymbolKind::Macro(_)) = self.symbols.lookup(word) {
                        return Err(self.err(Kind::NestedMacro));
                    }
                    self.macros[self.defining_macro].words.push(word.to_string());
                    Ok(())
                }
            },
            _ => Err(self.err(Kind::MacroSyntax)),
        }
    }

    fn check_name(&self, word: &str) -> LibResult<()> {
        if word.as_bytes().first().map_or(false, u8::is_ascii_alphabetic) {
            Ok(())
        } else {
            Err(self.err(Kind::NameNotAlpha))
        }
    }

    // ------------------------------------------------------------------------------------
    // references and timing tokens
    // ------------------------------------------------------------------------------------

    fn switch_instrument(&mut self, ix: usize) {
        let channel = self.tracks[ix].channel;
        let bank = self.tracks[ix].bank;
        let program = self.tracks[ix].program;
        trace!("switching to track '{}'", self.tracks[ix].name);
        self.push_channel(
            ix,
            self.song_time,
            Message::control(channel, CONTROL_BANK_SELECT, bank),
        );
        self.push_channel(ix, self.song_time, Message::program_change(channel, program));
        self.current_track = ix;
        self.realign_bar();
    }

    fn begin_expansion(&mut self, mac: usize) {
        debug_assert_eq!(MacroKind::Macro, self.macros[mac].kind);
        trace!("expanding macro '{}'", self.macros[mac].name);
        self.macro_mode = MacroMode::Passing(Expansion {
            mac,
            next_word: 0,
            line: 0,
            line_word: 3,
        });
        // a macro starts like a fresh line
        self.tracks[self.current_track].note.reset_line_defaults();
        self.base_note = None;
        self.cmd = None;
    }

    fn open_block(&mut self) -> LibResult<()> {
        if self.block.is_some() {
            return Err(self.err(Kind::TimeBlockPairing));
        }
        self.block = Some(BlockState {
            start: self.song_time,
            end: self.song_time,
        });
        self.comment = true;
        Ok(())
    }

    fn close_block(&mut self) -> LibResult<()> {
        let block = match self.block.take() {
            Some(block) => block,
            None => return Err(self.err(Kind::TimeBlockPairing)),
        };
        let end = block.end.max(self.song_time);
        if let Some(group) = &mut self.group {
            if group.end < self.song_time {
                group.end = self.song_time;
            }
        }
        self.song_time = end;
        self.comment = true;
        Ok(())
    }

    fn open_group(&mut self) -> LibResult<()> {
        if self.group.is_some() {
            return Err(self.err(Kind::TimeGroupPairing));
        }
        self.group = Some(GroupState {
            start: self.song_time,
            end: self.song_time,
            bar: self.bar_time,
        });
        Ok(())
    }

    fn close_group(&mut self) -> LibResult<()> {
        let group = match self.group.take() {
            Some(group) => group,
            None => return Err(self.err(Kind::TimeGroupPairing)),
        };
        self.song_time = group.end;
        self.bar_time = group.bar + (group.end - group.start);
        Ok(())
    }

    fn bar_line(&mut self) -> LibResult<()> {
        if self.group.is_some() {
            return Err(self.err(Kind::TimeGroupPairing));
        }
        let bar = self.header.bar();
        if self.bar_time > bar {
            return Err(self.err(Kind::BarOverrun));
        }
        if self.bar_time > 0 {
            self.song_time += bar - self.bar_time;
            self.bar_time = 0;
        }
        self.tracks[self.current_track].note.dotted = false;
        Ok(())
    }

    // ------------------------------------------------------------------------------------
    // playing
    // ------------------------------------------------------------------------------------

    fn tempo_change(&mut self, bpm: u8) {
        let track_ix = self.current_track;
        let channel = self.tracks[track_ix].channel;
        // silence the channel, then mark the tempo for the finalizer
        self.push_channel(
            track_ix,
            self.song_time,
            Message::control(channel, CONTROL_ALL_NOTES_OFF, 0),
        );
        self.events.push(
            track_ix,
            self.song_time,
            ScoreEventKind::Tempo(QuartersPerMinute::new(bpm)),
        );
    }

    fn play_note(
        &mut self,
        mut note: NoteState,
        hold_pending: Option<u8>,
        ctx: NoteContext,
    ) -> LibResult<()> {
        let dur = self.note_ticks(&note);
        if let Some(group) = &self.group {
            self.song_time = group.start;
        }
        let track_ix = self.current_track;
        let channel = self.tracks[track_ix].channel;

        match note.key {
            NoteKey::Pause => {
                self.song_time += dur;
                self.bar_time += dur;
                if let Some(held) = hold_pending {
                    self.push_channel(
                        track_ix,
                        self.song_time,
                        Message::note_off(channel, held, 0),
                    );
                }
                note.hold = None;
            }
            key => {
                let pitch: i32 = match (key, ctx) {
                    (NoteKey::Beat, _) => i32::from(self.drum_keys[self.current_drum_key].key),
                    (NoteKey::Step(step), NoteContext::BaseOffset) => {
                        i32::from(step) + self.base_note.unwrap_or(0) as i32
                    }
                    (NoteKey::Step(step), _) => {
                        i32::from(step) + note.half + note.octave * 12
                    }
                    // pauses were handled above
                    (NoteKey::Pause, _) => 0,
                };
                if !(0..=127).contains(&pitch) {
                    return Err(self.err(Kind::NoteRange));
                }
                let pitch = pitch as u8;
                let on_time = self.song_time;
                self.push_channel(
                    track_ix,
                    on_time,
                    Message::note_on(channel, pitch, note.volume),
                );
                self.song_time += dur;
                self.bar_time += dur;
                if note.held {
                    // the off is deferred until the next word on this track
                    note.hold = Some(pitch);
                } else {
                    note.hold = None;
                    self.push_channel(
                        track_ix,
                        self.song_time - 1,
                        Message::note_off(channel, pitch, note.volume),
                    );
                }
                if let Some(held) = hold_pending {
                    self.push_channel(
                        track_ix,
                        on_time.saturating_sub(1),
                        Message::note_off(channel, held, 0),
                    );
                }
            }
        }

        self.stretch_block_group();
        self.tracks[track_ix].note = note;
        self.last_kind = LastKind::Note;
        Ok(())
    }

    fn play_chord(&mut self, kc: values::KeyChord) -> LibResult<()> {
        if let Some(arp) = kc.arp {
            return self.play_arp(kc, arp);
        }
        let bar = self.header.bar();
        let track_ix = self.current_track;
        let channel = self.tracks[track_ix].channel;
        let offsets = self.chords[kc.chord].offsets;
        for offset in offsets.iter().flatten() {
            let pitch = (CHORD_OCTAVE * 12) as u8 + kc.root + kc.half + offset;
            self.push_channel(
                track_ix,
                self.song_time,
                Message::note_on(channel, pitch, 127),
            );
            self.push_channel(
                track_ix,
                self.song_time + bar - 1,
                Message::note_off(channel, pitch, 127),
            );
        }
        self.song_time += bar;
        self.bar_time += bar;
        self.stretch_block_group();
        self.last_kind = LastKind::Chord;
        Ok(())
    }

    fn play_arp(&mut self, kc: values::KeyChord, arp_ix: usize) -> LibResult<()> {
        debug_assert_eq!(MacroKind::Arp, self.macros[arp_ix].kind);
        let words = self.macros[arp_ix].words.clone();
        let offsets = self.chords[kc.chord].offsets;
        let track_ix = self.current_track;
        let channel = self.tracks[track_ix].channel;
        let mut n = NoteState::new();
        n.octave = 0;

        for (i, word) in words.iter().enumerate() {
            let pos = (i + 3) as u32;
            match word.as_str() {
                "(" => {
                    if self.group.is_some() {
                        return Err(self.arp_err(Kind::TimeGroupPairing, arp_ix, word, pos));
                    }
                    self.group = Some(GroupState {
                        start: self.song_time,
                        end: self.song_time,
                        bar: self.bar_time,
                    });
                    continue;
                }
                ")" => {
                    let group = match self.group.take() {
                        Some(group) => group,
                        None => {
                            return Err(self.arp_err(Kind::TimeGroupPairing, arp_ix, word, pos))
                        }
                    };
                    self.song_time = group.end;
                    self.bar_time = group.bar + (group.end - group.start);
                    continue;
                }
                "|" => {
                    if self.group.is_some() {
                        return Err(self.arp_err(Kind::TimeGroupPairing, arp_ix, word, pos));
                    }
                    let bar = self.header.bar();
                    if self.bar_time > bar {
                        return Err(self.arp_err(Kind::BarOverrun, arp_ix, word, pos));
                    }
                    if self.bar_time > 0 {
                        self.song_time += bar - self.bar_time;
                        self.bar_time = 0;
                    }
                    self.tracks[track_ix].note.dotted = false;
                    continue;
                }
                _ => {}
            }

            match values::parse_note(word, &mut n, NoteContext::Arp) {
                Ok(true) => {}
                Ok(false) => return Err(self.arp_err(Kind::UnknownWord, arp_ix, word, pos)),
                Err(kind) => return Err(self.arp_err(kind, arp_ix, word, pos)),
            }
            let octave = CHORD_OCTAVE + n.octave;
            if !(1..=10).contains(&octave) {
                return Err(self.arp_err(Kind::OctaveRange, arp_ix, word, pos));
            }
            let dur = self.note_ticks(&n);

            match n.key {
                NoteKey::Step(step) => {
                    let offset = match offsets.get(usize::from(step)).copied().flatten() {
                        Some(offset) => offset,
                        None => {
                            return Err(self.arp_err(Kind::NoteOffsetRange, arp_ix, word, pos))
                        }
                    };
                    let pitch =
                        octave * 12 + i32::from(kc.root) + i32::from(kc.half) + i32::from(offset);
                    if !(0..=127).contains(&pitch) {
                        return Err(self.arp_err(Kind::NoteRange, arp_ix, word, pos));
                    }
                    if let Some(group) = &self.group {
                        self.song_time = group.start;
                    }
                    self.push_channel(
                        track_ix,
                        self.song_time,
                        Message::note_on(channel, pitch as u8, n.volume),
                    );
                    self.song_time += dur;
                    self.bar_time += dur;
                    // arp offs land exactly at the note end
                    self.push_channel(
                        track_ix,
                        self.song_time,
                        Message::note_off(channel, pitch as u8, n.volume),
                    );
                }
                _ => {
                    self.song_time += dur;
                    self.bar_time += dur;
                }
            }
            self.stretch_block_group();
        }

        self.last_kind = LastKind::Chord;
        Ok(())
    }

    // ------------------------------------------------------------------------------------
    // helpers
    // ------------------------------------------------------------------------------------

    fn finish(&mut self) -> LibResult<()> {
        if matches!(self.macro_mode, MacroMode::Defining) {
            return Err(self.err(Kind::UnclosedMacro));
        }
        if self.block.is_some() {
            return Err(self.err(Kind::UnclosedTimeBlock));
        }
        if self.block_comment {
            return Err(self.err(Kind::BlockComment));
        }
        self.realign_bar();
        let track_ix = self.current_track;
        let channel = self.tracks[track_ix].channel;
        self.push_channel(
            track_ix,
            self.song_time,
            Message::control(channel, CONTROL_ALL_NOTES_OFF, 0),
        );
        debug!(
            "compiled {} events, {} tracks, {} drum keys, {} chords, {} macros",
            self.events.len(),
            self.tracks.len(),
            self.drum_keys.len(),
            self.chords.len(),
            self.macros.len()
        );
        Ok(())
    }

    fn push_channel(&mut self, track: usize, time: u32, message: Message) {
        self.events.push(track, time, ScoreEventKind::Channel(message));
    }

    /// Ticks a note occupies: `ppqn * 4 / denominator`, half as much again when dotted.
    /// Integer arithmetic throughout; coarse divisions of a small ppqn truncate.
    fn note_ticks(&self, note: &NoteState) -> u32 {
        let base = u32::from(self.header.ppqn) * 4 / note.duration;
        if note.dotted {
            base * 3 / 2
        } else {
            base
        }
    }

    /// Pad the song time to the next bar boundary, wrapping an overrun bar first.
    fn pad_bar(&mut self) {
        if self.bar_time == 0 {
            return;
        }
        let bar = self.header.bar();
        if self.bar_time > bar {
            self.bar_time %= bar;
        }
        self.song_time += bar - self.bar_time;
        self.bar_time = 0;
    }

    fn realign_bar(&mut self) {
        self.pad_bar();
    }

    fn stretch_block_group(&mut self) {
        if let Some(block) = &mut self.block {
            if block.end < self.song_time {
                block.end = self.song_time;
            }
        }
        if let Some(group) = &mut self.group {
            if group.end < self.song_time {
                group.end = self.song_time;
            }
        }
    }

    fn err(&self, kind: Kind) -> LibError {
        let macro_frame = match &self.macro_mode {
            MacroMode::Passing(exp) => {
                let mac = &self.macros[exp.mac];
                Some(FrameContext::new(
                    mac.name.clone(),
                    mac.start_line + exp.line,
                    exp.line_word,
                ))
            }
            _ => None,
        };
        LibError::Compile {
            fault: CompileError::new(
                kind,
                self.tok.line(),
                self.tok.line_word(),
                self.current_word.clone(),
                macro_frame,
                None,
            ),
        }
    }

    fn arp_err(&self, kind: Kind, arp_ix: usize, word: &str, pos: u32) -> LibError {
        let arp = &self.macros[arp_ix];
        let arp_frame = Some(FrameContext::new(arp.name.clone(), arp.start_line, pos));
        let macro_frame = match &self.macro_mode {
            MacroMode::Passing(exp) => {
                let mac = &self.macros[exp.mac];
                Some(FrameContext::new(
                    mac.name.clone(),
                    mac.start_line + exp.line,
                    exp.line_word,
                ))
            }
            _ => None,
        };
        LibError::Compile {
            fault: CompileError::new(
                kind,
                self.tok.line(),
                self.tok.line_word(),
                word,
                macro_frame,
                arp_frame,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Compiler<'_> {
        let mut compiler = Compiler::new(source);
        compiler.run().unwrap();
        compiler
    }

    fn fail(source: &str) -> CompileError {
        let mut compiler = Compiler::new(source);
        match compiler.run().unwrap_err() {
            LibError::Compile { fault } => fault,
            other => panic!("expected a compile error, got {:?}", other),
        }
    }

    #[test]
    fn the_initial_world() {
        let compiler = Compiler::new("");
        assert_eq!(2, compiler.tracks.len());
        assert_eq!(9, compiler.tracks[DRUM_TRACK].channel);
        assert_eq!(27, compiler.chords.len());
        assert!(matches!(
            compiler.symbols.lookup("TICK:"),
            Some(SymbolKind::DrumKey(0))
        ));
        assert!(matches!(
            compiler.symbols.lookup("maj"),
            Some(SymbolKind::Chord(0))
        ));
    }

    #[test]
    fn an_empty_song_still_silences_the_channel() {
        let compiler = run("H: song\n");
        assert_eq!("song", compiler.header.name);
        assert_eq!(1, compiler.events.len());
    }

    #[test]
    fn one_note_makes_three_events() {
        // note on, note off, final all-notes-off
        let compiler = run("c5/4\n");
        assert_eq!(3, compiler.events.len());
    }

    #[test]
    fn repeater_replays_notes() {
        // four note on/off pairs plus the closing all-notes-off
        let compiler = run("c4 *3\n");
        assert_eq!(9, compiler.events.len());
    }

    #[test]
    fn repeater_needs_a_target() {
        let fault = fail("*2\n");
        assert_eq!(Kind::RepeaterTarget, fault.kind());
    }

    #[test]
    fn repeater_rejects_zero() {
        let fault = fail("c4 *0\n");
        assert_eq!(Kind::RepeaterValue, fault.kind());
        assert_eq!(2, fault.column());
    }

    #[test]
    fn bar_overrun_is_reported_at_the_bar_line() {
        let fault = fail("c5/4 c5/4 c5/4 c5/4 c5/4 |\n");
        assert_eq!(Kind::BarOverrun, fault.kind());
        assert_eq!(1, fault.line());
        assert_eq!(6, fault.column());
        assert_eq!("|", fault.word());
    }

    #[test]
    fn unknown_words_are_rejected() {
        let fault = fail("zzz\n");
        assert_eq!(Kind::UnknownWord, fault.kind());
        assert_eq!("zzz", fault.word());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fault = fail("I: piano\nI: piano\n");
        assert_eq!(Kind::DuplicateName, fault.kind());
        assert_eq!(2, fault.line());
    }

    #[test]
    fn names_must_start_with_a_letter() {
        let fault = fail("I: 9piano\n");
        assert_eq!(Kind::NameNotAlpha, fault.kind());
    }

    #[test]
    fn macro_errors_carry_the_frame() {
        let fault = fail("M: riff { c4 zzz }\nriff\n");
        assert_eq!(Kind::UnknownWord, fault.kind());
        let frame = fault.macro_frame().expect("macro frame");
        assert_eq!("riff", frame.name());
        assert_eq!(1, frame.line());
        assert_eq!("zzz", fault.word());
    }

    #[test]
    fn arp_errors_carry_the_frame() {
        let fault = fail("C: triad 0 2 4\nA: up 0 9 2\nCtriad~up\n");
        assert_eq!(Kind::NoteOffsetRange, fault.kind());
        let frame = fault.arp_frame().expect("arp frame");
        assert_eq!("up", frame.name());
        assert_eq!(2, frame.line());
        assert_eq!("9", fault.word());
    }

    #[test]
    fn nested_expansion_is_rejected() {
        let fault = fail("M: a { c4 }\nM: b { a }\nb\n");
        assert_eq!(Kind::NestedMacro, fault.kind());
    }

    #[test]
    fn nested_definition_is_rejected() {
        let fault = fail("M: a { c4 }\nM: b { a\n");
        assert_eq!(Kind::NestedMacro, fault.kind());
    }

    #[test]
    fn unclosed_macro_is_rejected_at_end_of_input() {
        let fault = fail("M: riff { c4\n");
        assert_eq!(Kind::UnclosedMacro, fault.kind());
    }

    #[test]
    fn unclosed_block_is_rejected_at_end_of_input() {
        let fault = fail("[\nc4\n");
        assert_eq!(Kind::UnclosedTimeBlock, fault.kind());
    }

    #[test]
    fn unclosed_block_comment_is_rejected_at_end_of_input() {
        let fault = fail("/* hello\n");
        assert_eq!(Kind::BlockComment, fault.kind());
    }

    #[test]
    fn newline_inside_a_group_is_rejected() {
        let fault = fail("( c4\nc4 )\n");
        assert_eq!(Kind::TimeGroupPairing, fault.kind());
    }

    #[test]
    fn comments_hide_anything() {
        // the block comment swallows its span and `*/` comments the rest of its line,
        // so only the first c4 plays
        let compiler = run("// zzz *3 Cmaj\nc4 /* zzz\nzzz */ c4\n");
        assert_eq!(3, compiler.events.len());
    }

    #[test]
    fn block_markers_comment_their_line() {
        let compiler = run("[ zzz zzz\nc4\n] zzz\n");
        assert_eq!(3, compiler.events.len());
    }

    #[test]
    fn macro_repeat_expands_n_additional_times() {
        let compiler = run("M: riff { c4 }\nriff *2\n");
        // three expansions of one note, plus the closing all-notes-off
        assert_eq!(7, compiler.events.len());
    }

    #[test]
    fn bare_chord_names_are_not_playable() {
        let fault = fail("maj\n");
        assert_eq!(Kind::UnknownWord, fault.kind());
        // a name starting with a note letter fails on its first non-qualifier instead
        let fault = fail("aug\n");
        assert_eq!(Kind::NoteQualifier, fault.kind());
    }

    #[test]
    fn drum_keys_switch_to_the_drum_track() {
        let compiler = run("TICK: x x");
        assert_eq!(DRUM_TRACK, compiler.current_track);
        // two beats (on+off each) plus all-notes-off
        assert_eq!(5, compiler.events.len());
    }
}
