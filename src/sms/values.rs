//! Word-shaped value parsers: repeaters, parameters, controller changes, base notes, notes,
//! and key chords. The common return shape is `Result<Option<T>, CompileErrorKind>`:
//! `Ok(None)` means the word is not of this shape and the caller should keep trying other
//! interpretations, while `Err` means the word matched the shape but violates a rule.

use crate::error::CompileErrorKind as Kind;
use crate::sms::song::{
    InstrumentTrack, NoteKey, NoteState, SongHeader, DURATION_CHOICES, MAX_NOTE_OFFSET,
    PPQN_CHOICES,
};
use crate::sms::symbols::{SymbolKind, SymbolTable};
use std::convert::TryFrom;

/// Read the run of decimal digits at the front of `bytes`: the value (saturating at
/// `u32::MAX`) and how many bytes it occupied.
pub(crate) fn leading_number(bytes: &[u8]) -> (u32, usize) {
    let mut value: u64 = 0;
    let mut len = 0usize;
    for &b in bytes {
        if !b.is_ascii_digit() {
            break;
        }
        value = (value * 10 + u64::from(b - b'0')).min(u64::from(u32::MAX));
        len += 1;
    }
    (value as u32, len)
}

fn split_eq(word: &str) -> Option<(&str, &str)> {
    let ix = word.find('=')?;
    Some((&word[..ix], &word[ix + 1..]))
}

fn int(s: &str) -> Option<i64> {
    s.parse().ok()
}

/// `*N`: replay the previous word N additional times.
pub(crate) fn repeater(word: &str) -> Result<Option<u32>, Kind> {
    let rest = match word.strip_prefix('*') {
        Some(rest) => rest,
        None => return Ok(None),
    };
    let value: i64 = match rest.parse() {
        Ok(value) => value,
        Err(_) => return Ok(None),
    };
    if value < 1 {
        return Err(Kind::RepeaterValue);
    }
    Ok(Some(value.min(i64::from(u32::MAX)) as u32))
}

fn bpm_value(value: &str) -> Result<u8, Kind> {
    match int(value) {
        Some(v) if (30..=240).contains(&v) => Ok(v as u8),
        _ => Err(Kind::ParameterValue),
    }
}

/// `bpm=V` with V in 30..=240.
pub(crate) fn bpm(word: &str) -> Result<Option<u8>, Kind> {
    match split_eq(word) {
        Some(("bpm", value)) => bpm_value(value).map(Some),
        _ => Ok(None),
    }
}

fn bar_value(value: &str) -> Result<(u32, u32), Kind> {
    let ix = value.find('/').ok_or(Kind::ParameterValue)?;
    let count = int(&value[..ix]).ok_or(Kind::ParameterValue)?;
    let unit = int(&value[ix + 1..]).ok_or(Kind::ParameterValue)?;
    if !(1..=8).contains(&count) {
        return Err(Kind::ParameterValue);
    }
    if !matches!(unit, 2 | 4 | 8 | 16) {
        return Err(Kind::ParameterValue);
    }
    Ok((count as u32, unit as u32))
}

/// `bar=N/D` with N in 1..=8 and D one of 2, 4, 8, 16. Returns the raw time signature; the
/// header turns it into ticks.
pub(crate) fn bar(word: &str) -> Result<Option<(u32, u32)>, Kind> {
    match split_eq(word) {
        Some(("bar", value)) => bar_value(value).map(Some),
        _ => Ok(None),
    }
}

/// Which object a `name=value` definition parameter applies to.
pub(crate) enum ParamTarget<'a> {
    Header(&'a mut SongHeader),
    Instrument(&'a mut InstrumentTrack),
    DrumKey(&'a mut u8),
}

/// Apply one `name=value` word (an optional leading `&` is tolerated) to the object under
/// definition, enforcing the per-command whitelist.
pub(crate) fn apply_parameter(word: &str, target: ParamTarget) -> Result<(), Kind> {
    let word = word.strip_prefix('&').unwrap_or(word);
    let (name, value) = split_eq(word).ok_or(Kind::ParameterName)?;
    match target {
        ParamTarget::Header(header) => match name {
            "ppqn" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                let v = u16::try_from(v).map_err(|_| Kind::ParameterValue)?;
                if !PPQN_CHOICES.contains(&v) {
                    return Err(Kind::ParameterValue);
                }
                header.ppqn = v;
                Ok(())
            }
            "bpm" => {
                header.bpm = bpm_value(value)?;
                Ok(())
            }
            "bar" => {
                let (count, unit) = bar_value(value)?;
                header.sig_count = count;
                header.sig_unit = unit;
                Ok(())
            }
            "drk" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                if !(0..=127).contains(&v) {
                    return Err(Kind::ParameterValue);
                }
                header.drum_kit = v as u8;
                Ok(())
            }
            _ => Err(Kind::ParameterName),
        },
        ParamTarget::Instrument(track) => match name {
            "bnk" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                if !(0..=127).contains(&v) {
                    return Err(Kind::ParameterValue);
                }
                track.bank = if track.channel == 9 { 0 } else { v as u8 };
                Ok(())
            }
            "prg" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                if !(0..=127).contains(&v) {
                    return Err(Kind::ParameterValue);
                }
                track.program = v as u8;
                Ok(())
            }
            "chn" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                if !(0..=15).contains(&v) || v == 9 {
                    return Err(Kind::ParameterValue);
                }
                track.channel = v as u8;
                Ok(())
            }
            _ => Err(Kind::ParameterName),
        },
        ParamTarget::DrumKey(key) => match name {
            "key" => {
                let v = int(value).ok_or(Kind::ParameterValue)?;
                if !(0..=127).contains(&v) {
                    return Err(Kind::ParameterValue);
                }
                *key = v as u8;
                Ok(())
            }
            _ => Err(Kind::ParameterName),
        },
    }
}

/// `@name=V`: one MIDI controller change. The name is either exactly three decimal digits
/// (the controller number) or one of the aliases vol, bal, pan, dly.
pub(crate) fn midi_cc(word: &str) -> Result<Option<(u8, u8)>, Kind> {
    let rest = match word.strip_prefix('@') {
        Some(rest) => rest,
        None => return Ok(None),
    };
    let (name, value) = match split_eq(rest) {
        Some(split) => split,
        None => return Ok(None),
    };
    if name.is_empty() {
        return Ok(None);
    }
    let v = match int(value) {
        Some(v) if (0..=127).contains(&v) => v as u8,
        _ => return Err(Kind::ParameterValue),
    };
    if name.len() == 3 && name.bytes().all(|b| b.is_ascii_digit()) {
        let (cc, _) = leading_number(name.as_bytes());
        if cc > 127 {
            return Err(Kind::ControllerName);
        }
        return Ok(Some((cc as u8, v)));
    }
    let cc = match name {
        "vol" => 7,
        "bal" => 8,
        "pan" => 10,
        "dly" => 91,
        _ => return Err(Kind::ControllerName),
    };
    Ok(Some((cc, v)))
}

/// `letter[octave][#]:` — sets the pitch anchor for base-note (tablature) mode. The octave
/// defaults to 0, so the anchor may be as low as pitch 0. Anything that does not end in the
/// `:` marker is not a base note; characters after the marker are an error.
pub(crate) fn base_note(word: &str) -> Result<Option<u32>, Kind> {
    let b = word.as_bytes();
    if b.len() < 2 {
        return Ok(None);
    }
    let mut semi: u32 = match b[0] {
        b'c' => 0,
        b'd' => 2,
        b'e' => 4,
        b'f' => 5,
        b'g' => 7,
        b'a' => 9,
        b'b' => 11,
        _ => return Ok(None),
    };
    let mut i = 1;
    let (octave, len) = leading_number(&b[1..]);
    if octave > 10 {
        return Ok(None);
    }
    i += len;
    if i >= b.len() {
        return Ok(None);
    }
    if b[i] == b'#' {
        semi += 1;
        i += 1;
    }
    if i >= b.len() {
        return Ok(None);
    }
    if b[i] != b':' {
        return Ok(None);
    }
    if i + 1 != b.len() {
        return Err(Kind::BaseNoteSyntax);
    }
    Ok(Some(semi + 12 * octave))
}

/// How a note word is interpreted: the letters and qualifiers each context accepts differ.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum NoteContext {
    Instrument,
    Drum,
    Arp,
    BaseOffset,
}

/// Parse a note word into `n`, mutating it in place so octave, duration, and volume carry
/// over to later words on the line. Returns `Ok(false)` when the word does not begin like a
/// note in this context.
pub(crate) fn parse_note(word: &str, n: &mut NoteState, ctx: NoteContext) -> Result<bool, Kind> {
    let b = word.as_bytes();
    let mut i: usize;
    n.held = false;
    match ctx {
        NoteContext::Instrument => {
            n.key = match b.first().copied() {
                Some(b'-') | Some(b'o') | Some(b'p') => NoteKey::Pause,
                Some(b'c') => NoteKey::Step(0),
                Some(b'd') => NoteKey::Step(2),
                Some(b'e') => NoteKey::Step(4),
                Some(b'f') => NoteKey::Step(5),
                Some(b'g') => NoteKey::Step(7),
                Some(b'a') => NoteKey::Step(9),
                Some(b'b') => NoteKey::Step(11),
                _ => return Ok(false),
            };
            i = 1;
        }
        NoteContext::Arp | NoteContext::BaseOffset => {
            let (value, len) = leading_number(b);
            if len > 0 {
                if value > MAX_NOTE_OFFSET {
                    return Err(Kind::NoteOffsetRange);
                }
                n.key = NoteKey::Step(value as u8);
                i = len;
            } else {
                match b.first().copied() {
                    Some(b'p') | Some(b'o') | Some(b'-') => n.key = NoteKey::Pause,
                    _ => return Ok(false),
                }
                i = 1;
            }
        }
        NoteContext::Drum => {
            n.key = match b.first().copied() {
                Some(b'x') => NoteKey::Beat,
                Some(b'o') | Some(b'p') | Some(b'-') => NoteKey::Pause,
                _ => return Ok(false),
            };
            i = 1;
        }
    }

    n.half = 0;
    n.dotted = false;

    // an absolute octave digit, only where pitch is absolute
    if ctx == NoteContext::Instrument || ctx == NoteContext::Drum {
        let (value, len) = leading_number(&b[i..]);
        if len > 0 {
            if value > 10 {
                return Err(Kind::OctaveRange);
            }
            n.octave = value as i32;
            i += len;
        }
    }

    while i < b.len() {
        match b[i] {
            b'#' | b'+' => {
                match ctx {
                    NoteContext::Arp => return Err(Kind::ArpQualifier),
                    NoteContext::Drum => return Err(Kind::DrumQualifier),
                    NoteContext::BaseOffset => return Err(Kind::BaseNoteQualifier),
                    NoteContext::Instrument => {}
                }
                n.half += 1;
                i += 1;
            }
            b'-' => {
                match ctx {
                    NoteContext::Arp => return Err(Kind::ArpQualifier),
                    NoteContext::Drum => return Err(Kind::DrumQualifier),
                    NoteContext::BaseOffset => return Err(Kind::BaseNoteQualifier),
                    NoteContext::Instrument => {}
                }
                n.half -= 1;
                i += 1;
            }
            b'>' => {
                match ctx {
                    NoteContext::Drum => return Err(Kind::DrumQualifier),
                    NoteContext::BaseOffset => return Err(Kind::BaseNoteQualifier),
                    _ => {}
                }
                n.octave += 1;
                i += 1;
                if ctx != NoteContext::Arp && n.octave > 10 {
                    return Err(Kind::OctaveRange);
                }
            }
            b'<' => {
                match ctx {
                    NoteContext::Drum => return Err(Kind::DrumQualifier),
                    NoteContext::BaseOffset => return Err(Kind::BaseNoteQualifier),
                    _ => {}
                }
                n.octave -= 1;
                i += 1;
                if ctx != NoteContext::Arp && n.octave < 1 {
                    return Err(Kind::OctaveRange);
                }
            }
            b'.' => {
                if n.dotted {
                    return Err(Kind::DuplicateDot);
                }
                n.dotted = true;
                i += 1;
            }
            b'/' => {
                i += 1;
                let (value, len) = leading_number(&b[i..]);
                if len == 0 || !DURATION_CHOICES.contains(&value) {
                    return Err(Kind::DurationValue);
                }
                n.duration = value;
                n.dotted = false;
                i += len;
            }
            b'!' => {
                i += 1;
                let (value, len) = leading_number(&b[i..]);
                if len == 0 || value > 127 {
                    return Err(Kind::VolumeValue);
                }
                n.volume = value as u8;
                i += len;
            }
            b'_' => {
                if i + 1 != b.len() {
                    return Err(Kind::HoldNotLast);
                }
                n.held = true;
                i += 1;
            }
            _ => return Err(Kind::NoteQualifier),
        }
    }
    Ok(true)
}

/// A parsed key chord word: root semitone, optional sharp, the chord type, and the optional
/// arp to break it with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct KeyChord {
    pub(crate) root: u8,
    pub(crate) half: u8,
    pub(crate) chord: usize,
    pub(crate) arp: Option<usize>,
}

/// `ROOT[#|+]type[~arp]` with ROOT one of C..B. The type suffix must name an installed
/// chord; the empty suffix is an error rather than a fallthrough.
pub(crate) fn parse_chord(word: &str, symbols: &SymbolTable) -> Result<Option<KeyChord>, Kind> {
    let (head, arp_name) = match word.find('~') {
        Some(ix) => (&word[..ix], Some(&word[ix + 1..])),
        None => (word, None),
    };
    let b = head.as_bytes();
    let root: u8 = match b.first().copied() {
        Some(b'C') => 0,
        Some(b'D') => 2,
        Some(b'E') => 4,
        Some(b'F') => 5,
        Some(b'G') => 7,
        Some(b'A') => 9,
        Some(b'B') => 11,
        _ => return Ok(None),
    };
    let mut i = 1;
    let mut half = 0u8;
    if matches!(b.get(1).copied(), Some(b'#') | Some(b'+')) {
        half = 1;
        i = 2;
    }
    let suffix = &head[i..];
    if suffix.is_empty() {
        return Err(Kind::KeyChord);
    }
    let chord = match symbols.lookup(suffix) {
        Some(SymbolKind::Chord(ix)) => ix,
        _ => return Err(Kind::KeyChord),
    };
    let arp = match arp_name {
        Some(name) if !name.is_empty() => match symbols.lookup(name) {
            Some(SymbolKind::Arp(ix)) => Some(ix),
            _ => return Err(Kind::UnknownArp),
        },
        _ => None,
    };
    Ok(Some(KeyChord {
        root,
        half,
        chord,
        arp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeater_words() {
        assert_eq!(Ok(Some(3)), repeater("*3"));
        assert_eq!(Ok(None), repeater("c4"));
        assert_eq!(Ok(None), repeater("*"));
        assert_eq!(Ok(None), repeater("*/"));
        assert_eq!(Ok(None), repeater("*3x"));
        assert_eq!(Err(Kind::RepeaterValue), repeater("*0"));
        assert_eq!(Err(Kind::RepeaterValue), repeater("*-2"));
    }

    #[test]
    fn bpm_words() {
        assert_eq!(Ok(Some(100)), bpm("bpm=100"));
        assert_eq!(Ok(Some(30)), bpm("bpm=30"));
        assert_eq!(Ok(None), bpm("bar=3/4"));
        assert_eq!(Err(Kind::ParameterValue), bpm("bpm=29"));
        assert_eq!(Err(Kind::ParameterValue), bpm("bpm=241"));
        assert_eq!(Err(Kind::ParameterValue), bpm("bpm="));
    }

    #[test]
    fn bar_words() {
        assert_eq!(Ok(Some((3, 4))), bar("bar=3/4"));
        assert_eq!(Ok(Some((8, 16))), bar("bar=8/16"));
        assert_eq!(Ok(None), bar("bpm=100"));
        assert_eq!(Err(Kind::ParameterValue), bar("bar=3"));
        assert_eq!(Err(Kind::ParameterValue), bar("bar=0/4"));
        assert_eq!(Err(Kind::ParameterValue), bar("bar=3/5"));
    }

    #[test]
    fn header_parameters() {
        let mut header = SongHeader::new();
        apply_parameter("ppqn=192", ParamTarget::Header(&mut header)).unwrap();
        assert_eq!(192, header.ppqn);
        apply_parameter("&bpm=90", ParamTarget::Header(&mut header)).unwrap();
        assert_eq!(90, header.bpm);
        apply_parameter("bar=3/8", ParamTarget::Header(&mut header)).unwrap();
        assert_eq!((3, 8), (header.sig_count, header.sig_unit));
        apply_parameter("drk=16", ParamTarget::Header(&mut header)).unwrap();
        assert_eq!(16, header.drum_kit);
        assert_eq!(
            Err(Kind::ParameterValue),
            apply_parameter("ppqn=100", ParamTarget::Header(&mut header))
        );
        assert_eq!(
            Err(Kind::ParameterName),
            apply_parameter("prg=1", ParamTarget::Header(&mut header))
        );
    }

    #[test]
    fn instrument_parameters() {
        let mut track = InstrumentTrack::new("piano");
        apply_parameter("chn=3", ParamTarget::Instrument(&mut track)).unwrap();
        apply_parameter("bnk=2", ParamTarget::Instrument(&mut track)).unwrap();
        apply_parameter("&prg=24", ParamTarget::Instrument(&mut track)).unwrap();
        assert_eq!((3, 2, 24), (track.channel, track.bank, track.program));
        // channel 9 is reserved for drums
        assert_eq!(
            Err(Kind::ParameterValue),
            apply_parameter("chn=9", ParamTarget::Instrument(&mut track))
        );
        assert_eq!(
            Err(Kind::ParameterName),
            apply_parameter("key=9", ParamTarget::Instrument(&mut track))
        );
    }

    #[test]
    fn bank_is_forced_to_zero_on_the_drum_channel() {
        let mut track = InstrumentTrack::new("drums");
        track.channel = 9;
        apply_parameter("bnk=5", ParamTarget::Instrument(&mut track)).unwrap();
        assert_eq!(0, track.bank);
    }

    #[test]
    fn drum_parameters() {
        let mut key = 31u8;
        apply_parameter("key=36", ParamTarget::DrumKey(&mut key)).unwrap();
        assert_eq!(36, key);
        assert_eq!(
            Err(Kind::ParameterValue),
            apply_parameter("key=128", ParamTarget::DrumKey(&mut key))
        );
    }

    #[test]
    fn midi_cc_words() {
        assert_eq!(Ok(Some((7, 100))), midi_cc("@vol=100"));
        assert_eq!(Ok(Some((8, 64))), midi_cc("@bal=64"));
        assert_eq!(Ok(Some((10, 0))), midi_cc("@pan=0"));
        assert_eq!(Ok(Some((91, 127))), midi_cc("@dly=127"));
        assert_eq!(Ok(Some((7, 5))), midi_cc("@007=5"));
        assert_eq!(Ok(Some((123, 0))), midi_cc("@123=0"));
        assert_eq!(Ok(None), midi_cc("vol=100"));
        assert_eq!(Ok(None), midi_cc("@vol"));
        assert_eq!(Err(Kind::ParameterValue), midi_cc("@vol=200"));
        assert_eq!(Err(Kind::ControllerName), midi_cc("@128=5"));
        assert_eq!(Err(Kind::ControllerName), midi_cc("@xyz=5"));
        assert_eq!(Err(Kind::ControllerName), midi_cc("@12=5"));
    }

    #[test]
    fn base_note_words() {
        assert_eq!(Ok(Some(60)), base_note("c5:"));
        assert_eq!(Ok(Some(0)), base_note("c:"));
        assert_eq!(Ok(Some(9)), base_note("a:"));
        assert_eq!(Ok(Some(70)), base_note("a5#:"));
        assert_eq!(Ok(None), base_note("c5"));
        assert_eq!(Ok(None), base_note("x5:"));
        assert_eq!(Ok(None), base_note("c"));
        assert_eq!(Err(Kind::BaseNoteSyntax), base_note("c5:x"));
    }

    #[test]
    fn instrument_notes() {
        let mut n = NoteState::new();
        assert_eq!(Ok(true), parse_note("c", &mut n, NoteContext::Instrument));
        assert_eq!(NoteKey::Step(0), n.key);
        assert_eq!(5, n.octave);

        assert_eq!(Ok(true), parse_note("a3>#/16.!90", &mut n, NoteContext::Instrument));
        assert_eq!(NoteKey::Step(9), n.key);
        assert_eq!(4, n.octave);
        assert_eq!(1, n.half);
        assert_eq!(16, n.duration);
        assert!(n.dotted);
        assert_eq!(90, n.volume);

        // octave, duration and volume persist to the next word, half-tone and dot reset
        assert_eq!(Ok(true), parse_note("b", &mut n, NoteContext::Instrument));
        assert_eq!(4, n.octave);
        assert_eq!(16, n.duration);
        assert_eq!(90, n.volume);
        assert_eq!(0, n.half);
        assert!(!n.dotted);

        assert_eq!(Ok(false), parse_note("x", &mut n, NoteContext::Instrument));
        assert_eq!(Ok(false), parse_note("H:", &mut n, NoteContext::Instrument));
    }

    #[test]
    fn pause_words() {
        let mut n = NoteState::new();
        for word in &["-", "o", "p"] {
            assert_eq!(Ok(true), parse_note(word, &mut n, NoteContext::Instrument));
            assert_eq!(NoteKey::Pause, n.key);
        }
        assert_eq!(Ok(true), parse_note("o/8", &mut n, NoteContext::Instrument));
        assert_eq!(8, n.duration);
    }

    #[test]
    fn a_slash_clears_an_earlier_dot_in_the_same_word() {
        let mut n = NoteState::new();
        assert_eq!(Ok(true), parse_note("c./4", &mut n, NoteContext::Instrument));
        assert!(!n.dotted);
        assert_eq!(Ok(true), parse_note("c/4.", &mut n, NoteContext::Instrument));
        assert!(n.dotted);
        assert_eq!(
            Err(Kind::DuplicateDot),
            parse_note("c..", &mut n, NoteContext::Instrument)
        );
    }

    #[test]
    fn hold_must_be_last() {
        let mut n = NoteState::new();
        assert_eq!(Ok(true), parse_note("c/4_", &mut n, NoteContext::Instrument));
        assert!(n.held);
        assert_eq!(
            Err(Kind::HoldNotLast),
            parse_note("c_/4", &mut n, NoteContext::Instrument)
        );
    }

    #[test]
    fn octave_limits() {
        let mut n = NoteState::new();
        assert_eq!(
            Err(Kind::OctaveRange),
            parse_note("c11", &mut n, NoteContext::Instrument)
        );
        assert_eq!(
            Err(Kind::OctaveRange),
            parse_note("c10>", &mut n, NoteContext::Instrument)
        );
        assert_eq!(
            Err(Kind::OctaveRange),
            parse_note("c1<", &mut n, NoteContext::Instrument)
        );
        // arps are checked later, against the chord octave
        n.octave = 0;
        assert_eq!(Ok(true), parse_note("0>>>", &mut n, NoteContext::Arp));
        assert_eq!(3, n.octave);
    }

    #[test]
    fn duration_and_volume_limits() {
        let mut n = NoteState::new();
        assert_eq!(
            Err(Kind::DurationValue),
            parse_note("c/3", &mut n, NoteContext::Instrument)
        );
        assert_eq!(
            Err(Kind::DurationValue),
            parse_note("c/", &mut n, NoteContext::Instrument)
        );
        assert_eq!(Ok(true), parse_note("c/64", &mut n, NoteContext::Instrument));
        assert_eq!(
            Err(Kind::VolumeValue),
            parse_note("c!128", &mut n, NoteContext::Instrument)
        );
    }

    #[test]
    fn drum_words() {
        let mut n = NoteState::new();
        assert_eq!(Ok(true), parse_note("x", &mut n, NoteContext::Drum));
        assert_eq!(NoteKey::Beat, n.key);
        assert_eq!(Ok(true), parse_note("x/8!100", &mut n, NoteContext::Drum));
        assert_eq!(8, n.duration);
        assert_eq!(100, n.volume);
        assert_eq!(Ok(true), parse_note("-", &mut n, NoteContext::Drum));
        assert_eq!(NoteKey::Pause, n.key);
        assert_eq!(
            Err(Kind::DrumQualifier),
            parse_note("x#", &mut n, NoteContext::Drum)
        );
        assert_eq!(
            Err(Kind::DrumQualifier),
            parse_note("x>", &mut n, NoteContext::Drum)
        );
        assert_eq!(Ok(false), parse_note("c", &mut n, NoteContext::Drum));
    }

    #[test]
    fn arp_words() {
        let mut n = NoteState::new();
        n.octave = 0;
        assert_eq!(Ok(true), parse_note("2/8", &mut n, NoteContext::Arp));
        assert_eq!(NoteKey::Step(2), n.key);
        assert_eq!(8, n.duration);
        assert_eq!(Ok(true), parse_note("p", &mut n, NoteContext::Arp));
        assert_eq!(NoteKey::Pause, n.key);
        assert_eq!(
            Err(Kind::NoteOffsetRange),
            parse_note("25", &mut n, NoteContext::Arp)
        );
        assert_eq!(
            Err(Kind::ArpQualifier),
            parse_note("2#", &mut n, NoteContext::Arp)
        );
        assert_eq!(Ok(false), parse_note("q", &mut n, NoteContext::Arp))
    }

    #[test]
    fn base_offset_words() {
        let mut n = NoteState::new();
        assert_eq!(Ok(true), parse_note("12/8", &mut n, NoteContext::BaseOffset));
        assert_eq!(NoteKey::Step(12), n.key);
        assert_eq!(
            Err(Kind::BaseNoteQualifier),
            parse_note("3#", &mut n, NoteContext::BaseOffset)
        );
        assert_eq!(
            Err(Kind::BaseNoteQualifier),
            parse_note("3>", &mut n, NoteContext::BaseOffset)
        );
    }

    #[test]
    fn chord_words() {
        let mut symbols = SymbolTable::new();
        symbols.insert("maj", SymbolKind::Chord(0));
        symbols.insert("up", SymbolKind::Arp(1));
        symbols.insert("riff", SymbolKind::Macro(2));

        let kc = parse_chord("Cmaj", &symbols).unwrap().unwrap();
        assert_eq!((0, 0, 0, None), (kc.root, kc.half, kc.chord, kc.arp));

        let kc = parse_chord("F#maj~up", &symbols).unwrap().unwrap();
        assert_eq!((5, 1, 0, Some(1)), (kc.root, kc.half, kc.chord, kc.arp));

        let kc = parse_chord("A+maj", &symbols).unwrap().unwrap();
        assert_eq!((9, 1), (kc.root, kc.half));

        assert_eq!(Ok(None), parse_chord("cmaj", &symbols));
        assert_eq!(Ok(None), parse_chord("Xmaj", &symbols));
        assert_eq!(Err(Kind::KeyChord), parse_chord("C", &symbols));
        assert_eq!(Err(Kind::KeyChord), parse_chord("C#", &symbols));
        assert_eq!(Err(Kind::KeyChord), parse_chord("Cxyz", &symbols));
        assert_eq!(Err(Kind::KeyChord), parse_chord("Criff", &symbols));
        assert_eq!(Err(Kind::UnknownArp), parse_chord("Cmaj~down", &symbols));
        assert_eq!(Err(Kind::UnknownArp), parse_chord("Cmaj~riff", &symbols));
    }

    #[test]
    fn leading_number_reads_digits() {
        assert_eq!((123, 3), leading_number(b"123x"));
        assert_eq!((0, 0), leading_number(b"x123"));
        assert_eq!((0, 1), leading_number(b"0"));
    }
}
