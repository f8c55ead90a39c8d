//! The chord types every compilation starts with.

use crate::sms::song::{Chord, CHORD_SLOTS};

fn chord(tones: &[u8]) -> Chord {
    debug_assert!(tones.len() <= CHORD_SLOTS);
    let mut offsets = [None; CHORD_SLOTS];
    for (slot, &tone) in offsets.iter_mut().zip(tones) {
        *slot = Some(tone);
    }
    Chord { offsets }
}

/// The 27 builtin chord types, in installation order.
pub(crate) fn builtin_chords() -> Vec<(&'static str, Chord)> {
    vec![
        ("maj", chord(&[0, 4, 7])),
        ("7", chord(&[0, 4, 7, 10])),
        ("maj7", chord(&[0, 4, 7, 11])),
        ("6", chord(&[0, 4, 7, 9])),
        ("6/9", chord(&[0, 4, 7, 9, 14])),
        ("5", chord(&[0, 7])),
        ("9", chord(&[0, 4, 7, 10, 14])),
        ("maj9", chord(&[0, 4, 7, 10, 13])),
        ("11", chord(&[0, 4, 7, 10, 14, 16])),
        ("13", chord(&[0, 4, 7, 10, 14, 17, 21])),
        ("maj13", chord(&[0, 4, 7, 11, 14, 21])),
        ("add", chord(&[0, 4, 7, 14])),
        ("7-5", chord(&[0, 4, 6, 10])),
        ("7+5", chord(&[0, 4, 8, 10])),
        ("sus", chord(&[0, 5, 7])),
        ("dim", chord(&[0, 3, 6])),
        ("dim7", chord(&[0, 3, 6, 9])),
        ("aug", chord(&[0, 3, 8])),
        ("aug7", chord(&[0, 3, 10])),
        // minor chords
        ("m", chord(&[0, 3, 7])),
        ("m7", chord(&[0, 3, 7, 10])),
        ("mM7", chord(&[0, 3, 7, 11])),
        ("m6", chord(&[0, 3, 7, 9])),
        ("m9", chord(&[0, 3, 7, 10, 14])),
        ("m11", chord(&[0, 3, 7, 10, 14, 16])),
        ("m13", chord(&[0, 3, 7, 10, 14, 17, 21])),
        ("m7b5", chord(&[0, 3, 6, 10])),
    ]
}

#[test]
fn twenty_seven_builtins() {
    assert_eq!(27, builtin_chords().len());
}

#[test]
fn major_triad_tones() {
    let chords = builtin_chords();
    let (name, maj) = &chords[0];
    assert_eq!(&"maj", name);
    assert_eq!(
        [Some(0), Some(4), Some(7), None, None, None, None],
        maj.offsets
    );
}
