mod utils;

use sms_midi::{compile, CompileErrorKind};
use utils::{
    declared_division, declared_format, declared_tracks, delta_sum, enable_logging, events_of,
    track_bodies, RawEvent,
};

/// The fixed preamble of every track: device name, bank select, program change; the first
/// track also opens with tempo, copyright, and program name. Returns the events after it.
fn playback_events(body: &[u8], first: bool) -> Vec<RawEvent> {
    let events = events_of(body);
    let skip = if first { 6 } else { 3 };
    events.into_iter().skip(skip).collect()
}

#[test]
fn empty_but_legal_song() {
    enable_logging();
    let bytes = compile("H: song\n").unwrap();

    let mut expected: Vec<u8> = vec![
        // MThd, length 6, format 0, one track, division 96
        0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x60,
        // MTrk, length 76
        0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x4C,
        // SetTempo, 500000 microseconds per quarter
        0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20,
        // Copyright
        0x00, 0xFF, 0x02, 0x0F,
    ];
    expected.extend_from_slice(b"(c) ma.ke. 2024");
    expected.extend_from_slice(&[0x00, 0xFF, 0x08, 0x17]);
    expected.extend_from_slice(b"created with HIDCAM-SMS");
    expected.extend_from_slice(&[0x00, 0xFF, 0x09, 0x04]);
    expected.extend_from_slice(b"INST");
    // bank select and program change on channel 0
    expected.extend_from_slice(&[0x00, 0xB0, 0x00, 0x00]);
    expected.extend_from_slice(&[0x00, 0xC0, 0x00]);
    // the closing all-notes-off
    expected.extend_from_slice(&[0x00, 0xB0, 0x7B, 0x00]);
    // EndOfTrack
    expected.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    assert_eq!(expected.len(), bytes.len());
    for (ix, &byte) in bytes.iter().enumerate() {
        assert_eq!(
            expected[ix], byte,
            "mismatch at byte index {}, expected {:#04X}, got {:#04X}",
            ix, expected[ix], byte
        );
    }
}

#[test]
fn one_c_major_quarter() {
    enable_logging();
    // the instrument definition alone emits nothing; the note plays on the default track
    let bytes = compile("I: piano &prg=0\nc5/4\n").unwrap();
    assert_eq!(0, declared_format(&bytes));
    assert_eq!(1, declared_tracks(&bytes));
    assert_eq!(96, declared_division(&bytes));

    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // note on at delta 0, note off one tick early
    assert_eq!(0, events[0].delta);
    assert_eq!(&[0x90, 60, 127], events[0].bytes.as_slice());
    assert_eq!(95, events[1].delta);
    assert_eq!(&[0x80, 60, 127], events[1].bytes.as_slice());
    // the line pads to the bar, so the closing all-notes-off lands at tick 384
    assert_eq!(289, events[2].delta);
    assert_eq!(&[0xB0, 0x7B, 0x00], events[2].bytes.as_slice());
}

#[test]
fn dotted_note_then_rest_then_note() {
    enable_logging();
    let bytes = compile("c5/4. o/4 c5/4\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // dotted quarter: 144 ticks
    assert_eq!((0, vec![0x90, 60, 127]), (events[0].delta, events[0].bytes.clone()));
    assert_eq!((143, vec![0x80, 60, 127]), (events[1].delta, events[1].bytes.clone()));
    // 96 ticks of rest; the second note-on sits at absolute time 240
    assert_eq!((97, vec![0x90, 60, 127]), (events[2].delta, events[2].bytes.clone()));
    assert_eq!((95, vec![0x80, 60, 127]), (events[3].delta, events[3].bytes.clone()));
}

#[test]
fn repeater_plays_four_notes() {
    enable_logging();
    let bytes = compile("c4 *3\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    let ons: Vec<&RawEvent> = events.iter().filter(|e| e.bytes[0] == 0x90).collect();
    assert_eq!(4, ons.len());
    for on in ons {
        assert_eq!(&[0x90, 48, 127], on.bytes.as_slice());
    }
}

#[test]
fn chord_with_arp_steps_through_the_chord() {
    enable_logging();
    let bytes = compile("C: triad 0 2 4\nA: up 0 1 2\nCtriad~up\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    let ons: Vec<u8> = events
        .iter()
        .filter(|e| e.bytes[0] == 0x90)
        .map(|e| e.bytes[1])
        .collect();
    // octave 3, root C, offsets 0 2 4
    assert_eq!(vec![36, 38, 40], ons);
    // arp offs land exactly at the note end, no one-tick gap
    assert_eq!(96, events[1].delta);
    assert_eq!(&[0x80, 36, 127], events[1].bytes.as_slice());
    // the whole arp fits in one bar
    let last_on_time: u32 = events
        .iter()
        .take_while(|e| e.bytes[0] != 0xB0)
        .map(|e| e.delta)
        .sum();
    assert!(last_on_time <= 384);
}

#[test]
fn plain_chord_holds_for_one_bar() {
    enable_logging();
    let bytes = compile("Cmaj\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    let ons: Vec<u8> = events
        .iter()
        .filter(|e| e.bytes[0] == 0x90)
        .map(|e| e.bytes[1])
        .collect();
    assert_eq!(vec![36, 40, 43], ons);
    // all three start together and release one tick before the bar ends
    assert_eq!(0, events[0].delta + events[1].delta + events[2].delta);
    let offs: Vec<&RawEvent> = events.iter().filter(|e| e.bytes[0] == 0x80).collect();
    assert_eq!(3, offs.len());
    let first_off_time: u32 = events
        .iter()
        .take_while(|e| e.bytes[0] != 0x80)
        .map(|e| e.delta)
        .sum::<u32>()
        + offs[0].delta;
    assert_eq!(383, first_off_time);
}

#[test]
fn bar_overrun_fails() {
    enable_logging();
    let err = compile("c5/4 c5/4 c5/4 c5/4 c5/4 |\n").unwrap_err();
    let fault = err.compile_error().expect("compile error details");
    assert_eq!(CompileErrorKind::BarOverrun, fault.kind());
    assert_eq!(1, fault.line());
    assert_eq!(6, fault.column());
    assert_eq!("|", fault.word());
}

#[test]
fn held_note_releases_one_tick_before_its_successor() {
    enable_logging();
    let bytes = compile("c5_ d5\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // c starts, d's note-on is preceded by c's off at one tick earlier, velocity 0
    assert_eq!((0, vec![0x90, 60, 127]), (events[0].delta, events[0].bytes.clone()));
    assert_eq!((95, vec![0x80, 60, 0]), (events[1].delta, events[1].bytes.clone()));
    assert_eq!((1, vec![0x90, 62, 127]), (events[2].delta, events[2].bytes.clone()));
    assert_eq!((95, vec![0x80, 62, 127]), (events[3].delta, events[3].bytes.clone()));
}

#[test]
fn trailing_held_note_never_releases() {
    enable_logging();
    let bytes = compile("c5_\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    assert_eq!(&[0x90, 60, 127], events[0].bytes.as_slice());
    assert!(events.iter().all(|e| e.bytes[0] != 0x80));
}

#[test]
fn held_note_releases_at_the_end_of_a_following_pause() {
    enable_logging();
    let bytes = compile("c5_ o/4\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    assert_eq!((0, vec![0x90, 60, 127]), (events[0].delta, events[0].bytes.clone()));
    // the pause runs to tick 192 and the off lands there, velocity 0
    assert_eq!((192, vec![0x80, 60, 0]), (events[1].delta, events[1].bytes.clone()));
}

#[test]
fn time_group_layers_notes() {
    enable_logging();
    let bytes = compile("( c5/4 g5/2 )\nc5/4\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // both group notes start at tick 0
    assert_eq!((0, vec![0x90, 60, 127]), (events[0].delta, events[0].bytes.clone()));
    assert_eq!((0, vec![0x90, 67, 127]), (events[1].delta, events[1].bytes.clone()));
    assert_eq!((95, vec![0x80, 60, 127]), (events[2].delta, events[2].bytes.clone()));
    assert_eq!((96, vec![0x80, 67, 127]), (events[3].delta, events[3].bytes.clone()));
    // the group advanced the bar by its longest member; the line then pads to the bar,
    // so the next note starts at tick 384
    assert_eq!((193, vec![0x90, 60, 127]), (events[4].delta, events[4].bytes.clone()));
}

#[test]
fn time_block_layers_lines_and_tracks() {
    enable_logging();
    let bytes = compile("[\nc5/1\nTICK: x x x x\n]\nc5/4\n").unwrap();
    assert_eq!(1, declared_format(&bytes));
    assert_eq!(2, declared_tracks(&bytes));

    let bodies = track_bodies(&bytes);
    // tracks come out in name order: DRUM before INST
    let drum = playback_events(bodies[0], true);
    let inst = playback_events(bodies[1], false);

    // four beats on channel 9 starting at tick 0, the default key
    let beats: Vec<&RawEvent> = drum.iter().filter(|e| e.bytes[0] == 0x99).collect();
    assert_eq!(4, beats.len());
    assert_eq!(&[0x99, 31, 127], beats[0].bytes.as_slice());
    assert_eq!(0, beats[0].delta);

    // after the block both lines have elapsed; the instrument line resumes at 384
    let whole_note_off: u32 = inst[0].delta + inst[1].delta;
    assert_eq!(383, whole_note_off);
    assert_eq!((1, vec![0x90, 60, 127]), (inst[2].delta, inst[2].bytes.clone()));
}

#[test]
fn tempo_change_emits_all_notes_off_then_tempo_meta() {
    enable_logging();
    let bytes = compile("c5/4 bpm=100 c5/4\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // note, its off, then the channel silencer at the same tick as the tempo meta
    assert_eq!((1, vec![0xB0, 0x7B, 0x00]), (events[2].delta, events[2].bytes.clone()));
    // 60,000,000 / 100 = 600,000 microseconds per quarter
    assert_eq!(
        (0, vec![0xFF, 0x51, 0x03, 0x09, 0x27, 0xC0]),
        (events[3].delta, events[3].bytes.clone())
    );
    // the second note keeps its absolute position
    assert_eq!((0, vec![0x90, 60, 127]), (events[4].delta, events[4].bytes.clone()));
}

#[test]
fn base_note_turns_numbers_into_offsets() {
    enable_logging();
    let bytes = compile("c5: 0 4 7\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    let ons: Vec<u8> = events
        .iter()
        .filter(|e| e.bytes[0] == 0x90)
        .map(|e| e.bytes[1])
        .collect();
    assert_eq!(vec![60, 64, 67], ons);
}

#[test]
fn controller_words_emit_control_changes() {
    enable_logging();
    let bytes = compile("@vol=100 @007=64 @pan=32\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    assert_eq!((0, vec![0xB0, 7, 100]), (events[0].delta, events[0].bytes.clone()));
    assert_eq!((0, vec![0xB0, 7, 64]), (events[1].delta, events[1].bytes.clone()));
    assert_eq!((0, vec![0xB0, 10, 32]), (events[2].delta, events[2].bytes.clone()));
}

#[test]
fn macros_expand_and_repeat() {
    enable_logging();
    let bytes = compile("M: riff { c4 d4 }\nriff *1\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    let ons: Vec<u8> = events
        .iter()
        .filter(|e| e.bytes[0] == 0x90)
        .map(|e| e.bytes[1])
        .collect();
    // one expansion plus one repeat
    assert_eq!(vec![48, 50, 48, 50], ons);
}

#[test]
fn drum_definitions_pick_key_and_kit() {
    enable_logging();
    let bytes = compile("H: drk=16\nD: kick key=36\nkick x x\n").unwrap();
    assert_eq!(2, declared_tracks(&bytes));
    let bodies = track_bodies(&bytes);
    let drum = events_of(bodies[0]);
    // drum track preamble: device name DRUM, bank select, program change to the kit
    assert_eq!(
        vec![0xFF, 0x09, 0x04, b'D', b'R', b'U', b'M'],
        drum[3].bytes
    );
    assert_eq!(vec![0xB9, 0x00, 0x00], drum[4].bytes);
    assert_eq!(vec![0xC9, 16], drum[5].bytes);
    // the beats strike the defined key on channel 9
    let ons: Vec<&RawEvent> = drum.iter().filter(|e| e.bytes[0] == 0x99).collect();
    assert_eq!(2, ons.len());
    assert_eq!(&[0x99, 36, 127], ons[0].bytes.as_slice());
}

#[test]
fn instrument_switch_emits_bank_and_program() {
    enable_logging();
    let bytes = compile("I: piano chn=1 bnk=2 prg=3\npiano c5/4\n").unwrap();
    assert_eq!(2, declared_tracks(&bytes));
    let bodies = track_bodies(&bytes);
    // INST sorts before piano; the piano track carries the switch events and the note
    let piano = playback_events(bodies[1], false);
    assert_eq!((0, vec![0xB1, 0x00, 0x02]), (piano[0].delta, piano[0].bytes.clone()));
    assert_eq!((0, vec![0xC1, 0x03]), (piano[1].delta, piano[1].bytes.clone()));
    assert_eq!((0, vec![0x91, 60, 127]), (piano[2].delta, piano[2].bytes.clone()));
}

#[test]
fn octave_errors_point_at_the_word() {
    enable_logging();
    let err = compile("c4 c9>>\n").unwrap_err();
    let fault = err.compile_error().expect("compile error details");
    assert_eq!(CompileErrorKind::OctaveRange, fault.kind());
    assert_eq!(1, fault.line());
    assert_eq!(2, fault.column());
    assert_eq!("c9>>", fault.word());
}

#[test]
fn pitch_overflow_is_rejected() {
    enable_logging();
    let err = compile("b10#\n").unwrap_err();
    let fault = err.compile_error().expect("compile error details");
    assert_eq!(CompileErrorKind::NoteRange, fault.kind());
}

#[test]
fn bar_change_rescales_the_line() {
    enable_logging();
    // 3/4 bars are 288 ticks; three quarters fill one exactly
    let bytes = compile("bar=3/4\nc5/4 c5/4 c5/4 |\nc5/4\n").unwrap();
    let bodies = track_bodies(&bytes);
    let events = playback_events(bodies[0], true);
    // the fourth note starts right at the next bar, tick 288
    let fourth_on_time: u32 = events.iter().take(7).map(|e| e.delta).sum();
    assert_eq!(288, fourth_on_time);
    assert_eq!(&[0x90, 60, 127], events[6].bytes.as_slice());
}

#[test]
fn produced_files_are_structurally_sound() {
    enable_logging();
    let sources = [
        "H: song\n",
        "c5/4 d e f |\n",
        "C: triad 0 2 4\nA: up 0 1 2 ( 0 1 ) |\nCtriad~up Cmaj\n",
        "M: riff { c4 d4\ne4 }\nriff riff *2\n",
        "TICK: x x x x |\nc5/8 d e f g a b c6\n",
        "I: lead chn=2\nlead c5/4 @vol=90 c5/4 bpm=200 c5/4\n",
        "[\nc5/1\nTICK: x x x x\n]\nCmaj // chord after a block\n",
        "a4: 0 2 4 /* and */ 5\n",
    ];
    for source in &sources {
        let bytes = compile(source).unwrap_or_else(|e| panic!("{}: {}", source, e));
        // MThd with length six
        assert_eq!(b"MThd", &bytes[0..4]);
        assert_eq!(&[0x00, 0x00, 0x00, 0x06], &bytes[4..8]);
        let bodies = track_bodies(&bytes);
        assert_eq!(usize::from(declared_tracks(&bytes)), bodies.len());
        // format 0 exactly when there is one track
        let expected_format = if bodies.len() == 1 { 0 } else { 1 };
        assert_eq!(expected_format, declared_format(&bytes));
        for body in &bodies {
            // every track ends with end-of-track
            assert_eq!(&[0x00, 0xFF, 0x2F, 0x00], &body[body.len() - 4..]);
            // the event walk consumes the body exactly
            let _ = delta_sum(body);
            // every note-on is matched by a later note-off on the same pitch
            let events = events_of(body);
            for (ix, event) in events.iter().enumerate() {
                if event.bytes[0] & 0xF0 == 0x90 && event.bytes[2] > 0 {
                    let pitch = event.bytes[1];
                    let channel = event.bytes[0] & 0x0F;
                    assert!(
                        events[ix + 1..].iter().any(|later| {
                            later.bytes[0] == (0x80 | channel) && later.bytes[1] == pitch
                        }),
                        "unmatched note-on in {:?}",
                        source
                    );
                }
            }
        }
    }
}

#[test]
fn compilations_are_reproducible() {
    enable_logging();
    let source = "C: triad 0 2 4\nA: up 0 1 2\nc5/4 Ctriad~up\nTICK: x x\n";
    let first = compile(source).unwrap();
    let second = compile(source).unwrap();
    assert_eq!(first, second);
}
